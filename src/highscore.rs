//! Highscore entries as returned and accepted by the Elympics API.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A single leaderboard entry.
///
/// Scores are arbitrary-precision integers. On the wire they are written as
/// decimal text; JSON numbers are accepted when reading.
///
/// # Example
///
/// ```rust
/// use elympics_api::Highscore;
///
/// let mut scores = vec![
///     Highscore::new("ann", 120),
///     Highscore::new("bob", 300),
/// ];
/// Highscore::sort_by_score(&mut scores);
///
/// assert_eq!(scores[0].name(), Some("bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highscore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, with = "score_text", skip_serializing_if = "Option::is_none")]
    score: Option<BigInt>,
}

impl Highscore {
    /// Creates an entry for `name` with `score`.
    #[must_use]
    pub fn new(name: impl Into<String>, score: impl Into<BigInt>) -> Self {
        Self {
            name: Some(name.into()),
            score: Some(score.into()),
        }
    }

    /// Returns the player name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the score.
    #[must_use]
    pub const fn score(&self) -> Option<&BigInt> {
        self.score.as_ref()
    }

    /// Orders entries from highest to lowest score.
    ///
    /// An entry without a score sorts after every entry with one; two
    /// entries without a score are equal.
    #[must_use]
    pub fn cmp_by_score_desc(&self, other: &Self) -> Ordering {
        match (&self.score, &other.score) {
            (Some(mine), Some(theirs)) => theirs.cmp(mine),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Sorts entries from highest to lowest score, keeping the relative
    /// order of equal entries.
    pub fn sort_by_score(entries: &mut [Self]) {
        entries.sort_by(Self::cmp_by_score_desc);
    }
}

/// Serde adapter writing scores as decimal text.
mod score_text {
    use std::fmt;
    use std::str::FromStr;

    use num_bigint::BigInt;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        score: &Option<BigInt>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match score {
            Some(score) => serializer.serialize_str(&score.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigInt>, D::Error> {
        deserializer.deserialize_option(OptionalScore)
    }

    struct OptionalScore;

    impl<'de> Visitor<'de> for OptionalScore {
        type Value = Option<BigInt>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer score as a number or decimal text")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(Score).map(Some)
        }
    }

    struct Score;

    impl<'de> Visitor<'de> for Score {
        type Value = BigInt;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer score as a number or decimal text")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(BigInt::from(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(BigInt::from(v))
        }

        #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            let whole = v.trunc();
            if whole == v && whole.abs() < 9.007_199_254_740_992e15 {
                Ok(BigInt::from(whole as i64))
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            BigInt::from_str(v.trim()).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl fmt::Display for Highscore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<anonymous>");
        match &self.score {
            Some(score) => write!(f, "{name}: {score}"),
            None => write!(f, "{name}: -"),
        }
    }
}
