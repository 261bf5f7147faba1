//! The root of the Elympics API.

use num_bigint::BigInt;

use crate::clients::{HttpError, Requester};
use crate::config::{ApiKey, ElympicsConfig, ElympicsConfigBuilder};
use crate::error::ConfigError;
use crate::highscore::Highscore;

/// Entry point for the Elympics highscore service.
///
/// Holds the shared configuration (endpoint, API key, transport); every call
/// creates its own [`Requester`] borrowing it, so one `Elympics` may serve
/// any number of concurrent calls.
///
/// # Example
///
/// ```rust,ignore
/// use elympics_api::Elympics;
///
/// let elympics = Elympics::connect("my-api-key")?;
///
/// elympics.submit_highscore("ann", 1200).await?;
///
/// for entry in elympics.get_highscores().await? {
///     println!("{entry}");
/// }
/// ```
#[derive(Debug)]
pub struct Elympics {
    config: ElympicsConfig,
}

// Verify Elympics is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Elympics>();
};

impl Elympics {
    /// Connects to the default endpoint with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if `key` is empty, or
    /// [`ConfigError::HttpClient`] if the transport cannot be built.
    pub fn connect(key: impl Into<String>) -> Result<Self, ConfigError> {
        let config = ElympicsConfig::builder().key(ApiKey::new(key)?).build()?;
        Ok(Self::new(config))
    }

    /// Connects to the default endpoint without an API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the transport cannot be built.
    pub fn anonymous() -> Result<Self, ConfigError> {
        Ok(Self::new(ElympicsConfig::builder().build()?))
    }

    /// Creates a client from an existing configuration.
    #[must_use]
    pub const fn new(config: ElympicsConfig) -> Self {
        Self { config }
    }

    /// Returns a builder for a custom configuration.
    #[must_use]
    pub fn builder() -> ElympicsConfigBuilder {
        ElympicsConfig::builder()
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ElympicsConfig {
        &self.config
    }

    /// Starts a `POST` call against this client's endpoint.
    #[must_use]
    pub fn requester(&self) -> Requester<'_> {
        Requester::new(&self.config)
    }

    /// Starts a `GET` call against this client's endpoint.
    #[must_use]
    pub fn retrieve(&self) -> Requester<'_> {
        self.requester().method("GET")
    }

    /// Returns the leaderboard, following continuation pages.
    ///
    /// An unchanged (`304`) or empty (`204`) leaderboard yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn get_highscores(&self) -> Result<Vec<Highscore>, HttpError> {
        let scores = self
            .requester()
            .with_opt("key", self.key())
            .method("POST")
            .fetch_all("/getHighscores")
            .await?;
        Ok(scores.into_option().unwrap_or_default())
    }

    /// Submits `score` for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn submit_highscore(
        &self,
        name: impl Into<String>,
        score: impl Into<BigInt>,
    ) -> Result<(), HttpError> {
        let name: String = name.into();
        let score: BigInt = score.into();
        self.requester()
            .with_opt("key", self.key())
            .with("name", name)
            .with("score", score)
            .method("POST")
            .send("/submitHighscore")
            .await
    }

    /// Submits an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the call fails.
    pub async fn submit(&self, highscore: &Highscore) -> Result<(), HttpError> {
        self.requester()
            .with_opt("key", self.key())
            .with_opt("name", highscore.name())
            .with_opt("score", highscore.score())
            .method("POST")
            .send("/submitHighscore")
            .await
    }

    fn key(&self) -> Option<&str> {
        self.config.key().map(AsRef::as_ref)
    }
}
