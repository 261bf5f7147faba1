//! # Elympics API Rust Client
//!
//! A Rust client for the Elympics highscore service: submit scores and read
//! leaderboards over HTTP, with responses decoded into typed records.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ElympicsConfig`] and [`ElympicsConfigBuilder`]
//! - Validated newtypes for the API key and endpoint
//! - The [`Elympics`] facade for submitting and listing highscores
//! - A general request engine, [`Requester`], handling custom verbs, gzip,
//!   `Link` pagination and rate-limit retries
//! - A pluggable transport via [`clients::Connector`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use elympics_api::{Elympics, Highscore};
//!
//! let elympics = Elympics::connect("my-api-key")?;
//!
//! elympics.submit_highscore("ann", 1200).await?;
//!
//! let mut scores = elympics.get_highscores().await?;
//! Highscore::sort_by_score(&mut scores);
//! ```
//!
//! ## Custom Configuration
//!
//! ```rust
//! use std::time::Duration;
//! use elympics_api::{ApiKey, Elympics, Endpoint, RateLimitPolicy};
//!
//! let config = Elympics::builder()
//!     .endpoint(Endpoint::new("http://localhost:8080/elympics").unwrap())
//!     .key(ApiKey::new("my-api-key").unwrap())
//!     .timeouts(Duration::from_secs(3), Duration::from_secs(5))
//!     .rate_limit_policy(RateLimitPolicy::default().max_retries(10))
//!     .build()
//!     .unwrap();
//!
//! let elympics = Elympics::new(config);
//! ```
//!
//! ## Lower-level Calls
//!
//! ```rust,ignore
//! use elympics_api::{Elympics, Fetched, Highscore};
//!
//! let elympics = Elympics::connect("my-api-key")?;
//!
//! let page: Fetched<Vec<Highscore>> = elympics
//!     .retrieve()
//!     .with("limit", 10)
//!     .header("If-None-Match", etag)
//!     .fetch_all("/getHighscores")
//!     .await?;
//!
//! if page.is_not_modified() {
//!     // keep the cached leaderboard
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: All types are `Send + Sync`
//! - **Async-first**: Designed for use with Tokio async runtime
//! - **One call, one future**: A call and its retries and pages run inside
//!   the caller's future; nothing is spawned

pub mod clients;
pub mod config;
pub mod elympics;
pub mod error;
pub mod highscore;

// Re-export public types at crate root for convenience
pub use config::{ApiKey, ElympicsConfig, ElympicsConfigBuilder, Endpoint, RateLimitPolicy};
pub use elympics::Elympics;
pub use error::ConfigError;
pub use highscore::Highscore;

// Re-export HTTP client types
pub use clients::{
    AbsentResourceError, ApiError, DecodeError, Fetched, HttpError, HttpResponse,
    MaxHttpRetriesExceededError, PaginationInfo, Requester, UnknownFields,
};

// Scores are exchanged as arbitrary-precision integers
pub use num_bigint::BigInt;
