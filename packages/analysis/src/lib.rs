#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure analysis engine over observation sets.
//!
//! Every function here is referentially transparent given its inputs and an
//! explicit `now` instant (epoch milliseconds). Nothing is cached and no
//! observation is ever mutated; callers re-run whichever stage's inputs
//! changed:
//!
//! corpus → [`filter::apply`] → [`viewport::visible`] → [`stats::aggregate`]
//!
//! with [`pattern::city_wide`] / [`pattern::local`] run on demand against the
//! filtered set, and [`cluster::size_tier`] called once per rendered cluster.

pub mod clock;
pub mod cluster;
pub mod config;
pub mod filter;
pub mod pattern;
pub mod stats;
pub mod viewport;

use thiserror::Error;

/// Errors that can occur while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML was malformed or had the wrong shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but violate a policy constraint.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}
