//! Machine configuration and compilation.
//!
//! Configurations are plain data: a tree of [`StateConfig`] values built
//! fluently in Rust or parsed from JSON. [`compile`] validates the tree,
//! resolves guard and action names against an
//! [`Implementations`](crate::core::Implementations) registry and produces
//! an immutable [`Machine`](crate::machine::Machine).

pub mod compile;
pub mod config;
pub mod error;

pub use compile::compile;
pub use config::{CandidateConfig, DelayedConfig, StateConfig};
pub use error::{ConfigurationError, ConfigurationErrors};
