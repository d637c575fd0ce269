//! Stagecraft: a parallel hierarchical statechart engine
//!
//! Stagecraft drives game-object behavior (animation layers, attack combos,
//! AI modes) from declarative statecharts. A configuration tree is compiled
//! once into an immutable machine; each game object runs its own service
//! against that machine and its own host context.
//!
//! # Core Concepts
//!
//! - **Regions**: a parallel root runs one independent state tree per child
//! - **Guards**: named predicates over the host context, first match wins
//! - **Actions**: named callbacks run on entry, exit, transition and timer
//! - **Delayed transitions**: armed on entry, cancelled on exit, fired as
//!   host-supplied time passes
//! - **Raised events**: actions queue events that run after the current step
//!
//! # Example
//!
//! ```rust
//! use stagecraft::builder::{compile, CandidateConfig, StateConfig};
//! use stagecraft::core::Implementations;
//! use stagecraft::service::Service;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Body {
//!     moving: bool,
//! }
//!
//! let config = StateConfig::new("character").region(
//!     StateConfig::new("lower-body")
//!         .initial("idle")
//!         .state(StateConfig::new("idle")
//!             .on("tick", CandidateConfig::to("run").guard("moving?")))
//!         .state(StateConfig::new("run")
//!             .on("tick", CandidateConfig::to("idle").guard("still?"))),
//! );
//! let implementations = Implementations::new()
//!     .guard("moving?", |b: &Body| b.moving)
//!     .guard("still?", |b: &Body| !b.moving);
//! let machine = Arc::new(compile(&config, &implementations).unwrap());
//!
//! let mut service = Service::new(Arc::clone(&machine), Body::default());
//! service.start().unwrap();
//!
//! service.context_mut().moving = true;
//! let configuration = service.send("tick").unwrap();
//! assert_eq!(configuration.leaf("lower-body"), Some("run"));
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod service;
pub mod watch;

// Re-export commonly used types
pub use builder::{compile, CandidateConfig, ConfigurationError, DelayedConfig, StateConfig};
pub use core::{ActionContext, ActionError, Implementations};
pub use machine::Machine;
pub use service::{ActiveConfiguration, Service, ServiceError};
