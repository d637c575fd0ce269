//! Running machines.
//!
//! A [`Service`] binds a shared [`Machine`](crate::machine::Machine) to a
//! host context and drives it:
//! - `start` enters the initial configuration
//! - `send` processes an event and every event raised while handling it
//! - `advance_time` fires delayed transitions whose deadline has passed
//! - `stop` exits every active state and releases timers
//!
//! Time is supplied by the host; the engine never reads a wall clock to
//! decide when a timer is due.

mod configuration;
mod error;
mod runtime;
mod timer;

pub use configuration::{ActiveConfiguration, RegionPath};
pub use error::ServiceError;
pub use runtime::{Service, ServiceStatus, DEFAULT_RAISE_LIMIT};
pub use timer::{ArmedTimer, TimerScheduler};
