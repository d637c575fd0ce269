//! Time subscriptions owned through explicit tokens.
//!
//! Every subscription returns a token that the owner must release exactly
//! once on teardown. [`WatchSet`] collects the tokens of one component so
//! they can be released together.

mod clock;
mod lerp;

pub use clock::{Clock, WatchControl, WatchSet, WatchToken};
pub use lerp::{Lerp, LerpHandle};
