//! Data-only machine configuration.
//!
//! A [`StateConfig`] tree describes states, regions, transitions and timers.
//! Guards and actions are referenced by name and resolved against an
//! [`Implementations`](crate::core::Implementations) registry at compile
//! time, so the same tree can be written in Rust or loaded from JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One state of the machine and, recursively, its children.
///
/// - `states` makes it a compound state (exactly one child active, `initial`
///   names the default child)
/// - `regions` makes it a parallel state (every child active)
/// - neither makes it an atomic state
///
/// # Example
///
/// ```rust
/// use stagecraft::builder::{CandidateConfig, DelayedConfig, StateConfig};
/// use std::time::Duration;
///
/// let upper = StateConfig::new("upper-body")
///     .initial("attack-idle")
///     .state(StateConfig::new("attack-idle")
///         .on("tick", CandidateConfig::to("attack-start").guard("attacking?")))
///     .state(StateConfig::new("attack-start")
///         .entry("play-swing")
///         .after(DelayedConfig::new(Duration::from_millis(450), "attack-end").action("hit")))
///     .state(StateConfig::new("attack-end")
///         .on("tick", CandidateConfig::to("attack-idle").guard("animation-complete?")));
///
/// assert!(upper.is_compound());
/// assert_eq!(upper.states.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    /// Identifier, unique among siblings
    pub id: String,
    /// Default child of a compound state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    /// Children of a compound state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateConfig>,
    /// Children of a parallel state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<StateConfig>,
    /// Transition candidates keyed by event name, in evaluation order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub on: BTreeMap<String, Vec<CandidateConfig>>,
    /// Actions run when the state is entered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<String>,
    /// Actions run when the state is exited
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exit: Vec<String>,
    /// Delayed transitions armed when the state is entered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<DelayedConfig>,
}

impl StateConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration tree from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn initial(mut self, id: impl Into<String>) -> Self {
        self.initial = Some(id.into());
        self
    }

    /// Add a child to a compound state.
    pub fn state(mut self, child: StateConfig) -> Self {
        self.states.push(child);
        self
    }

    /// Add a region to a parallel state.
    pub fn region(mut self, child: StateConfig) -> Self {
        self.regions.push(child);
        self
    }

    /// Append a candidate to the rule for `event`. Candidates are evaluated
    /// in the order they were added.
    pub fn on(mut self, event: impl Into<String>, candidate: CandidateConfig) -> Self {
        self.on.entry(event.into()).or_default().push(candidate);
        self
    }

    pub fn entry(mut self, action: impl Into<String>) -> Self {
        self.entry.push(action.into());
        self
    }

    pub fn exit(mut self, action: impl Into<String>) -> Self {
        self.exit.push(action.into());
        self
    }

    pub fn after(mut self, delayed: DelayedConfig) -> Self {
        self.after.push(delayed);
        self
    }

    pub fn is_parallel(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn is_compound(&self) -> bool {
        self.regions.is_empty() && !self.states.is_empty()
    }

    pub fn is_atomic(&self) -> bool {
        self.regions.is_empty() && self.states.is_empty()
    }
}

/// One candidate of a transition rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CandidateConfig {
    /// Target state. Without a target the candidate only runs its actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

impl CandidateConfig {
    /// Candidate moving to `target`. A plain id is looked up among the
    /// declaring state's children, then its siblings, then the siblings of
    /// each ancestor. `#root.region.state` names a state by its full path.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    /// Candidate that runs its actions without leaving the active state.
    pub fn targetless() -> Self {
        Self::default()
    }

    pub fn guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }
}

/// A transition taken automatically once its state has been active for
/// `delay` milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayedConfig {
    /// Delay in milliseconds
    pub delay: u64,
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

impl DelayedConfig {
    pub fn new(delay: Duration, target: impl Into<String>) -> Self {
        Self {
            delay: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            target: target.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_children() {
        assert!(StateConfig::new("idle").is_atomic());
        assert!(StateConfig::new("legs")
            .initial("idle")
            .state(StateConfig::new("idle"))
            .is_compound());
        assert!(StateConfig::new("body")
            .region(StateConfig::new("legs"))
            .is_parallel());
    }

    #[test]
    fn candidates_keep_declaration_order() {
        let idle = StateConfig::new("idle")
            .on("tick", CandidateConfig::to("jump").guard("airborne?"))
            .on("tick", CandidateConfig::to("run").guard("moving?"))
            .on("tick", CandidateConfig::targetless().action("breathe"));

        let tick = &idle.on["tick"];
        assert_eq!(tick.len(), 3);
        assert_eq!(tick[0].target.as_deref(), Some("jump"));
        assert_eq!(tick[1].target.as_deref(), Some("run"));
        assert_eq!(tick[2].target, None);
        assert_eq!(tick[2].actions, vec!["breathe".to_string()]);
    }

    #[test]
    fn parses_json_schema() {
        let json = r#"{
            "id": "upper-body",
            "initial": "attack-idle",
            "states": [
                {
                    "id": "attack-idle",
                    "on": { "tick": [{ "target": "attack-start", "guard": "attacking?" }] }
                },
                {
                    "id": "attack-start",
                    "entry": ["play-swing"],
                    "after": [{ "delay": 450, "target": "attack-end", "actions": ["hit"] }]
                },
                { "id": "attack-end" }
            ]
        }"#;

        let config = StateConfig::from_json(json).unwrap();

        assert_eq!(config.initial.as_deref(), Some("attack-idle"));
        assert_eq!(config.states[1].entry, vec!["play-swing".to_string()]);
        assert_eq!(config.states[1].after[0].delay(), Duration::from_millis(450));
        assert_eq!(
            config.states[0].on["tick"][0].guard.as_deref(),
            Some("attacking?")
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{ "id": "idle", "onn": {} }"#;
        assert!(StateConfig::from_json(json).is_err());
    }

    #[test]
    fn json_output_omits_empty_fields() {
        let config = StateConfig::new("idle").entry("play-idle");
        let json = config.to_json_pretty().unwrap();

        assert!(json.contains("\"entry\""));
        assert!(!json.contains("\"states\""));
        assert!(!json.contains("\"after\""));
        assert_eq!(StateConfig::from_json(&json).unwrap(), config);
    }
}
