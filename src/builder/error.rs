//! Configuration errors reported by machine compilation.

use thiserror::Error;

/// A single problem found in a machine configuration.
///
/// States are identified by their dotted path from the root.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("State under '{parent}' has an empty identifier")]
    EmptyId { parent: String },

    #[error("State '{parent}' declares child '{id}' more than once")]
    DuplicateState { parent: String, id: String },

    #[error("State '{state}' declares both states and regions")]
    ConflictingChildren { state: String },

    #[error("Compound state '{state}' does not declare an initial child")]
    MissingInitial { state: String },

    #[error("State '{state}' declares initial '{initial}' which is not one of its children")]
    UnknownInitial { state: String, initial: String },

    #[error("State '{state}' declares initial '{initial}' but is not a compound state")]
    UnexpectedInitial { state: String, initial: String },

    #[error("Region '{region}' must be a compound state with its own initial child")]
    RegionWithoutInitial { region: String },

    #[error("Parallel state '{state}' is only supported at the root")]
    NestedParallel { state: String },

    #[error("Parallel root '{state}' cannot declare transitions or delayed transitions")]
    ParallelTransitions { state: String },

    #[error("State '{state}' targets unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("State '{state}' targets '{target}' in another region")]
    CrossRegionTarget { state: String, target: String },

    #[error("State '{state}' targets parallel state '{target}'")]
    ParallelTarget { state: String, target: String },

    #[error("State '{state}' declares a delayed transition to '{target}' with zero delay")]
    ZeroDelay { state: String, target: String },

    #[error("State '{state}' references unknown guard '{guard}'")]
    UnknownGuard { state: String, guard: String },

    #[error("State '{state}' references unknown action '{action}'")]
    UnknownAction { state: String, action: String },
}

/// Every problem found while compiling a configuration. Never empty.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid machine configuration ({} errors): {}", .0.len(), join(.0))]
pub struct ConfigurationErrors(Vec<ConfigurationError>);

fn join(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigurationErrors {
    pub(crate) fn new(errors: Vec<ConfigurationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ConfigurationError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ConfigurationError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_lists_every_error() {
        let errors = ConfigurationErrors::new(vec![
            ConfigurationError::MissingInitial {
                state: "character.lower-body".to_string(),
            },
            ConfigurationError::UnknownGuard {
                state: "character.lower-body.idle".to_string(),
                guard: "moving?".to_string(),
            },
        ]);

        let message = errors.to_string();
        assert!(message.starts_with("Invalid machine configuration (2 errors)"));
        assert!(message.contains("does not declare an initial child"));
        assert!(message.contains("unknown guard 'moving?'"));
        assert_eq!(errors.len(), 2);
    }
}
