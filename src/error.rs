//! Error types for model construction and simulation.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while building a project model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A handle does not refer to an entity in the project arena.
    #[error("unknown {kind} handle: {index}")]
    UnknownEntity {
        /// Entity kind ("task", "worker", ...).
        kind: &'static str,
        /// Offending arena index.
        index: usize,
    },

    /// A task cannot depend on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(usize),

    /// Linking the components would create a cycle in the component tree.
    #[error("component {child} cannot become a child of {parent}: cycle in component tree")]
    ComponentCycle {
        /// Would-be parent.
        parent: usize,
        /// Would-be child.
        child: usize,
    },

    /// A component already has a different parent.
    #[error("component {child} already has parent {parent}")]
    ParentAlreadySet {
        /// Existing parent.
        parent: usize,
        /// Child component.
        child: usize,
    },
}

/// Errors raised by the simulation controller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The requested mode combination is known but not implemented.
    #[error("unsupported simulation mode: {0}")]
    UnsupportedMode(String),

    /// A mode or rule name could not be parsed.
    #[error("invalid {kind}: {value}")]
    InvalidMode {
        /// What was being parsed.
        kind: &'static str,
        /// Input string.
        value: String,
    },

    /// The model failed validation before the run started.
    #[error("invalid project model: {} issue(s), first: {}", .0.len(), first_message(.0))]
    InvalidModel(Vec<ValidationError>),

    /// Construction error surfaced during a run (filler task wiring).
    #[error(transparent)]
    Model(#[from] ModelError),
}

fn first_message(errors: &[ValidationError]) -> &str {
    errors.first().map(|e| e.message.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_display() {
        let err = ModelError::UnknownEntity {
            kind: "task",
            index: 7,
        };
        assert_eq!(err.to_string(), "unknown task handle: 7");
        assert_eq!(
            ModelError::SelfDependency(3).to_string(),
            "task 3 cannot depend on itself"
        );
    }

    #[test]
    fn test_simulation_error_from_model_error() {
        let err: SimulationError = ModelError::SelfDependency(1).into();
        assert!(matches!(err, SimulationError::Model(_)));
        assert_eq!(err.to_string(), "task 1 cannot depend on itself");
    }
}
