use thiserror::Error;

/// Failures raised while learning or configuring an IADEM tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IademError {
    #[error("{component}::{operation}: {message}")]
    InternalConsistency {
        component: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid instance: {0}")]
    InvalidInstance(String),
}

impl IademError {
    pub fn internal(
        component: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        IademError::InternalConsistency {
            component,
            operation,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_message_names_component_and_operation() {
        let err = IademError::internal("LeafNode", "attempt_to_split", "negative mass");
        assert_eq!(
            err.to_string(),
            "LeafNode::attempt_to_split: negative mass"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = IademError::InvalidConfig("grace_period must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: grace_period must be positive"
        );
    }
}
