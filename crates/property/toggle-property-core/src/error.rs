
use thiserror::Error;
use toggle_api_core::json::JsonError;
use toggle_api_core::{MethodIdError, ValueKind};

/// Failure raised by a bound call while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvokeError {
    message: String,
}

impl InvokeError {
    pub fn new(message: impl Into<String>) -> Self {
        InvokeError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error(transparent)]
    MalformedIdentifier(#[from] MethodIdError),
    #[error("type '{type_name}' is not registered")]
    UnresolvableType { type_name: String },
    #[error("'{type_name}' has no method '{method_name}' taking '{argument_type}'")]
    UnresolvableMethod {
        type_name: String,
        argument_type: String,
        method_name: String,
    },
    #[error("argument type '{type_name}' has no parameter list kind")]
    ParameterKindMismatch { type_name: String },
    #[error("malformed parameters: {0}")]
    MalformedParameters(#[from] JsonError),
    #[error("index {index} out of range for {count} parameters")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("parameter {index} would hold a NaN or infinite float")]
    NonFinite { index: usize },
    #[error("expected a {expected} value, got {actual}")]
    KindMismatch {
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("target is a '{actual}', binding expects '{expected}'")]
    TargetMismatch { expected: String, actual: String },
    #[error("invoking {method_id} failed: {source}")]
    InvocationFailure {
        method_id: String,
        #[source]
        source: InvokeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invoke_error_is_the_source_of_an_invocation_failure() {
        let failure = PropertyError::InvocationFailure {
            method_id: "Text;int;set_font_size".into(),
            source: InvokeError::new("font size must be positive"),
        };
        assert_eq!(
            failure.to_string(),
            "invoking Text;int;set_font_size failed: font size must be positive"
        );
        let source = failure.source().unwrap();
        assert_eq!(source.to_string(), "font size must be positive");
        assert!(source.downcast_ref::<InvokeError>().is_some());
    }
}
