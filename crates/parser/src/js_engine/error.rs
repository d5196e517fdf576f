use thiserror::Error;

/// Errors raised by the QuickJS sandbox.
#[derive(Debug, Error)]
pub enum JsError {
    #[error("failed to create JS runtime: {0}")]
    RuntimeCreation(String),
    #[error("failed to create JS context: {0}")]
    ContextCreation(String),
    #[error("JS evaluation failed: {message}{}", stack.as_deref().map(|s| format!("\nstack: {s}")).unwrap_or_default())]
    Evaluation {
        message: String,
        stack: Option<String>,
    },
}

impl JsError {
    pub fn eval(message: impl Into<String>) -> Self {
        JsError::Evaluation {
            message: message.into(),
            stack: None,
        }
    }

    pub fn eval_with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        JsError::Evaluation {
            message: message.into(),
            stack: Some(stack.into()),
        }
    }
}

impl From<rquickjs::Error> for JsError {
    fn from(err: rquickjs::Error) -> Self {
        JsError::eval(err.to_string())
    }
}
