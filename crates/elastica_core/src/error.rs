use thiserror::Error;

/// Typed validation errors raised before any mechanics run.
///
/// Everything here is a configuration problem: the solver refuses to start
/// rather than propagate a malformed problem into the transfer math.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("invalid parameter '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    #[error("correction model '{model}' has no derived formula set")]
    UnsupportedModel { model: String },
}

impl ParamsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ParamsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
