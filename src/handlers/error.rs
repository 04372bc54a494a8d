use serde_json::{Map, Value};

/// Valid alternatives attached to a failure so the caller (human or agent)
/// can retry with a correct value.
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub key: &'static str,
    pub values: Vec<String>,
}

/// Expected failures of the command core. None of these escape as panics;
/// they are folded into a `{success: false}` envelope.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    #[error("{}", .messages.join("; "))]
    Validation {
        messages: Vec<String>,
        hints: Vec<Hint>,
    },
    #[error("{kind} '{id}' not found")]
    NotFound {
        kind: &'static str,
        id: String,
        hints: Vec<Hint>,
    },
    #[error("unsupported operation '{0}'")]
    UnsupportedOperation(String),
    #[error("malformed request: {0}")]
    Structural(String),
}

impl HandlerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HandlerError::Validation {
            messages: vec![message.into()],
            hints: Vec::new(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        HandlerError::NotFound {
            kind,
            id: id.into(),
            hints: Vec::new(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        HandlerError::Structural(message.into())
    }

    pub fn with_hint(mut self, key: &'static str, values: Vec<String>) -> Self {
        match &mut self {
            HandlerError::Validation { hints, .. } | HandlerError::NotFound { hints, .. } => {
                if !hints.iter().any(|hint| hint.key == key) {
                    hints.push(Hint { key, values });
                }
            }
            HandlerError::UnsupportedOperation(_) | HandlerError::Structural(_) => {}
        }
        self
    }

    pub fn hints(&self) -> &[Hint] {
        match self {
            HandlerError::Validation { hints, .. } | HandlerError::NotFound { hints, .. } => hints,
            HandlerError::UnsupportedOperation(_) | HandlerError::Structural(_) => &[],
        }
    }

    pub(crate) fn hint_fields(&self) -> Map<String, Value> {
        self.hints()
            .iter()
            .map(|hint| (hint.key.to_string(), Value::from(hint.values.clone())))
            .collect()
    }
}
