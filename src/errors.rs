use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Tile code could not be parsed
    Parse { input: String, message: String },
    /// Action rejected before any state change (wrong turn, tile not held, ...)
    InvalidAction { message: String },
    /// Rehydrated state violates engine invariants
    InvalidState { message: String },
    /// Match configuration out of range
    InvalidConfig { message: String },
    /// Snapshot (de)serialization failure
    Serialization { message: String },
}

impl EngineError {
    pub(crate) fn action(message: impl Into<String>) -> Self {
        EngineError::InvalidAction { message: message.into() }
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        EngineError::InvalidState { message: message.into() }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        EngineError::InvalidConfig { message: message.into() }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse { input, message } => {
                write!(f, "Parse error on '{}': {}", input, message)
            }
            EngineError::InvalidAction { message } => {
                write!(f, "Invalid action: {}", message)
            }
            EngineError::InvalidState { message } => {
                write!(f, "Invalid state: {}", message)
            }
            EngineError::InvalidConfig { message } => {
                write!(f, "Invalid config: {}", message)
            }
            EngineError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization { message: err.to_string() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(feature = "python")]
impl From<EngineError> for pyo3::PyErr {
    fn from(err: EngineError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_input() {
        let err = EngineError::Parse { input: "0WAN".into(), message: "rank out of range".into() };
        assert_eq!(err.to_string(), "Parse error on '0WAN': rank out of range");
        assert_eq!(
            EngineError::action("not your turn").to_string(),
            "Invalid action: not your turn"
        );
    }

    #[test]
    fn serde_json_errors_convert() {
        let bad: Result<u32, _> = serde_json::from_str("not json");
        let err: EngineError = bad.unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization { .. }));
    }
}
