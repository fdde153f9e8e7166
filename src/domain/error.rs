//! Domain error types.

/// Top-level error type for breakout.
///
/// A series that is merely too short is not an error: the detectors return an
/// empty event list for it.
#[derive(Debug, thiserror::Error)]
pub enum BreakoutError {
    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("event sink error: {reason}")]
    Sink { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol} at interval {interval}")]
    NoData { symbol: String, interval: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BreakoutError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        BreakoutError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BreakoutError> for std::process::ExitCode {
    fn from(err: &BreakoutError) -> Self {
        let code: u8 = match err {
            BreakoutError::Io(_) => 1,
            BreakoutError::ConfigParse { .. }
            | BreakoutError::ConfigMissing { .. }
            | BreakoutError::ConfigInvalid { .. } => 2,
            BreakoutError::Database { .. }
            | BreakoutError::DatabaseQuery { .. }
            | BreakoutError::Sink { .. } => 3,
            BreakoutError::InvalidBar { .. } | BreakoutError::InvalidParameter { .. } => 4,
            BreakoutError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_bar_message_names_index() {
        let err = BreakoutError::InvalidBar {
            index: 7,
            reason: "volume -1 is negative or not finite".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid bar at index 7: volume -1 is negative or not finite"
        );
    }

    #[test]
    fn invalid_parameter_helper() {
        let err = BreakoutError::invalid_parameter("window", "must be at least 1");
        assert!(matches!(err, BreakoutError::InvalidParameter { ref name, .. } if name == "window"));
        assert_eq!(err.to_string(), "invalid parameter window: must be at least 1");
    }

    #[test]
    fn config_missing_message() {
        let err = BreakoutError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [data] path");
    }
}
