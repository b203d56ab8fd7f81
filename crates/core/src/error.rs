use thiserror::Error;

/// Failure raised by a checker while evaluating an item.
#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("Lookup failed for {item_id}: {reason}")]
    Lookup { item_id: String, reason: String },

    #[error("Platform error: {0}")]
    Platform(String),
}

/// Failure raised by the platform side while applying a moderation action.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Platform rejected {action} on {item_id}: {reason}")]
    Rejected {
        action: &'static str,
        item_id: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}
