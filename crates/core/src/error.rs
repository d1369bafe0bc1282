use crate::validation::engine::EngineFault;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid rule for field {field}: {reason}")]
    InvalidRule { field: String, reason: String },

    #[error("Rule engine fault: {0}")]
    EngineFault(#[from] EngineFault),

    #[error("Configuration error: {0}")]
    Config(String),
}
