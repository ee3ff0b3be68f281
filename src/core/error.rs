use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReflexError {
    #[error("rule '{rule}' failed: {message}")]
    RuleEvaluation { rule: String, message: String },

    #[error("bridge method not registered: {0}")]
    BridgeMethodMissing(String),

    #[error("bridge method '{method}' failed: {message}")]
    BridgeInvocation { method: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("effect failed: {0}")]
    EffectFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ReflexError>;
