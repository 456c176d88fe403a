/// Core errors: identifier parsing, amounts, and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}
