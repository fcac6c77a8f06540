pub type RastermixResult<T> = Result<T, RastermixError>;

#[derive(thiserror::Error, Debug)]
pub enum RastermixError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("mapping error: {0}")]
    Mapping(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RastermixError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }
}
