use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid comparator '{0}'")]
    InvalidComparator(String),
    #[error("invalid SoftHard value '{0}'")]
    InvalidSoftHard(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
