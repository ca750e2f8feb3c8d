use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown match type: {0}")]
    UnknownMatchType(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),
}
