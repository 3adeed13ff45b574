use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseProductIdError {
    #[error("product id must not be empty")]
    Empty,
    #[error("numeric product id {0} is out of range")]
    OutOfRange(String),
}
