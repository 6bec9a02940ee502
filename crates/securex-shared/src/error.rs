use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
