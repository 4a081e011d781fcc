use thiserror;

#[derive(Clone, Debug, thiserror::Error)]
pub enum DomainError {
    #[error("payload conversion failed: {0}")]
    ConversionFailed(String),
}
