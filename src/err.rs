#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("usage error: {0}")]
    UsageError(String),

    #[error("setup failed: {0}")]
    SetupFailure(#[from] std::io::Error),

    #[error("transport failure: {0}")]
    TransportFatal(String),
}
