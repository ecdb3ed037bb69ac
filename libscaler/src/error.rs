use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("cache runtime {0} not found")]
    NotFound(String),
    #[error("status write conflicts with a newer revision")]
    Conflict,
    #[error("status write retry budget exhausted")]
    RetriesExhausted,
    #[error("worker provisioning failed: {0}")]
    Provision(String),
    #[error("workers not ready: {0}")]
    NotReady(String),
    #[error("worker destruction failed: {0}")]
    Destroy(String),
    #[error(transparent)]
    Xline(#[from] Box<etcd_client::Error>),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<etcd_client::Error> for ScaleError {
    fn from(e: etcd_client::Error) -> Self {
        ScaleError::Xline(Box::new(e))
    }
}
