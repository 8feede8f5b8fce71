use loadsim_core::ConfigError;
use thiserror::Error;
use tokio::task::JoinError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Request {request_id} failed: {source}")]
    Execution {
        request_id: u64,
        #[source]
        source: BoxError,
    },

    #[error("Run cancelled after scheduling {scheduled} of {expected} requests.")]
    Cancelled { scheduled: u64, expected: u64 },

    #[error("Load task panicked: {0}")]
    TaskPanicked(#[from] JoinError),
}

/// The first execution failure observed by any worker.
#[derive(Debug)]
pub(crate) struct FirstError {
    pub request_id: u64,
    pub source: BoxError,
}

impl From<FirstError> for RunError {
    fn from(err: FirstError) -> Self {
        Self::Execution {
            request_id: err.request_id,
            source: err.source,
        }
    }
}
