use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Which request of the dispatch pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    FetchLog,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => f.write_str("POST /api/events"),
            Stage::FetchLog => f.write_str("GET /api/eventLogs"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Network error during {stage}: {message}")]
    Transport { stage: Stage, message: String },

    #[error("Request rejected during {stage} (status {status}): {message}")]
    Rejected {
        stage: Stage,
        status: u16,
        message: String,
    },

    #[error("Storage error during {stage} (status {status}): {message}")]
    Storage {
        stage: Stage,
        status: u16,
        message: String,
    },
}

impl DispatchError {
    pub(crate) fn transport(stage: Stage, err: reqwest::Error) -> Self {
        DispatchError::Transport {
            stage,
            message: err.to_string(),
        }
    }

    /// Non-2xx response. Server errors mean the store could not read or write the log.
    pub(crate) fn from_status(stage: Stage, status: u16, message: String) -> Self {
        if status >= 500 {
            DispatchError::Storage {
                stage,
                status,
                message,
            }
        } else {
            DispatchError::Rejected {
                stage,
                status,
                message,
            }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            DispatchError::Transport { stage, .. }
            | DispatchError::Rejected { stage, .. }
            | DispatchError::Storage { stage, .. } => *stage,
        }
    }
}
