use crate::api::{ApiError, ApiResponse};
use thiserror::Error;

// Failures raised by the wishlist and booking mutations
#[derive(Error, Debug)]
pub enum SyncError {
    /// The server answered `success: false`. Holds its message, or the
    /// per-operation fallback when it sent none.
    #[error("{0}")]
    Rejected(String),

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SyncError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Rejected(message) => message.clone(),
            SyncError::Transport { context, .. } => context.to_string(),
            SyncError::Encode(_) => "Invalid request".to_string(),
        }
    }
}

// Turns a raw client result into a successful envelope or a SyncError
pub(crate) fn expect_success(
    result: Result<ApiResponse, ApiError>,
    fallback: &'static str,
) -> Result<ApiResponse, SyncError> {
    match result {
        Ok(response) if response.success => Ok(response),
        Ok(response) => Err(SyncError::Rejected(response.error_or(fallback))),
        Err(source) => Err(SyncError::Transport {
            context: fallback,
            source,
        }),
    }
}
