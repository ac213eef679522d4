use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Body sent for every client error.  Validation failures and unknown organizations are
/// deliberately indistinguishable to the caller.
pub const CLIENT_ERROR_MESSAGE: &str = "not found";
pub const SERVER_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(&'static str),
    #[error("organization {0} not found")]
    OrganizationNotFound(i64),
    #[error("no free pin found after {attempts} attempts")]
    PinSpaceExhausted { attempts: usize },
    #[error("store timed out after {0:?}")]
    Timeout(Duration),
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::OrganizationNotFound(_) => StatusCode::BAD_REQUEST,
            Self::PinSpaceExhausted { .. } | Self::Timeout(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(error=%self, "rejecting pin request");
            (status, CLIENT_ERROR_MESSAGE).into_response()
        } else {
            error!(error=%self, "failed to issue pin");
            (status, SERVER_ERROR_MESSAGE).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_share_one_status() {
        assert_eq!(
            AppError::Validation("missing organizationId").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::OrganizationNotFound(42).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_errors_are_500() {
        assert_eq!(
            AppError::PinSpaceExhausted { attempts: 3 }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Timeout(Duration::from_secs(1)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Store(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
