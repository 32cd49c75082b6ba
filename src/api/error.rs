// src/api/error.rs
use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use super::types::ErrorBody;
use crate::utils::error::AttendanceError;

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AttendanceError::NoMatch | AttendanceError::IdentityNotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::DuplicateEnrollment(_) | AttendanceError::SequenceConflict(_) => {
                StatusCode::CONFLICT
            }
            AttendanceError::Unauthorized => StatusCode::UNAUTHORIZED,
            AttendanceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AttendanceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AttendanceError::Config(_) | AttendanceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // server-side details stay in the logs
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            match self {
                AttendanceError::StoreUnavailable(_) => "Storage is temporarily unavailable".to_string(),
                AttendanceError::Timeout => self.to_string(),
                _ => "Internal server error".to_string(),
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code().to_string(),
            message,
        })
    }
}
