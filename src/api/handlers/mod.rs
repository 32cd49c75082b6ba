pub mod attendance;
pub mod health;
pub mod identity;

use actix_web::HttpRequest;
use tracing::{error, warn};

use crate::utils::error::AttendanceError;

/// Audit trail for every rejected request: origin, endpoint and error code.
/// Request bodies are never logged.
pub(crate) fn log_rejection(req: &HttpRequest, err: &AttendanceError) {
    let info = req.connection_info();
    let peer = info.realip_remote_addr().unwrap_or("unknown");

    if err.is_client_error() {
        warn!(
            peer = %peer,
            method = %req.method(),
            path = %req.path(),
            code = err.code(),
            "Request rejected"
        );
    } else {
        error!(
            peer = %peer,
            method = %req.method(),
            path = %req.path(),
            code = err.code(),
            "Request failed: {}",
            err
        );
    }
}
