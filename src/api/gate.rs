// src/api/gate.rs
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
    ResponseError,
};
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::utils::{error::AttendanceError, metrics::Metrics};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Compares presented API keys with the configured secret.
///
/// Both sides are hashed first so the comparison runs over fixed-length
/// digests and leaks neither content nor length of the secret.
pub struct ApiKeyComparator {
    digest: [u8; 32],
}

impl ApiKeyComparator {
    pub fn new(secret: &str) -> Self {
        Self { digest: Self::hash(secret) }
    }

    fn hash(value: &str) -> [u8; 32] {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha3_256::digest(value.as_bytes()));
        digest
    }

    pub fn verify(&self, presented: &str) -> bool {
        bool::from(Self::hash(presented)[..].ct_eq(&self.digest[..]))
    }

    /// Short, non-reversible tag of a presented key for audit logs.
    pub fn fingerprint(presented: &str) -> String {
        hex::encode(&Self::hash(presented)[..4])
    }
}

/// Answers 401 to requests without a valid `x-api-key` before they reach a
/// handler. The rejection is a regular response so outer middleware still
/// sees it.
pub async fn require_api_key<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let comparator = req
        .app_data::<Data<ApiKeyComparator>>()
        .ok_or_else(|| AttendanceError::Internal("access gate is not configured".into()))?;

    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let authorized = presented.map_or(false, |key| comparator.verify(key));
    if !authorized {
        let peer = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        let fingerprint = presented.map(ApiKeyComparator::fingerprint);
        warn!(
            peer = %peer,
            method = %req.method(),
            path = %req.path(),
            key = fingerprint.as_deref().unwrap_or("none"),
            "Rejected request with missing or invalid API key"
        );
        if let Some(metrics) = req.app_data::<Data<Metrics>>() {
            metrics.record_auth_rejection();
        }
        let response = AttendanceError::Unauthorized.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
