// src/api/rest.rs
use std::time::Instant;
use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{self, HeaderName},
    middleware::{from_fn, Next},
    web::{self, Data},
    HttpRequest,
};

use super::{
    gate::{require_api_key, API_KEY_HEADER},
    handlers::{self, log_rejection},
};
use crate::{utils::{error::AttendanceError, metrics::Metrics}, AppState};

/// Upper bound for JSON request bodies.
pub const JSON_LIMIT: usize = 1024 * 1024;

/// Mounts `/health` and the gated `/api/v1` surface.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(Data::from(state.comparator.clone()))
        .app_data(Data::from(state.metrics.clone()))
        .app_data(Data::from(state.enrollment.clone()))
        .app_data(Data::from(state.attendance.clone()))
        .app_data(Data::from(state.reports.clone()))
        .app_data(Data::from(state.health.clone()))
        .route("/health", web::get().to(handlers::health::health))
        .service(
            web::scope("/api/v1")
                .wrap(from_fn(require_api_key))
                .service(handlers::identity::scope())
                .service(handlers::attendance::scope()),
        );
}

fn malformed(message: String, req: &HttpRequest) -> actix_web::Error {
    let err = AttendanceError::MalformedInput(message);
    log_rejection(req, &err);
    err.into()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req| malformed(err.to_string(), req))
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| malformed(err.to_string(), req))
}

/// Counts every request and its latency; non-2xx responses count as failed.
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let metrics = req.app_data::<Data<Metrics>>().cloned();
    let started = Instant::now();

    let result = next.call(req).await;

    if let Some(metrics) = metrics {
        let success = matches!(&result, Ok(res) if res.status().is_success());
        metrics.record_request(started.elapsed(), success);
    }
    result
}

/// `"*"` allows any origin; an empty list keeps the API same-origin only.
pub fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(3600);

    allowed_origins.iter().fold(cors, |cors, origin| {
        if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        }
    })
}
