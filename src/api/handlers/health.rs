use actix_web::{web::Data, HttpResponse};

use crate::core::services::health::HealthService;

/// Unauthenticated liveness probe.
pub async fn health(service: Data<HealthService>) -> HttpResponse {
    HttpResponse::Ok().json(service.check().await)
}
