use actix_web::{
    web::{self, Data, Json},
    HttpRequest, HttpResponse, Scope,
};
use tracing::info;

use super::log_rejection;
use crate::{
    api::types::{EnrollRequest, EnrollResponse},
    core::{identity::types::Template, services::enrollment::EnrollmentService},
    utils::error::AttendanceError,
};

pub fn scope() -> Scope {
    web::scope("/identities")
        .service(
            web::resource("/enroll")
                .route(web::post().to(enroll_identity))
        )
}

async fn enroll_identity(
    req: HttpRequest,
    service: Data<EnrollmentService>,
    request: Json<EnrollRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let EnrollRequest { name, template } = request.into_inner();
    info!(template_len = template.len(), "Received enrollment request");

    let identity = service
        .enroll(&name, Template::new(template))
        .await
        .map_err(|e| {
            log_rejection(&req, &e);
            e
        })?;

    Ok(HttpResponse::Created().json(EnrollResponse::from(&identity)))
}
