use actix_web::{
    web::{self, Data, Json, Query},
    HttpRequest, HttpResponse, Scope,
};
use tracing::info;

use super::log_rejection;
use crate::{
    api::types::{CheckInOutRequest, CheckInOutResponse, ReportParams, ReportResponse},
    core::{
        attendance::types::EventQuery,
        identity::types::Template,
        services::{attendance::AttendanceService, report::ReportService},
    },
    utils::error::AttendanceError,
};

pub fn scope() -> Scope {
    web::scope("/attendance")
        .service(
            web::resource("/check_in_out")
                .route(web::post().to(check_in_out))
        )
        .service(
            web::resource("/report")
                .route(web::get().to(report))
        )
}

async fn check_in_out(
    req: HttpRequest,
    service: Data<AttendanceService>,
    request: Json<CheckInOutRequest>,
) -> Result<HttpResponse, AttendanceError> {
    let CheckInOutRequest { template, source_device } = request.into_inner();
    info!(template_len = template.len(), "Received check-in/out scan");

    let outcome = service
        .check_in_out(Template::new(template), source_device.as_deref())
        .await
        .map_err(|e| {
            log_rejection(&req, &e);
            e
        })?;

    Ok(HttpResponse::Ok().json(CheckInOutResponse::from(&outcome)))
}

async fn report(
    req: HttpRequest,
    service: Data<ReportService>,
    params: Query<ReportParams>,
) -> Result<HttpResponse, AttendanceError> {
    let query = EventQuery::from(params.into_inner());

    let report = service.report(&query).await.map_err(|e| {
        log_rejection(&req, &e);
        e
    })?;

    Ok(HttpResponse::Ok().json(ReportResponse::from(report)))
}
