//! # API REST
//!
//! REST API implementation for the front desk.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Request and response bodies are the protobuf messages from `api-shared`, serialised as JSON.
//! The caller's role comes from the `x-frontdesk-role` header.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::auth::ROLE_HEADER;
use api_shared::convert::{inventory_list, to_wire, BookingTarget, DischargeTarget};
use api_shared::{classify, pb, AccessPolicy, Failure, HealthService};
use frontdesk_core::validation::required_id;
use frontdesk_core::{Action, AdmitError, FrontDeskError, FrontDeskService, TableStore};

/// Error response: status code plus the core's human-readable message.
pub type ApiError = (StatusCode, String);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub desk: FrontDeskService<TableStore>,
    pub access: Arc<AccessPolicy>,
}

impl AppState {
    fn authorize(&self, headers: &HeaderMap, action: Action) -> Result<(), ApiError> {
        let header = headers.get(ROLE_HEADER).and_then(|v| v.to_str().ok());
        self.access
            .authorize(header, action)
            .map(|_| ())
            .map_err(reject)
    }
}

fn status_for(failure: Failure) -> StatusCode {
    match failure {
        Failure::Invalid => StatusCode::BAD_REQUEST,
        Failure::Forbidden => StatusCode::FORBIDDEN,
        Failure::NotFound => StatusCode::NOT_FOUND,
        Failure::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: FrontDeskError) -> ApiError {
    let status = status_for(classify(&err));
    if status.is_server_error() {
        tracing::error!("front desk error: {err}");
    }
    (status, err.to_string())
}

fn admit_rejected(err: AdmitError) -> ApiError {
    let status = status_for(classify(&err.source));
    tracing::error!(step = %err.step, "admission failed: {err}");
    (status, err.to_string())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_patients,
        register_patient,
        list_appointments,
        book_appointment,
        next_queue_number,
        update_appointment_status,
        list_beds,
        add_bed,
        release_bed,
        list_admissions,
        admit_patient,
        discharge_patient,
        list_inventory,
        add_inventory_item,
        update_stock,
        low_stock,
        expiring_soon,
        dashboard,
    ),
    components(schemas(
        pb::HealthRes,
        pb::Patient,
        pb::RegisterPatientReq,
        pb::ListPatientsRes,
        pb::Appointment,
        pb::BookAppointmentReq,
        pb::BookAppointmentRes,
        pb::ListAppointmentsRes,
        pb::NextQueueNumberRes,
        pb::UpdateAppointmentStatusReq,
        pb::Bed,
        pb::AddBedReq,
        pb::ListBedsRes,
        pb::Admission,
        pb::AdmitPatientReq,
        pb::AdmitPatientRes,
        pb::DischargePatientReq,
        pb::DischargePatientRes,
        pb::ListAdmissionsRes,
        pb::InventoryItem,
        pb::AddInventoryItemReq,
        pb::UpdateStockReq,
        pb::ListInventoryRes,
        pb::DashboardRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients).post(register_patient))
        .route(
            "/appointments",
            get(list_appointments).post(book_appointment),
        )
        .route("/appointments/next-queue-number", get(next_queue_number))
        .route("/appointments/:id/status", put(update_appointment_status))
        .route("/beds", get(list_beds).post(add_bed))
        .route("/beds/:id/release", post(release_bed))
        .route("/admissions", get(list_admissions).post(admit_patient))
        .route("/admissions/discharge", post(discharge_patient))
        .route("/inventory", get(list_inventory).post(add_inventory_item))
        .route("/inventory/:id/stock", put(update_stock))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/expiring", get(expiring_soon))
        .route("/dashboard", get(dashboard))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Liveness check for monitoring and load balancers.
async fn health() -> Json<pb::HealthRes> {
    Json(HealthService::check_health())
}

// ============================================================================
// PATIENTS
// ============================================================================

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "All patients, newest first", body = pb::ListPatientsRes),
        (status = 403, description = "Role not allowed"),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListPatientsRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let patients = state.desk.patients().list().map_err(reject)?;
    Ok(Json(pb::ListPatientsRes {
        patients: to_wire(patients),
    }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = pb::RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = pb::Patient),
        (status = 400, description = "Invalid patient details"),
        (status = 403, description = "Role not allowed"),
        (status = 500, description = "Internal server error")
    )
)]
async fn register_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::RegisterPatientReq>,
) -> Result<(StatusCode, Json<pb::Patient>), ApiError> {
    state.authorize(&headers, Action::RegisterPatient)?;
    let new = req.to_new_patient().map_err(reject)?;
    let patient = state.desk.patients().register(new).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(patient.into())))
}

// ============================================================================
// OPD QUEUE
// ============================================================================

#[utoipa::path(
    get,
    path = "/appointments",
    params(
        ("status" = Option<String>, Query, description = "waiting, in-progress or completed")
    ),
    responses(
        (status = 200, description = "Appointments in queue order", body = pb::ListAppointmentsRes),
        (status = 400, description = "Unknown status filter"),
        (status = 500, description = "Internal server error")
    )
)]
async fn list_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<pb::ListAppointmentsReq>,
) -> Result<Json<pb::ListAppointmentsRes>, ApiError> {
    state.authorize(&headers, Action::ReadQueue)?;
    let status = filter.status_filter().map_err(reject)?;
    let mut appointments = state.desk.opd().list().map_err(reject)?;
    if let Some(status) = status {
        appointments.retain(|a| a.status == status);
    }
    Ok(Json(pb::ListAppointmentsRes {
        appointments: to_wire(appointments),
    }))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = pb::BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked", body = pb::BookAppointmentRes),
        (status = 400, description = "Invalid booking"),
        (status = 500, description = "Booking failed")
    )
)]
/// Books an OPD visit, registering the patient first when no `patient_id` is given.
async fn book_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::BookAppointmentReq>,
) -> Result<(StatusCode, Json<pb::BookAppointmentRes>), ApiError> {
    state.authorize(&headers, Action::BookAppointment)?;
    let (patient, appointment) = match req.target().map_err(reject)? {
        BookingTarget::Existing(id) => state.desk.book_for_patient(id),
        BookingTarget::WalkIn(new) => state.desk.book_opd_visit(new),
    }
    .map_err(reject)?;

    Ok((
        StatusCode::CREATED,
        Json(pb::BookAppointmentRes {
            patient: Some(patient.into()),
            appointment: Some(appointment.into()),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/appointments/next-queue-number",
    responses(
        (status = 200, description = "Number the next booking would receive", body = pb::NextQueueNumberRes)
    )
)]
async fn next_queue_number(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::NextQueueNumberRes>, ApiError> {
    state.authorize(&headers, Action::ReadQueue)?;
    let queue_number = state.desk.opd().next_queue_number().map_err(reject)?;
    Ok(Json(pb::NextQueueNumberRes { queue_number }))
}

#[utoipa::path(
    put,
    path = "/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = pb::UpdateAppointmentStatusReq,
    responses(
        (status = 200, description = "Appointment after the change", body = pb::Appointment),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "No such appointment"),
        (status = 500, description = "Backward transition or store failure")
    )
)]
/// Moves an appointment forward. The `id` in the body is ignored in favour of the path.
async fn update_appointment_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(mut req): Json<pb::UpdateAppointmentStatusReq>,
) -> Result<Json<pb::Appointment>, ApiError> {
    state.authorize(&headers, Action::UpdateAppointment)?;
    req.id = id;
    let (id, status) = req.parse().map_err(reject)?;
    let appointment = state.desk.opd().update_status(id, status).map_err(reject)?;
    Ok(Json(appointment.into()))
}

// ============================================================================
// BEDS
// ============================================================================

#[utoipa::path(
    get,
    path = "/beds",
    responses(
        (status = 200, description = "All beds by bed number", body = pb::ListBedsRes)
    )
)]
async fn list_beds(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListBedsRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let beds = state.desk.beds().list().map_err(reject)?;
    Ok(Json(pb::ListBedsRes {
        beds: to_wire(beds),
    }))
}

#[utoipa::path(
    post,
    path = "/beds",
    request_body = pb::AddBedReq,
    responses(
        (status = 201, description = "Bed added, available", body = pb::Bed),
        (status = 400, description = "Missing bed number or ward")
    )
)]
async fn add_bed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::AddBedReq>,
) -> Result<(StatusCode, Json<pb::Bed>), ApiError> {
    state.authorize(&headers, Action::ManageBeds)?;
    let bed = state
        .desk
        .beds()
        .add_bed(&req.bed_number, &req.ward)
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(bed.into())))
}

#[utoipa::path(
    post,
    path = "/beds/{id}/release",
    params(("id" = String, Path, description = "Bed id")),
    responses(
        (status = 200, description = "Bed is available", body = pb::Bed),
        (status = 404, description = "No such bed")
    )
)]
/// Frees a bed. Releasing an available bed is a no-op.
async fn release_bed(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<pb::Bed>, ApiError> {
    state.authorize(&headers, Action::ManageBeds)?;
    let bed_id = required_id("bed id", &id).map_err(reject)?;
    let bed = state.desk.release_bed(bed_id).map_err(reject)?;
    Ok(Json(bed.into()))
}

// ============================================================================
// ADMISSIONS
// ============================================================================

#[utoipa::path(
    get,
    path = "/admissions",
    responses(
        (status = 200, description = "Current stays, recent discharges and full history", body = pb::ListAdmissionsRes)
    )
)]
async fn list_admissions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListAdmissionsRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    Ok(Json(pb::ListAdmissionsRes {
        current: to_wire(state.desk.current_admissions().map_err(reject)?),
        recent_discharges: to_wire(state.desk.recent_discharges().map_err(reject)?),
        all: to_wire(state.desk.admissions().list().map_err(reject)?),
    }))
}

#[utoipa::path(
    post,
    path = "/admissions",
    request_body = pb::AdmitPatientReq,
    responses(
        (status = 201, description = "Patient admitted and bed occupied", body = pb::AdmitPatientRes),
        (status = 400, description = "Invalid admission details"),
        (status = 404, description = "Bed or patient not found; earlier steps are kept"),
        (status = 500, description = "A workflow step failed; earlier steps are kept")
    )
)]
/// Admits a patient: resolve or create the patient, record the admission, occupy the bed.
///
/// Steps are not rolled back. The error message names the failed step and any rows that were
/// kept.
async fn admit_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::AdmitPatientReq>,
) -> Result<(StatusCode, Json<pb::AdmitPatientRes>), ApiError> {
    state.authorize(&headers, Action::Admit)?;
    let request = req.to_request().map_err(reject)?;
    let outcome = state.desk.admit_patient(request).map_err(admit_rejected)?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/admissions/discharge",
    request_body = pb::DischargePatientReq,
    responses(
        (status = 200, description = "Admission discharged and bed released", body = pb::DischargePatientRes),
        (status = 404, description = "Admission or bed not found")
    )
)]
/// Discharges a stay and frees its bed. Both updates always run; repeating is harmless.
async fn discharge_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::DischargePatientReq>,
) -> Result<Json<pb::DischargePatientRes>, ApiError> {
    state.authorize(&headers, Action::Discharge)?;
    let outcome = match req.target().map_err(reject)? {
        DischargeTarget::Admission {
            admission_id,
            bed_id,
        } => state.desk.discharge_admission(admission_id, bed_id),
        DischargeTarget::Pair { patient_id, bed_id } => {
            state.desk.discharge_patient(patient_id, bed_id)
        }
    };
    let (admission, bed) = outcome.into_result().map_err(reject)?;
    Ok(Json(pb::DischargePatientRes {
        admission: admission.map(Into::into),
        bed: Some(bed.into()),
    }))
}

// ============================================================================
// INVENTORY
// ============================================================================

#[utoipa::path(
    get,
    path = "/inventory",
    responses(
        (status = 200, description = "All items by name, with total units", body = pb::ListInventoryRes)
    )
)]
async fn list_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListInventoryRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let items = state.desk.inventory().list().map_err(reject)?;
    Ok(Json(inventory_list(items)))
}

#[utoipa::path(
    post,
    path = "/inventory",
    request_body = pb::AddInventoryItemReq,
    responses(
        (status = 201, description = "Item added", body = pb::InventoryItem),
        (status = 400, description = "Invalid item details")
    )
)]
async fn add_inventory_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<pb::AddInventoryItemReq>,
) -> Result<(StatusCode, Json<pb::InventoryItem>), ApiError> {
    state.authorize(&headers, Action::ManageInventory)?;
    let item = req.to_new_item().map_err(reject)?;
    let item = state.desk.inventory().add_item(item).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    put,
    path = "/inventory/{id}/stock",
    params(("id" = String, Path, description = "Item id")),
    request_body = pb::UpdateStockReq,
    responses(
        (status = 200, description = "Stock overwritten", body = pb::InventoryItem),
        (status = 400, description = "Negative stock"),
        (status = 404, description = "No such item")
    )
)]
/// Overwrites an item's stock. The `id` in the body is ignored in favour of the path.
async fn update_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
    Json(mut req): Json<pb::UpdateStockReq>,
) -> Result<Json<pb::InventoryItem>, ApiError> {
    state.authorize(&headers, Action::ManageInventory)?;
    req.id = id;
    let (id, stock) = req.parse().map_err(reject)?;
    let item = state
        .desk
        .inventory()
        .update_stock(id, stock)
        .map_err(reject)?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    get,
    path = "/inventory/low-stock",
    responses(
        (status = 200, description = "Items below the low-stock threshold", body = pb::ListInventoryRes)
    )
)]
async fn low_stock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListInventoryRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let items = state.desk.low_stock().map_err(reject)?;
    Ok(Json(inventory_list(items)))
}

#[utoipa::path(
    get,
    path = "/inventory/expiring",
    responses(
        (status = 200, description = "Items expiring within the configured window", body = pb::ListInventoryRes)
    )
)]
async fn expiring_soon(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::ListInventoryRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let items = state
        .desk
        .expiring_soon(Utc::now().date_naive())
        .map_err(reject)?;
    Ok(Json(inventory_list(items)))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Headline counts", body = pb::DashboardRes)
    )
)]
async fn dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<pb::DashboardRes>, ApiError> {
    state.authorize(&headers, Action::ReadRecords)?;
    let summary = state
        .desk
        .dashboard(Utc::now().date_naive())
        .map_err(reject)?;
    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use frontdesk_core::CoreConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let desk = FrontDeskService::new(
            Arc::new(TableStore::in_memory()),
            Arc::new(CoreConfig::default()),
        );
        router(AppState {
            desk,
            access: Arc::new(AccessPolicy::default()),
        })
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        role: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder.header(ROLE_HEADER, role);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_walk_ins_get_sequential_queue_numbers() {
        let app = app();
        for expected in 1..=3 {
            let (status, body) = call(
                &app,
                "POST",
                "/appointments",
                None,
                Some(json!({ "name": format!("Walk-in {expected}"), "age": 30 })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["appointment"]["queue_number"], expected);
            assert_eq!(body["appointment"]["status"], "waiting");
        }

        let (_, next) = call(&app, "GET", "/appointments/next-queue-number", None, None).await;
        assert_eq!(next["queue_number"], 4);
    }

    #[tokio::test]
    async fn test_completing_the_last_number_recycles_it() {
        let app = app();
        let mut last_id = String::new();
        for n in 1..=3 {
            let (_, body) = call(
                &app,
                "POST",
                "/appointments",
                None,
                Some(json!({ "name": format!("P{n}"), "age": 40 })),
            )
            .await;
            last_id = body["appointment"]["id"].as_str().unwrap().to_string();
        }

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/appointments/{last_id}/status"),
            None,
            Some(json!({ "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (_, body) = call(
            &app,
            "POST",
            "/appointments",
            None,
            Some(json!({ "name": "P4", "age": 40 })),
        )
        .await;
        assert_eq!(body["appointment"]["queue_number"], 3);

        let (status, _) = call(
            &app,
            "PUT",
            &format!("/appointments/{last_id}/status"),
            None,
            Some(json!({ "status": "waiting" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (_, waiting) = call(&app, "GET", "/appointments?status=waiting", None, None).await;
        assert_eq!(waiting["appointments"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_admission_and_discharge_round() {
        let app = app();
        let (status, bed) = call(
            &app,
            "POST",
            "/beds",
            Some("staff"),
            Some(json!({ "bed_number": "B-12", "ward": "Surgical" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let bed_id = bed["id"].as_str().unwrap().to_string();

        let (status, admitted) = call(
            &app,
            "POST",
            "/admissions",
            Some("staff"),
            Some(json!({
                "name": "Tomasz Nowak",
                "age": 66,
                "bed_id": bed_id,
                "opd_reference": "OPD-31"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(admitted["admission"]["status"], "admitted");
        assert_eq!(admitted["bed"]["status"], "occupied");
        let patient_id = admitted["patient"]["id"].as_str().unwrap().to_string();
        assert_eq!(admitted["bed"]["patient_id"], patient_id);

        let discharge = json!({ "patient_id": patient_id, "bed_id": bed_id });
        for _ in 0..2 {
            let (status, body) = call(
                &app,
                "POST",
                "/admissions/discharge",
                Some("staff"),
                Some(discharge.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["admission"]["status"], "discharged");
            assert_eq!(body["bed"]["status"], "available");
            assert_eq!(body["bed"]["patient_id"], "");
        }

        let (_, admissions) = call(&app, "GET", "/admissions", None, None).await;
        assert_eq!(admissions["current"].as_array().unwrap().len(), 0);
        assert_eq!(
            admissions["recent_discharges"].as_array().unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_admission_into_missing_bed_is_reported() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/admissions",
            None,
            Some(json!({
                "name": "Tomasz Nowak",
                "age": 66,
                "bed_id": frontdesk_core::RecordId::new().to_string()
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let message = body.as_str().unwrap();
        assert!(message.starts_with("failed to update bed status"));

        let (_, admissions) = call(&app, "GET", "/admissions", None, None).await;
        assert_eq!(admissions["all"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patient_role_sees_queue_but_not_records() {
        let app = app();
        let (status, _) = call(
            &app,
            "POST",
            "/appointments",
            Some("patient"),
            Some(json!({ "name": "Walk In", "age": 19 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, queue) = call(&app, "GET", "/appointments", Some("patient"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue["appointments"].as_array().unwrap().len(), 1);

        let (status, next) = call(
            &app,
            "GET",
            "/appointments/next-queue-number",
            Some("patient"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(next["queue_number"], 2);

        for uri in ["/patients", "/admissions", "/inventory", "/dashboard"] {
            let (status, body) = call(&app, "GET", uri, Some("patient"), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body, "role 'patient' is not allowed to read records");
        }

        let (status, _) = call(&app, "GET", "/patients", Some("staff"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_roles_and_validation() {
        let app = app();
        let (status, _) = call(
            &app,
            "POST",
            "/beds",
            Some("patient"),
            Some(json!({ "bed_number": "B-1", "ward": "W" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "GET", "/beds", Some("patient"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "GET", "/beds", Some("visitor"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/patients",
            None,
            Some(json!({ "name": "Old", "age": 151 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stock_overwrite_and_alerts() {
        let app = app();
        let (status, item) = call(
            &app,
            "POST",
            "/inventory",
            None,
            Some(json!({
                "name": "Paracetamol",
                "stock": 50,
                "expiry_date": "2099-01-01",
                "unit": "tablets"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = item["id"].as_str().unwrap().to_string();

        for stock in [7, 4] {
            let (status, body) = call(
                &app,
                "PUT",
                &format!("/inventory/{id}/stock"),
                None,
                Some(json!({ "stock": stock })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["stock"], stock);
        }

        let (_, low) = call(&app, "GET", "/inventory/low-stock", None, None).await;
        assert_eq!(low["items"].as_array().unwrap().len(), 1);
        assert_eq!(low["total_units"], 4);

        let (_, expiring) = call(&app, "GET", "/inventory/expiring", None, None).await;
        assert!(expiring["items"].as_array().unwrap().is_empty());

        let (_, dashboard) = call(&app, "GET", "/dashboard", None, None).await;
        assert_eq!(dashboard["low_stock_items"], 1);
    }
}
