//! # API REST
//!
//! REST API implementation for the clinica backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, error status codes)
//!
//! Handlers translate DTOs into core commands and call the use-case services; no business
//! rule lives here.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clinica_core::model::CardDetails;
use clinica_core::services::{
    ClinicServices, PrescriptionItem, ProcessPaymentCommand, RegisterDoctorCommand,
    RegisterMedicalRecordCommand, RegisterPatientCommand, ScheduleAppointmentCommand,
};
use clinica_core::validation::{
    classify_bmi, compute_and_validate_bmi, validate_height, validate_weight,
};
use clinica_core::{ClinicResult, CoreConfig, Id};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dto::*;
use error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub services: ClinicServices,
}

impl AppState {
    /// State backed by fresh in-memory adapters.
    pub fn in_memory(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        let services = ClinicServices::in_memory(cfg.clone())?;
        Ok(Self { cfg, services })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_patient,
        patient_medical_records,
        patient_appointments,
        create_doctor,
        list_doctors,
        schedule_appointment,
        list_appointments,
        cancel_appointment,
        register_medical_record,
        process_payment,
        get_payment,
        bmi,
    ),
    components(schemas(
        HealthRes,
        IdRes,
        ErrorRes,
        CreatePatientReq,
        AddressReq,
        PhoneKindDto,
        PhoneReq,
        CreateDoctorReq,
        DoctorRes,
        AppointmentKindDto,
        ScheduleAppointmentReq,
        AppointmentRes,
        AppointmentSummaryRes,
        PatientHistoryRes,
        PrescriptionItemReq,
        RegisterMedicalRecordReq,
        PrescriptionRes,
        ExamRes,
        MedicalRecordRes,
        ProcessPaymentReq,
        PaymentRes,
        PaymentDetailRes,
        BmiRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router, including Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", post(create_patient))
        .route("/patients/:id/medical-records", get(patient_medical_records))
        .route("/patients/:id/appointments", get(patient_appointments))
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route(
            "/appointments",
            get(list_appointments).post(schedule_appointment),
        )
        .route("/appointments/:id/cancel", post(cancel_appointment))
        .route("/medical-records", post(register_medical_record))
        .route("/payments", post(process_payment))
        .route("/payments/:id", get(get_payment))
        .route("/bmi", get(bmi))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Clinica REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient registered", body = IdRes),
        (status = 404, description = "Unknown health plan", body = ErrorRes),
        (status = 422, description = "Invalid patient data", body = ErrorRes)
    )
)]
/// Register a patient, optionally with a first weight/height reading, an address and phones.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> ApiResult<(StatusCode, Json<IdRes>)> {
    let cmd = RegisterPatientCommand {
        child_name: req.child_name,
        guardian_name: req.guardian_name,
        birth_date: req.birth_date,
        sex: req.sex,
        health_plan_id: req.health_plan_id,
        initial_measurement: req.weight.zip(req.height),
        address: req.address.map(Into::into),
        phones: req.phones.into_iter().map(Into::into).collect(),
    };

    let id = state.services.registration.register_patient(cmd)?;
    Ok((StatusCode::CREATED, Json(IdRes { id })))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/medical-records",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Medical records, oldest first", body = [MedicalRecordRes])
    )
)]
/// Medical record history of one patient.
#[axum::debug_handler]
async fn patient_medical_records(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<Vec<MedicalRecordRes>>> {
    let records = state.services.medical_records.history_for_patient(id)?;
    Ok(Json(records.iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/appointments",
    params(("id" = i64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Appointments of the patient, oldest first", body = PatientHistoryRes),
        (status = 404, description = "Unknown patient", body = ErrorRes)
    )
)]
/// Appointment history of one patient, with doctor, status and medical record of each visit.
#[axum::debug_handler]
async fn patient_appointments(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<PatientHistoryRes>> {
    let history = state.services.appointments.patient_history(id)?;
    Ok(Json(history.into()))
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = CreateDoctorReq,
    responses(
        (status = 201, description = "Doctor registered", body = IdRes),
        (status = 409, description = "CRM already registered", body = ErrorRes),
        (status = 422, description = "Invalid doctor data", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn create_doctor(
    State(state): State<AppState>,
    Json(req): Json<CreateDoctorReq>,
) -> ApiResult<(StatusCode, Json<IdRes>)> {
    let id = state
        .services
        .registration
        .register_doctor(RegisterDoctorCommand {
            name: req.name,
            specialty: req.specialty,
            crm: req.crm,
        })?;
    Ok((StatusCode::CREATED, Json(IdRes { id })))
}

#[utoipa::path(
    get,
    path = "/doctors",
    responses((status = 200, description = "Registered doctors", body = [DoctorRes]))
)]
#[axum::debug_handler]
async fn list_doctors(State(state): State<AppState>) -> ApiResult<Json<Vec<DoctorRes>>> {
    let doctors = state.services.registration.list_doctors()?;
    Ok(Json(doctors.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = ScheduleAppointmentReq,
    responses(
        (status = 201, description = "Appointment scheduled", body = IdRes),
        (status = 404, description = "Unknown patient or doctor", body = ErrorRes),
        (status = 409, description = "Doctor is busy at that time", body = ErrorRes),
        (status = 422, description = "Date is in the past", body = ErrorRes)
    )
)]
/// Schedule an appointment.
///
/// The doctor must have no other scheduled appointment within one slot of the requested time.
#[axum::debug_handler]
async fn schedule_appointment(
    State(state): State<AppState>,
    Json(req): Json<ScheduleAppointmentReq>,
) -> ApiResult<(StatusCode, Json<IdRes>)> {
    let id = state
        .services
        .appointments
        .schedule(ScheduleAppointmentCommand {
            patient_id: req.patient_id,
            doctor_id: req.doctor_id,
            scheduled_at: req.scheduled_at,
            new_patient: req.new_patient,
            kind: req.kind.into(),
        })?;
    Ok((StatusCode::CREATED, Json(IdRes { id })))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(DayQuery),
    responses((status = 200, description = "Appointments of the day", body = [AppointmentRes]))
)]
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
) -> ApiResult<Json<Vec<AppointmentRes>>> {
    let appointments = state.services.appointments.list_for_day(query.date)?;
    Ok(Json(appointments.iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment cancelled"),
        (status = 400, description = "Appointment already realized", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    state.services.appointments.cancel(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/medical-records",
    request_body = RegisterMedicalRecordReq,
    responses(
        (status = 201, description = "Medical record registered", body = IdRes),
        (status = 400, description = "Appointment is not scheduled", body = ErrorRes),
        (status = 404, description = "Unknown appointment, medication or exam", body = ErrorRes),
        (status = 409, description = "Appointment already has a record", body = ErrorRes),
        (status = 422, description = "Implausible weight, height or BMI", body = ErrorRes)
    )
)]
/// Register the medical record of a scheduled appointment.
///
/// On success the appointment becomes `REALIZED`.
#[axum::debug_handler]
async fn register_medical_record(
    State(state): State<AppState>,
    Json(req): Json<RegisterMedicalRecordReq>,
) -> ApiResult<(StatusCode, Json<IdRes>)> {
    let cmd = RegisterMedicalRecordCommand {
        appointment_id: req.appointment_id,
        weight: req.weight,
        height: req.height,
        symptoms: req.symptoms,
        clinical_notes: req.clinical_notes,
        prescriptions: req
            .prescriptions
            .into_iter()
            .map(|p| PrescriptionItem {
                medication_id: p.medication_id,
                dosage: p.dosage,
                administration: p.administration,
                duration: p.duration,
            })
            .collect(),
        exam_ids: req.exam_ids,
    };

    let id = state.services.medical_records.register(cmd)?;
    Ok((StatusCode::CREATED, Json(IdRes { id })))
}

#[utoipa::path(
    post,
    path = "/payments",
    request_body = ProcessPaymentReq,
    responses(
        (status = 200, description = "Payment processed; check `status` for the outcome", body = PaymentRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 422, description = "Invalid card data or amount", body = ErrorRes)
    )
)]
/// Charge a card for an online consultation.
///
/// A declined card is a `200` with status `FAILED`.
#[axum::debug_handler]
async fn process_payment(
    State(state): State<AppState>,
    Json(req): Json<ProcessPaymentReq>,
) -> ApiResult<Json<PaymentRes>> {
    let result = state.services.payments.process(ProcessPaymentCommand {
        appointment_id: req.appointment_id,
        amount: req.amount,
        card: CardDetails {
            number: req.card_number,
            holder_name: req.card_holder,
            expiry: req.expiry,
            cvv: req.cvv,
        },
    })?;
    Ok(Json(result.into()))
}

#[utoipa::path(
    get,
    path = "/payments/{id}",
    params(("id" = i64, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Stored payment", body = PaymentDetailRes),
        (status = 404, description = "Unknown payment", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<PaymentDetailRes>> {
    let payment = state.services.payments.find(id)?;
    Ok(Json((&payment).into()))
}

#[utoipa::path(
    get,
    path = "/bmi",
    params(BmiQuery),
    responses(
        (status = 200, description = "BMI and category", body = BmiRes),
        (status = 422, description = "Implausible weight, height or BMI", body = ErrorRes)
    )
)]
/// Compute and classify a BMI without storing anything.
#[axum::debug_handler]
async fn bmi(
    State(_state): State<AppState>,
    Query(query): Query<BmiQuery>,
) -> ApiResult<Json<BmiRes>> {
    validate_weight(query.weight)?;
    validate_height(query.height)?;
    let bmi = compute_and_validate_bmi(query.weight, query.height)?;

    Ok(Json(BmiRes {
        bmi,
        category: classify_bmi(bmi).label().into(),
    }))
}
