//! JSON request and response bodies.
//!
//! These mirror the core commands and read models but own their wire shape, so the core types
//! stay free of HTTP concerns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clinica_core::model::{
    Appointment, AppointmentKind, Doctor, Exam, MedicalRecord, Payment, PaymentResult, PhoneKind,
    Prescription,
};
use clinica_core::services::{
    AddressCommand, AppointmentSummary, PatientHistory, PhoneCommand,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Identifier of a newly created resource.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdRes {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub status: u16,
    pub message: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub child_name: String,
    pub guardian_name: String,
    #[schema(value_type = String, format = Date)]
    pub birth_date: NaiveDate,
    /// `M` or `F`
    pub sex: String,
    pub health_plan_id: Option<i64>,
    /// Weight in kg at registration; recorded only together with `height`.
    pub weight: Option<f64>,
    /// Height in metres at registration.
    pub height: Option<f64>,
    pub address: Option<AddressReq>,
    #[serde(default)]
    pub phones: Vec<PhoneReq>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressReq {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub postal_code: String,
}

impl From<AddressReq> for AddressCommand {
    fn from(a: AddressReq) -> Self {
        Self {
            street: a.street,
            number: a.number,
            complement: a.complement,
            district: a.district,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhoneKindDto {
    Mobile,
    Home,
    Work,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhoneReq {
    pub number: String,
    pub kind: PhoneKindDto,
    /// Who answers, when it is not the guardian.
    pub contact: Option<String>,
}

impl From<PhoneReq> for PhoneCommand {
    fn from(p: PhoneReq) -> Self {
        Self {
            number: p.number,
            kind: match p.kind {
                PhoneKindDto::Mobile => PhoneKind::Mobile,
                PhoneKindDto::Home => PhoneKind::Home,
                PhoneKindDto::Work => PhoneKind::Work,
            },
            contact: p.contact,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorReq {
    pub name: String,
    pub specialty: String,
    pub crm: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorRes {
    pub id: i64,
    pub name: String,
    pub specialty: String,
    pub crm: String,
}

impl From<Doctor> for DoctorRes {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name.into_inner(),
            specialty: d.specialty.into_inner(),
            crm: d.crm.into_inner(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentKindDto {
    #[default]
    InPerson,
    Online,
}

impl From<AppointmentKindDto> for AppointmentKind {
    fn from(kind: AppointmentKindDto) -> Self {
        match kind {
            AppointmentKindDto::InPerson => AppointmentKind::InPerson,
            AppointmentKindDto::Online => AppointmentKind::Online,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleAppointmentReq {
    pub patient_id: i64,
    pub doctor_id: i64,
    #[schema(value_type = String, format = DateTime, example = "2030-03-10T09:00:00")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub new_patient: bool,
    #[serde(default)]
    pub kind: AppointmentKindDto,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// Day to list, `YYYY-MM-DD`.
    #[param(value_type = String, format = Date)]
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentRes {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: NaiveDateTime,
    pub new_patient: bool,
    pub kind: String,
    pub status: String,
    pub medical_record_id: Option<i64>,
    /// Join link of an online appointment.
    pub meeting_link: Option<String>,
    pub meeting_provider: Option<String>,
}

fn kind_label(kind: AppointmentKind) -> String {
    match kind {
        AppointmentKind::InPerson => "IN_PERSON".into(),
        AppointmentKind::Online => "ONLINE".into(),
    }
}

impl From<&Appointment> for AppointmentRes {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id(),
            patient_id: a.patient().id(),
            patient_name: a.patient().child_name().to_string(),
            doctor_id: a.doctor().id,
            doctor_name: a.doctor().name.to_string(),
            scheduled_at: a.scheduled_at(),
            new_patient: a.is_new_patient(),
            kind: kind_label(a.kind()),
            status: a.status().to_string(),
            medical_record_id: a.medical_record_id(),
            meeting_link: a.video_conference().map(|m| m.link().to_string()),
            meeting_provider: a.video_conference().map(|m| m.provider().to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentSummaryRes {
    pub appointment_id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_at: NaiveDateTime,
    pub doctor_name: String,
    pub specialty: String,
    pub kind: String,
    pub status: String,
    /// Present once the appointment has been realized.
    pub medical_record_id: Option<i64>,
    pub meeting_link: Option<String>,
}

impl From<AppointmentSummary> for AppointmentSummaryRes {
    fn from(s: AppointmentSummary) -> Self {
        Self {
            appointment_id: s.appointment_id,
            scheduled_at: s.scheduled_at,
            doctor_name: s.doctor_name,
            specialty: s.specialty,
            kind: kind_label(s.kind),
            status: s.status.to_string(),
            medical_record_id: s.medical_record_id,
            meeting_link: s.meeting_link,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PatientHistoryRes {
    pub patient_id: i64,
    pub patient_name: String,
    pub appointments: Vec<AppointmentSummaryRes>,
}

impl From<PatientHistory> for PatientHistoryRes {
    fn from(h: PatientHistory) -> Self {
        Self {
            patient_id: h.patient_id,
            patient_name: h.patient_name,
            appointments: h.appointments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PrescriptionItemReq {
    pub medication_id: i64,
    pub dosage: String,
    pub administration: String,
    pub duration: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterMedicalRecordReq {
    pub appointment_id: i64,
    pub weight: f64,
    pub height: f64,
    pub symptoms: Option<String>,
    pub clinical_notes: Option<String>,
    #[serde(default)]
    pub prescriptions: Vec<PrescriptionItemReq>,
    #[serde(default)]
    pub exam_ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrescriptionRes {
    pub id: i64,
    pub medication_id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub administration: String,
    pub duration: String,
}

impl From<&Prescription> for PrescriptionRes {
    fn from(p: &Prescription) -> Self {
        Self {
            id: p.id,
            medication_id: p.medication.id,
            medication_name: p.medication.name.to_string(),
            dosage: p.dosage.clone(),
            administration: p.administration.clone(),
            duration: p.duration.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExamRes {
    pub id: i64,
    pub name: String,
}

impl From<&Exam> for ExamRes {
    fn from(e: &Exam) -> Self {
        Self {
            id: e.id,
            name: e.name.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MedicalRecordRes {
    pub id: i64,
    pub appointment_id: i64,
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub bmi_category: String,
    pub symptoms: String,
    pub clinical_notes: String,
    pub prescriptions: Vec<PrescriptionRes>,
    pub exams: Vec<ExamRes>,
}

impl From<&MedicalRecord> for MedicalRecordRes {
    fn from(r: &MedicalRecord) -> Self {
        Self {
            id: r.id(),
            appointment_id: r.appointment_id(),
            weight: r.weight(),
            height: r.height(),
            bmi: r.bmi(),
            bmi_category: r.classify_bmi().label().into(),
            symptoms: r.symptoms().into(),
            clinical_notes: r.clinical_notes().into(),
            prescriptions: r.prescriptions().iter().map(Into::into).collect(),
            exams: r.exams().iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPaymentReq {
    pub appointment_id: i64,
    /// Defaults to the configured consultation fee.
    #[schema(value_type = Option<String>, example = "150.00")]
    pub amount: Option<Decimal>,
    pub card_number: String,
    pub card_holder: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentRes {
    pub payment_id: i64,
    pub status: String,
    pub message: String,
    pub gateway_transaction_id: Option<String>,
}

impl From<PaymentResult> for PaymentRes {
    fn from(r: PaymentResult) -> Self {
        Self {
            payment_id: r.payment_id,
            status: r.status.to_string(),
            message: r.message,
            gateway_transaction_id: r.gateway_transaction_id,
        }
    }
}

/// Stored state of a payment.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDetailRes {
    pub id: i64,
    pub appointment_id: i64,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub processed_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
}

impl From<&Payment> for PaymentDetailRes {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id(),
            appointment_id: p.appointment_id(),
            amount: p.amount(),
            status: p.status().to_string(),
            created_at: p.created_at(),
            processed_at: p.processed_at(),
            transaction_id: p.transaction_id().map(str::to_owned),
            failure_reason: p.failure_reason().map(str::to_owned),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BmiQuery {
    /// Weight in kg.
    pub weight: f64,
    /// Height in metres.
    pub height: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BmiRes {
    pub bmi: f64,
    pub category: String,
}
