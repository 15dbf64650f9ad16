//! Outbound ports consumed by the use-case services.
//!
//! Services hold these as `Arc<dyn Port>` so one adapter instance can be shared across
//! services and worker threads. Every port is `Send + Sync`.

use crate::error::{GatewayError, RepositoryError};
use crate::model::{
    Appointment, Doctor, Exam, HealthPlan, MedicalRecord, Medication, MeetingRequest, Patient,
    Payment, TransactionRequest, TransactionResponse, VideoConference,
};
use crate::Id;
use chrono::{NaiveDate, NaiveDateTime};

pub type RepoResult<T> = Result<T, RepositoryError>;

pub trait AppointmentRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Appointment>>;

    /// Inserts or replaces the appointment with the same id.
    fn save(&self, appointment: &Appointment) -> RepoResult<()>;

    fn find_by_date(&self, date: NaiveDate) -> RepoResult<Vec<Appointment>>;

    /// Every appointment of one patient, ordered by scheduled time.
    fn find_by_patient(&self, patient_id: Id) -> RepoResult<Vec<Appointment>>;

    /// Appointments of `doctor_id` scheduled within `[from, to]`, any status.
    fn find_by_doctor_between(
        &self,
        doctor_id: Id,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<Appointment>>;
}

pub trait MedicalRecordRepository: Send + Sync {
    /// Stores a new record.
    ///
    /// Implementations must reject a second record for the same appointment with
    /// `RepositoryError::Duplicate`, atomically with the insert.
    fn save(&self, record: &MedicalRecord) -> RepoResult<()>;

    fn exists_for_appointment(&self, appointment_id: Id) -> RepoResult<bool>;

    /// Records of one patient in registration order.
    fn find_by_patient(&self, patient_id: Id) -> RepoResult<Vec<MedicalRecord>>;
}

pub trait MedicationRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Medication>>;
}

pub trait ExamRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Exam>>;
}

pub trait PaymentRepository: Send + Sync {
    fn save(&self, payment: &Payment) -> RepoResult<()>;
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Payment>>;
}

pub trait PatientRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Patient>>;
    fn save(&self, patient: &Patient) -> RepoResult<()>;
}

pub trait DoctorRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Doctor>>;

    /// Inserts or replaces the doctor with the same id.
    ///
    /// Implementations must reject a CRM already held by another doctor (compared
    /// case-insensitively) with `RepositoryError::Duplicate`, atomically with the insert.
    fn save(&self, doctor: &Doctor) -> RepoResult<()>;

    fn list_all(&self) -> RepoResult<Vec<Doctor>>;
}

pub trait HealthPlanRepository: Send + Sync {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<HealthPlan>>;
}

/// Source of entity ids. Ids only need to be unique.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> Id;
}

pub trait PaymentGateway: Send + Sync {
    /// Submits a transaction. A declined card is an `Ok` response with `success == false`;
    /// `Err` is reserved for the gateway being unusable.
    fn process(&self, request: &TransactionRequest) -> Result<TransactionResponse, GatewayError>;

    fn name(&self) -> &str;
}

/// Creates and cancels the meetings online appointments are held in.
pub trait VideoConferenceProvider: Send + Sync {
    fn create_meeting(&self, request: &MeetingRequest) -> Result<VideoConference, GatewayError>;

    fn cancel_meeting(&self, meeting_id: &str) -> Result<(), GatewayError>;

    fn name(&self) -> &str;
}
