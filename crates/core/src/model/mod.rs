//! Domain model: entities, aggregates and the values they exchange with ports.

mod appointment;
mod medical_record;
mod patient;
mod payment;
mod video_conference;

pub use appointment::{Appointment, AppointmentEvent, AppointmentKind, AppointmentStatus};
pub use medical_record::{Exam, MedicalRecord, MedicalRecordBuilder, Medication, Prescription};
pub use patient::{Address, Doctor, HealthPlan, Measurement, Patient, Phone, PhoneKind};
pub use payment::{
    CardDetails, Payment, PaymentEvent, PaymentResult, PaymentStatus, TransactionRequest,
    TransactionResponse, TransactionStatus,
};
pub use video_conference::{MeetingRequest, VideoConference};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Doctor, Patient};
    use chrono::NaiveDate;
    use clinica_types::{NonEmptyText, Sex};

    pub fn text(s: &str) -> NonEmptyText {
        NonEmptyText::new(s).expect("test text is non-empty")
    }

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    pub fn ana() -> Patient {
        Patient::new(
            1,
            text("Ana"),
            text("Maria Souza"),
            day(2021, 6, 15),
            Sex::Female,
            None,
        )
    }

    pub fn dr_vilegas() -> Doctor {
        Doctor {
            id: 1,
            name: text("Dr. Vilegas"),
            specialty: text("Pediatrics"),
            crm: text("CRM-SP-12345"),
        }
    }
}
