//! Medical record registration and history.

use super::at_boundary;
use crate::model::{
    Appointment, AppointmentStatus, Exam, Measurement, MedicalRecord, Prescription,
};
use crate::ports::{
    AppointmentRepository, ExamRepository, IdGenerator, MedicalRecordRepository,
    MedicationRepository, PatientRepository,
};
use crate::{ClinicError, ClinicResult, Id};
use std::sync::Arc;

/// One prescription line of a registration command.
#[derive(Debug, Clone)]
pub struct PrescriptionItem {
    pub medication_id: Id,
    pub dosage: String,
    pub administration: String,
    pub duration: String,
}

#[derive(Debug, Clone)]
pub struct RegisterMedicalRecordCommand {
    pub appointment_id: Id,
    pub weight: f64,
    pub height: f64,
    pub symptoms: Option<String>,
    pub clinical_notes: Option<String>,
    pub prescriptions: Vec<PrescriptionItem>,
    pub exam_ids: Vec<Id>,
}

/// Registers the medical record of a scheduled appointment and realizes the appointment.
#[derive(Clone)]
pub struct MedicalRecordService {
    appointments: Arc<dyn AppointmentRepository>,
    records: Arc<dyn MedicalRecordRepository>,
    medications: Arc<dyn MedicationRepository>,
    exams: Arc<dyn ExamRepository>,
    patients: Arc<dyn PatientRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl MedicalRecordService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        records: Arc<dyn MedicalRecordRepository>,
        medications: Arc<dyn MedicationRepository>,
        exams: Arc<dyn ExamRepository>,
        patients: Arc<dyn PatientRepository>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            appointments,
            records,
            medications,
            exams,
            patients,
            ids,
        }
    }

    /// Registers the medical record produced by an appointment.
    ///
    /// The steps run strictly in order: the appointment is loaded and must be `Scheduled`,
    /// no record may exist for it yet, every referenced medication and exam must resolve,
    /// and only then is the record built, stored, and the appointment realized.
    ///
    /// # Arguments
    ///
    /// * `cmd` - Appointment id, measurements, free text, prescription lines and exam ids.
    ///
    /// # Returns
    ///
    /// The id of the new medical record.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the appointment, a medication or an exam does not exist.
    /// - `InvalidState` if the appointment is not `Scheduled`.
    /// - `Conflict` if the appointment already has a record.
    /// - `Validation` if weight, height or BMI are out of bounds.
    /// - `BusinessRule` wrapping any storage failure.
    pub fn register(&self, cmd: RegisterMedicalRecordCommand) -> ClinicResult<Id> {
        tracing::info!(appointment_id = cmd.appointment_id, "registering medical record");
        at_boundary("failed to register medical record", self.try_register(cmd))
    }

    fn try_register(&self, cmd: RegisterMedicalRecordCommand) -> ClinicResult<Id> {
        let mut appointment = self
            .appointments
            .find_by_id(cmd.appointment_id)?
            .ok_or_else(|| ClinicError::not_found("appointment", cmd.appointment_id))?;

        if appointment.status() != AppointmentStatus::Scheduled {
            return Err(ClinicError::InvalidState(format!(
                "appointment {} is {}; only scheduled appointments can be registered",
                appointment.id(),
                appointment.status()
            )));
        }

        if self.records.exists_for_appointment(appointment.id())? {
            return Err(ClinicError::Conflict(format!(
                "a medical record already exists for appointment {}",
                appointment.id()
            )));
        }
        tracing::debug!(appointment_id = appointment.id(), "appointment validated");

        let prescriptions = cmd
            .prescriptions
            .into_iter()
            .map(|item| self.resolve_prescription(item))
            .collect::<ClinicResult<Vec<Prescription>>>()?;

        let exams = cmd
            .exam_ids
            .iter()
            .map(|&id| self.resolve_exam(id))
            .collect::<ClinicResult<Vec<Exam>>>()?;

        let record_id = self.ids.generate_id();
        let record = MedicalRecord::builder()
            .id(record_id)
            .appointment(appointment.clone())
            .weight(cmd.weight)
            .height(cmd.height)
            .symptoms(cmd.symptoms)
            .clinical_notes(cmd.clinical_notes)
            .prescriptions(prescriptions)
            .exams(exams)
            .build()?;

        self.records.save(&record)?;
        tracing::info!(record_id, bmi = record.bmi(), "medical record stored");

        // Not atomic with the record insert. A retry after a failure here stops at the
        // Conflict check, so the appointment must then be realized from the stored record.
        appointment.realize(record_id)?;
        self.appointments.save(&appointment)?;

        self.update_patient_history(&appointment, &record);

        Ok(record_id)
    }

    fn resolve_prescription(&self, item: PrescriptionItem) -> ClinicResult<Prescription> {
        let medication = self
            .medications
            .find_by_id(item.medication_id)?
            .ok_or_else(|| ClinicError::not_found("medication", item.medication_id))?;

        Ok(Prescription::new(
            self.ids.generate_id(),
            medication,
            item.dosage,
            item.administration,
            item.duration,
        ))
    }

    fn resolve_exam(&self, id: Id) -> ClinicResult<Exam> {
        self.exams
            .find_by_id(id)?
            .ok_or_else(|| ClinicError::not_found("exam", id))
    }

    /// Links the record and the visit's measurement to the stored patient.
    ///
    /// Best effort: the registration has already succeeded, so failures are only logged.
    fn update_patient_history(&self, appointment: &Appointment, record: &MedicalRecord) {
        let patient_id = appointment.patient().id();

        match self.link_to_patient(patient_id, appointment, record) {
            Ok(true) => tracing::debug!(patient_id, "patient history updated"),
            Ok(false) => tracing::debug!(patient_id, "patient not stored; history skipped"),
            Err(err) => {
                tracing::warn!(patient_id, error = %err, "failed to update patient history")
            }
        }
    }

    fn link_to_patient(
        &self,
        patient_id: Id,
        appointment: &Appointment,
        record: &MedicalRecord,
    ) -> ClinicResult<bool> {
        let Some(mut patient) = self.patients.find_by_id(patient_id)? else {
            return Ok(false);
        };

        patient.register_medical_record(record.id());
        patient.record_measurement(Measurement::new(
            record.weight(),
            record.height(),
            appointment.scheduled_at().date(),
        )?);
        self.patients.save(&patient)?;
        Ok(true)
    }

    /// Medical records of one patient, oldest first.
    pub fn history_for_patient(&self, patient_id: Id) -> ClinicResult<Vec<MedicalRecord>> {
        at_boundary(
            "failed to load medical record history",
            self.records.find_by_patient(patient_id).map_err(Into::into),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::model::test_support::{ana, dr_vilegas};
    use crate::ports::RepoResult;
    use crate::services::fixtures::{ana_appointment, Fixture};

    fn ana_command() -> RegisterMedicalRecordCommand {
        RegisterMedicalRecordCommand {
            appointment_id: 1,
            weight: 15.2,
            height: 0.95,
            symptoms: Some("Fever for two days".into()),
            clinical_notes: None,
            prescriptions: vec![PrescriptionItem {
                medication_id: 1,
                dosage: "10mg/kg".into(),
                administration: "oral, every 6h".into(),
                duration: "3 days".into(),
            }],
            exam_ids: vec![1],
        }
    }

    #[test]
    fn test_register_realizes_appointment_and_returns_positive_id() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let record_id = fx
            .services
            .medical_records
            .register(ana_command())
            .expect("registration succeeds");
        assert!(record_id > 0);

        let appt = AppointmentRepository::find_by_id(fx.store.as_ref(), 1)
            .expect("lock")
            .expect("appointment exists");
        assert_eq!(appt.status(), AppointmentStatus::Realized);
        assert_eq!(appt.medical_record_id(), Some(record_id));

        let history = fx
            .services
            .medical_records
            .history_for_patient(1)
            .expect("history");
        assert_eq!(history.len(), 1);
        let record = &history[0];
        assert!((record.bmi() - 16.8).abs() < 0.05);
        assert_eq!(record.classify_bmi().label(), "underweight");
        assert_eq!(record.prescriptions()[0].dosage, "10mg/kg");
        assert_eq!(record.exams()[0].id, 1);
    }

    #[test]
    fn test_record_for_appointment_reset_to_scheduled_bypasses_status_check_and_is_conflict() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        fx.services
            .medical_records
            .register(ana_command())
            .expect("first registration");

        // Storing the appointment as SCHEDULED again skips the status check, so only the
        // one-record-per-appointment check is left to reject this.
        fx.save_appointment(ana_appointment());
        let err = fx
            .services
            .medical_records
            .register(ana_command())
            .expect_err("second registration must fail");
        assert!(matches!(err, ClinicError::Conflict(_)));
    }

    #[test]
    fn test_re_registering_realized_appointment_is_invalid_state() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());
        fx.services
            .medical_records
            .register(ana_command())
            .expect("first registration");

        let err = fx
            .services
            .medical_records
            .register(ana_command())
            .expect_err("second registration must fail");
        assert!(matches!(err, ClinicError::InvalidState(_)));
        assert!(err.is_business_rule());
    }

    #[test]
    fn test_unknown_appointment_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .services
            .medical_records
            .register(ana_command())
            .expect_err("no appointment stored");
        assert!(matches!(
            err,
            ClinicError::NotFound {
                entity: "appointment",
                id: 1
            }
        ));
    }

    #[test]
    fn test_cancelled_appointment_is_invalid_state() {
        let fx = Fixture::new();
        let mut appt = ana_appointment();
        appt.cancel().expect("cancel");
        fx.save_appointment(appt);

        let err = fx
            .services
            .medical_records
            .register(ana_command())
            .expect_err("cancelled appointment");
        assert!(matches!(err, ClinicError::InvalidState(_)));
    }

    #[test]
    fn test_unknown_medication_or_exam_is_not_found_and_nothing_is_stored() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let mut cmd = ana_command();
        cmd.prescriptions[0].medication_id = 99;
        let err = fx.services.medical_records.register(cmd).expect_err("bad medication");
        assert!(matches!(err, ClinicError::NotFound { entity: "medication", id: 99 }));

        let mut cmd = ana_command();
        cmd.exam_ids = vec![1, 42];
        let err = fx.services.medical_records.register(cmd).expect_err("bad exam");
        assert!(matches!(err, ClinicError::NotFound { entity: "exam", id: 42 }));

        assert!(!fx.store.exists_for_appointment(1).expect("lock"));
    }

    #[test]
    fn test_implausible_bmi_is_rejected_and_appointment_stays_scheduled() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());

        let mut cmd = ana_command();
        cmd.weight = 1.0;
        cmd.height = 0.45;
        let err = fx
            .services
            .medical_records
            .register(cmd)
            .expect_err("BMI ≈ 4.9");
        assert!(matches!(err, ClinicError::Validation(_)));

        let appt = AppointmentRepository::find_by_id(fx.store.as_ref(), 1)
            .expect("lock")
            .expect("appointment exists");
        assert_eq!(appt.status(), AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_patient_history_records_measurement_and_record_id() {
        let fx = Fixture::new();
        PatientRepository::save(fx.store.as_ref(), &ana()).expect("save patient");
        fx.save_appointment(ana_appointment());

        let record_id = fx
            .services
            .medical_records
            .register(ana_command())
            .expect("registration succeeds");

        let patient = PatientRepository::find_by_id(fx.store.as_ref(), 1)
            .expect("lock")
            .expect("patient exists");
        assert_eq!(patient.medical_record_ids(), &[record_id]);
        let latest = patient.latest_measurement().expect("measurement recorded");
        assert!((latest.weight() - 15.2).abs() < f64::EPSILON);
    }

    struct BrokenRecords;

    impl MedicalRecordRepository for BrokenRecords {
        fn save(&self, _record: &MedicalRecord) -> RepoResult<()> {
            Err(RepositoryError::Unavailable("disk full".into()))
        }

        fn exists_for_appointment(&self, _appointment_id: Id) -> RepoResult<bool> {
            Ok(false)
        }

        fn find_by_patient(&self, _patient_id: Id) -> RepoResult<Vec<MedicalRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_storage_failure_is_wrapped_as_business_rule() {
        let fx = Fixture::new();
        fx.save_appointment(ana_appointment());
        let service = MedicalRecordService::new(
            fx.store.clone(),
            Arc::new(BrokenRecords),
            fx.store.clone(),
            fx.store.clone(),
            fx.store.clone(),
            fx.ids.clone(),
        );

        let err = service.register(ana_command()).expect_err("save fails");
        match err {
            ClinicError::BusinessRule(msg) => {
                assert!(msg.starts_with("failed to register medical record"));
                assert!(msg.contains("disk full"));
            }
            other => panic!("expected BusinessRule, got {other:?}"),
        }

        let appt = AppointmentRepository::find_by_id(fx.store.as_ref(), 1)
            .expect("lock")
            .expect("appointment exists");
        assert_eq!(appt.status(), AppointmentStatus::Scheduled);
        assert_eq!(appt.doctor(), &dr_vilegas());
    }
}
