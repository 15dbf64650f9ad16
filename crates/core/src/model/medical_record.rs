//! Medical record aggregate and its builder.
//!
//! A [`MedicalRecord`] is the clinical outcome of one realized appointment. It is immutable
//! once built; the only way to obtain one is through [`MedicalRecordBuilder::build`], which
//! re-validates weight and height and rejects implausible BMI values.

use super::Appointment;
use crate::validation::{
    classify_bmi, compute_and_validate_bmi, validate_height, validate_weight, BmiCategory,
};
use crate::{ClinicError, ClinicResult, Id};
use clinica_types::NonEmptyText;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    pub id: Id,
    pub name: NonEmptyText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exam {
    pub id: Id,
    pub name: NonEmptyText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prescription {
    pub id: Id,
    pub medication: Medication,
    pub dosage: String,
    pub administration: String,
    pub duration: String,
}

impl Prescription {
    pub fn new(
        id: Id,
        medication: Medication,
        dosage: impl Into<String>,
        administration: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            id,
            medication,
            dosage: dosage.into(),
            administration: administration.into(),
            duration: duration.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicalRecord {
    id: Id,
    /// Appointment as it was when the record was built.
    appointment: Appointment,
    weight: f64,
    height: f64,
    bmi: f64,
    symptoms: String,
    clinical_notes: String,
    prescriptions: Vec<Prescription>,
    exams: Vec<Exam>,
}

impl MedicalRecord {
    pub fn builder() -> MedicalRecordBuilder {
        MedicalRecordBuilder::default()
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn appointment(&self) -> &Appointment {
        &self.appointment
    }

    pub fn appointment_id(&self) -> Id {
        self.appointment.id()
    }

    pub fn patient_id(&self) -> Id {
        self.appointment.patient().id()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }

    pub fn clinical_notes(&self) -> &str {
        &self.clinical_notes
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn classify_bmi(&self) -> BmiCategory {
        classify_bmi(self.bmi)
    }
}

/// Accumulates the parts of a [`MedicalRecord`].
///
/// Setters never fail. A rejected weight or height is remembered and reported by
/// [`build`](Self::build), so the chain reads top to bottom and the first error wins.
#[derive(Debug, Default)]
pub struct MedicalRecordBuilder {
    id: Option<Id>,
    appointment: Option<Appointment>,
    weight: Option<f64>,
    height: Option<f64>,
    symptoms: Option<String>,
    clinical_notes: Option<String>,
    prescriptions: Vec<Prescription>,
    exams: Vec<Exam>,
    error: Option<ClinicError>,
}

impl MedicalRecordBuilder {
    pub fn id(mut self, id: Id) -> Self {
        self.id = Some(id);
        self
    }

    pub fn appointment(mut self, appointment: Appointment) -> Self {
        self.appointment = Some(appointment);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        match check_measure("weight", weight, validate_weight) {
            Ok(()) => self.weight = Some(weight),
            Err(err) => self.defer(err),
        }
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        match check_measure("height", height, validate_height) {
            Ok(()) => self.height = Some(height),
            Err(err) => self.defer(err),
        }
        self
    }

    pub fn symptoms(mut self, symptoms: Option<impl Into<String>>) -> Self {
        self.symptoms = symptoms.map(Into::into);
        self
    }

    pub fn clinical_notes(mut self, notes: Option<impl Into<String>>) -> Self {
        self.clinical_notes = notes.map(Into::into);
        self
    }

    /// Appends a prescription; `None` is skipped.
    pub fn add_prescription(mut self, prescription: impl Into<Option<Prescription>>) -> Self {
        if let Some(p) = prescription.into() {
            self.prescriptions.push(p);
        }
        self
    }

    /// Appends an exam; `None` is skipped.
    pub fn add_exam(mut self, exam: impl Into<Option<Exam>>) -> Self {
        if let Some(e) = exam.into() {
            self.exams.push(e);
        }
        self
    }

    pub fn prescriptions(self, prescriptions: impl IntoIterator<Item = Prescription>) -> Self {
        prescriptions
            .into_iter()
            .fold(self, |builder, p| builder.add_prescription(p))
    }

    pub fn exams(self, exams: impl IntoIterator<Item = Exam>) -> Self {
        exams.into_iter().fold(self, |builder, e| builder.add_exam(e))
    }

    /// Builds the record.
    ///
    /// # Errors
    ///
    /// - `ClinicError::MissingField` if id, appointment, weight or height was never set.
    /// - `ClinicError::Validation` if a setter rejected its value, or the BMI is out of range.
    pub fn build(self) -> ClinicResult<MedicalRecord> {
        let id = self.id.ok_or(ClinicError::MissingField("id"))?;
        let appointment = self
            .appointment
            .ok_or(ClinicError::MissingField("appointment"))?;

        if let Some(err) = self.error {
            return Err(err);
        }

        let weight = self.weight.ok_or(ClinicError::MissingField("weight"))?;
        let height = self.height.ok_or(ClinicError::MissingField("height"))?;

        validate_weight(weight)?;
        validate_height(height)?;
        let bmi = compute_and_validate_bmi(weight, height)?;

        Ok(MedicalRecord {
            id,
            appointment,
            weight,
            height,
            bmi,
            symptoms: self.symptoms.unwrap_or_default(),
            clinical_notes: self.clinical_notes.unwrap_or_default(),
            prescriptions: self.prescriptions,
            exams: self.exams,
        })
    }

    fn defer(&mut self, err: ClinicError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn check_measure(
    field: &str,
    value: f64,
    validate: fn(f64) -> ClinicResult<()>,
) -> ClinicResult<()> {
    if value.is_nan() || value <= 0.0 {
        return Err(ClinicError::Validation(format!(
            "{field} must be greater than zero"
        )));
    }
    validate(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ana, dr_vilegas};
    use crate::model::AppointmentStatus;
    use chrono::NaiveDate;

    fn appointment() -> Appointment {
        let at = NaiveDate::from_ymd_opt(2030, 3, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date-time");
        Appointment::new(1, ana(), dr_vilegas(), at, true)
    }

    fn paracetamol() -> Medication {
        Medication {
            id: 1,
            name: NonEmptyText::new("Paracetamol").expect("non-empty"),
        }
    }

    fn blood_count() -> Exam {
        Exam {
            id: 1,
            name: NonEmptyText::new("Complete blood count").expect("non-empty"),
        }
    }

    #[test]
    fn test_build_computes_bmi_and_defaults_text() {
        let record = MedicalRecord::builder()
            .id(100)
            .appointment(appointment())
            .weight(15.2)
            .height(0.95)
            .symptoms(None::<String>)
            .build()
            .expect("valid record");

        assert_eq!(record.id(), 100);
        assert_eq!(record.appointment_id(), 1);
        assert!((record.bmi() - 16.84).abs() < 0.01);
        assert_eq!(record.classify_bmi(), BmiCategory::Underweight);
        assert_eq!(record.symptoms(), "");
        assert_eq!(record.clinical_notes(), "");
        assert_eq!(record.appointment().status(), AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_missing_id_or_appointment() {
        let err = MedicalRecord::builder()
            .appointment(appointment())
            .weight(15.2)
            .height(0.95)
            .build()
            .expect_err("id is required");
        assert!(matches!(err, ClinicError::MissingField("id")));

        let err = MedicalRecord::builder()
            .id(1)
            .weight(15.2)
            .height(0.95)
            .build()
            .expect_err("appointment is required");
        assert!(matches!(err, ClinicError::MissingField("appointment")));
    }

    #[test]
    fn test_unset_measurements_are_missing_fields() {
        let err = MedicalRecord::builder()
            .id(1)
            .appointment(appointment())
            .height(0.95)
            .build()
            .expect_err("weight is required");
        assert!(matches!(err, ClinicError::MissingField("weight")));
    }

    #[test]
    fn test_invalid_setter_value_surfaces_at_build() {
        let err = MedicalRecord::builder()
            .id(1)
            .appointment(appointment())
            .weight(-3.0)
            .height(9.0)
            .build()
            .expect_err("negative weight");

        match err {
            ClinicError::Validation(msg) => assert!(msg.starts_with("weight")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_implausible_bmi_fails_at_build() {
        let err = MedicalRecord::builder()
            .id(1)
            .appointment(appointment())
            .weight(1.0)
            .height(0.45)
            .build()
            .expect_err("BMI ≈ 4.9 is implausible");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn test_none_entries_are_skipped_and_order_kept() {
        let second = Prescription::new(3, paracetamol(), "5mg/kg", "oral", "3 days");
        let record = MedicalRecord::builder()
            .id(1)
            .appointment(appointment())
            .weight(15.2)
            .height(0.95)
            .add_prescription(Prescription::new(2, paracetamol(), "10mg/kg", "oral", "5 days"))
            .add_prescription(None::<Prescription>)
            .add_prescription(second)
            .add_exam(None::<Exam>)
            .exams([blood_count()])
            .build()
            .expect("valid record");

        let ids: Vec<Id> = record.prescriptions().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(record.exams().len(), 1);
    }
}
