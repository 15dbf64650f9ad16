//! Patients, doctors, health plans and patient contact details.
//!
//! These are the registration-side aggregates that appointments refer to by value.

use crate::validation::{
    classify_bmi, compute_and_validate_bmi, validate_height, validate_weight, BmiCategory,
};
use crate::{ClinicResult, Id};
use chrono::NaiveDate;
use clinica_types::{NonEmptyText, Sex};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthPlan {
    pub id: Id,
    pub name: NonEmptyText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: Id,
    pub name: NonEmptyText,
    pub specialty: NonEmptyText,
    /// Professional registration number (CRM).
    pub crm: NonEmptyText,
}

impl Doctor {
    /// CRM comparison used for uniqueness; case-insensitive.
    pub fn has_crm(&self, crm: &str) -> bool {
        self.crm.as_str().eq_ignore_ascii_case(crm.trim())
    }
}

/// Postal address of a patient's household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: NonEmptyText,
    pub number: NonEmptyText,
    pub complement: Option<String>,
    pub district: NonEmptyText,
    pub city: NonEmptyText,
    /// Two-letter state code (UF).
    pub state: NonEmptyText,
    pub postal_code: NonEmptyText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhoneKind {
    Mobile,
    Home,
    Work,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone {
    pub number: NonEmptyText,
    pub kind: PhoneKind,
    /// Who answers this number, when it is not the guardian.
    pub contact: Option<NonEmptyText>,
}

/// A weight/height reading taken on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    weight: f64,
    height: f64,
    date: NaiveDate,
}

impl Measurement {
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if weight or height are out of bounds.
    pub fn new(weight: f64, height: f64, date: NaiveDate) -> ClinicResult<Self> {
        validate_weight(weight)?;
        validate_height(height)?;
        Ok(Self {
            weight,
            height,
            date,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn bmi(&self) -> ClinicResult<f64> {
        compute_and_validate_bmi(self.weight, self.height)
    }

    pub fn bmi_category(&self) -> ClinicResult<BmiCategory> {
        self.bmi().map(classify_bmi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    id: Id,
    child_name: NonEmptyText,
    guardian_name: NonEmptyText,
    birth_date: NaiveDate,
    sex: Sex,
    health_plan: Option<HealthPlan>,
    address: Option<Address>,
    phones: Vec<Phone>,
    measurements: Vec<Measurement>,
    medical_record_ids: Vec<Id>,
}

impl Patient {
    pub fn new(
        id: Id,
        child_name: NonEmptyText,
        guardian_name: NonEmptyText,
        birth_date: NaiveDate,
        sex: Sex,
        health_plan: Option<HealthPlan>,
    ) -> Self {
        Self {
            id,
            child_name,
            guardian_name,
            birth_date,
            sex,
            health_plan,
            address: None,
            phones: Vec::new(),
            measurements: Vec::new(),
            medical_record_ids: Vec::new(),
        }
    }

    pub fn with_contact(mut self, address: Option<Address>, phones: Vec<Phone>) -> Self {
        self.address = address;
        self.phones = phones;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn child_name(&self) -> &NonEmptyText {
        &self.child_name
    }

    pub fn guardian_name(&self) -> &NonEmptyText {
        &self.guardian_name
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn health_plan(&self) -> Option<&HealthPlan> {
        self.health_plan.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    /// A patient without a health plan pays privately.
    pub fn is_private(&self) -> bool {
        self.health_plan.is_none()
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn latest_measurement(&self) -> Option<&Measurement> {
        self.measurements.iter().max_by_key(|m| m.date())
    }

    pub fn record_measurement(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn medical_record_ids(&self) -> &[Id] {
        &self.medical_record_ids
    }

    /// Links a medical record to this patient; linking the same id twice is a no-op.
    pub fn register_medical_record(&mut self, medical_record_id: Id) {
        if !self.medical_record_ids.contains(&medical_record_id) {
            self.medical_record_ids.push(medical_record_id);
        }
    }
}
