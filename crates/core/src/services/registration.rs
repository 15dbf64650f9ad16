//! Patient and doctor registration.

use super::at_boundary;
use crate::model::{Address, Doctor, HealthPlan, Measurement, Patient, Phone, PhoneKind};
use crate::ports::{DoctorRepository, HealthPlanRepository, IdGenerator, PatientRepository};
use crate::{ClinicError, ClinicResult, Id};
use chrono::{Local, NaiveDate};
use clinica_types::{NonEmptyText, Sex};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RegisterPatientCommand {
    pub child_name: String,
    pub guardian_name: String,
    pub birth_date: NaiveDate,
    /// `"M"` or `"F"`.
    pub sex: String,
    pub health_plan_id: Option<Id>,
    /// Weight (kg) and height (m) taken at registration.
    pub initial_measurement: Option<(f64, f64)>,
    pub address: Option<AddressCommand>,
    pub phones: Vec<PhoneCommand>,
}

#[derive(Debug, Clone)]
pub struct AddressCommand {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone)]
pub struct PhoneCommand {
    pub number: String,
    pub kind: PhoneKind,
    pub contact: Option<String>,
}

fn required(value: &str, field: &str) -> ClinicResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| ClinicError::Validation(format!("{field} is required")))
}

impl AddressCommand {
    fn validate(self) -> ClinicResult<Address> {
        Ok(Address {
            street: required(&self.street, "street")?,
            number: required(&self.number, "address number")?,
            complement: self
                .complement
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
            district: required(&self.district, "district")?,
            city: required(&self.city, "city")?,
            state: required(&self.state, "state")?,
            postal_code: required(&self.postal_code, "postal code")?,
        })
    }
}

impl PhoneCommand {
    fn validate(self) -> ClinicResult<Phone> {
        Ok(Phone {
            number: required(&self.number, "phone number")?,
            kind: self.kind,
            contact: self.contact.and_then(|c| NonEmptyText::new(c).ok()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegisterDoctorCommand {
    pub name: String,
    pub specialty: String,
    pub crm: String,
}

#[derive(Clone)]
pub struct RegistrationService {
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    health_plans: Arc<dyn HealthPlanRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl RegistrationService {
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        health_plans: Arc<dyn HealthPlanRepository>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            patients,
            doctors,
            health_plans,
            ids,
        }
    }

    pub fn register_patient(&self, cmd: RegisterPatientCommand) -> ClinicResult<Id> {
        self.register_patient_as_of(cmd, Local::now().date_naive())
    }

    /// Registers a patient, treating `today` as the current date.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank names, an unknown sex code, a birth date after `today`, an
    ///   implausible initial measurement, or an address or phone with a blank required field.
    /// - `NotFound` if `health_plan_id` does not resolve.
    pub fn register_patient_as_of(
        &self,
        cmd: RegisterPatientCommand,
        today: NaiveDate,
    ) -> ClinicResult<Id> {
        tracing::info!("registering patient");
        at_boundary(
            "failed to register patient",
            self.try_register_patient(cmd, today),
        )
    }

    fn try_register_patient(
        &self,
        cmd: RegisterPatientCommand,
        today: NaiveDate,
    ) -> ClinicResult<Id> {
        let child_name = required(&cmd.child_name, "child name")?;
        let guardian_name = required(&cmd.guardian_name, "guardian name")?;
        let sex: Sex = cmd.sex.parse()?;
        let address = cmd.address.map(AddressCommand::validate).transpose()?;
        let phones = cmd
            .phones
            .into_iter()
            .map(PhoneCommand::validate)
            .collect::<ClinicResult<Vec<_>>>()?;

        if cmd.birth_date > today {
            return Err(ClinicError::Validation(
                "birth date cannot be in the future".into(),
            ));
        }

        let health_plan = cmd
            .health_plan_id
            .map(|id| -> ClinicResult<HealthPlan> {
                self.health_plans
                    .find_by_id(id)?
                    .ok_or_else(|| ClinicError::not_found("health plan", id))
            })
            .transpose()?;

        let id = self.ids.generate_id();
        let mut patient = Patient::new(
            id,
            child_name,
            guardian_name,
            cmd.birth_date,
            sex,
            health_plan,
        )
        .with_contact(address, phones);

        if let Some((weight, height)) = cmd.initial_measurement {
            patient.record_measurement(Measurement::new(weight, height, today)?);
        }

        self.patients.save(&patient)?;
        tracing::info!(patient_id = id, private = patient.is_private(), "patient registered");
        Ok(id)
    }

    /// Registers a doctor. CRM numbers are unique regardless of case; the repository enforces
    /// it when the doctor is saved.
    ///
    /// # Errors
    ///
    /// `Validation` for blank fields, `Conflict` if the CRM is already registered.
    pub fn register_doctor(&self, cmd: RegisterDoctorCommand) -> ClinicResult<Id> {
        tracing::info!("registering doctor");
        at_boundary("failed to register doctor", self.try_register_doctor(cmd))
    }

    fn try_register_doctor(&self, cmd: RegisterDoctorCommand) -> ClinicResult<Id> {
        let name = required(&cmd.name, "doctor name")?;
        let specialty = required(&cmd.specialty, "specialty")?;
        let crm = required(&cmd.crm, "CRM")?;

        let id = self.ids.generate_id();
        self.doctors.save(&Doctor {
            id,
            name,
            specialty,
            crm,
        })?;

        tracing::info!(doctor_id = id, "doctor registered");
        Ok(id)
    }

    pub fn list_doctors(&self) -> ClinicResult<Vec<Doctor>> {
        at_boundary(
            "failed to list doctors",
            self.doctors.list_all().map_err(Into::into),
        )
    }
}
