//! Use-case services.
//!
//! Each service owns the ports it needs as `Arc<dyn Port>` and exposes one method per use
//! case. Errors leaving a service are always in the business-rule category: port failures
//! are folded in by [`at_boundary`].

mod appointment;
mod medical_record;
mod payment;
mod registration;

pub use appointment::{
    AppointmentService, AppointmentSummary, PatientHistory, ScheduleAppointmentCommand,
};
pub use medical_record::{MedicalRecordService, PrescriptionItem, RegisterMedicalRecordCommand};
pub use payment::{PaymentService, ProcessPaymentCommand};
pub use registration::{
    AddressCommand, PhoneCommand, RegisterDoctorCommand, RegisterPatientCommand,
    RegistrationService,
};

use crate::adapters::{
    FakePaymentGateway, FakeVideoConferenceProvider, InMemoryStore, SequentialIdGenerator,
};
use crate::{ClinicResult, CoreConfig};
use std::sync::Arc;

/// Logs a failed use case and wraps port failures with `context`.
pub(crate) fn at_boundary<T>(context: &str, result: ClinicResult<T>) -> ClinicResult<T> {
    result.map_err(|err| {
        if err.is_business_rule() {
            tracing::warn!(error = %err, "{context}");
            err
        } else {
            tracing::error!(error = %err, "{context}");
            err.into_business_rule(context)
        }
    })
}

/// Every use case, wired to one set of adapters.
#[derive(Clone)]
pub struct ClinicServices {
    pub medical_records: MedicalRecordService,
    pub payments: PaymentService,
    pub appointments: AppointmentService,
    pub registration: RegistrationService,
}

impl ClinicServices {
    /// Wires every service to `store`, a sequential id generator seeded from `cfg`, and the
    /// fake payment gateway and video-conference provider.
    pub fn with_store(cfg: Arc<CoreConfig>, store: Arc<InMemoryStore>) -> Self {
        let ids = Arc::new(SequentialIdGenerator::starting_at(cfg.id_seed()));
        let gateway = Arc::new(FakePaymentGateway::new(cfg.gateway_name().clone()));
        let video = Arc::new(FakeVideoConferenceProvider::new(
            cfg.video_provider_name().clone(),
        ));

        Self {
            medical_records: MedicalRecordService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                ids.clone(),
            ),
            payments: PaymentService::new(
                cfg.clone(),
                store.clone(),
                store.clone(),
                gateway,
                ids.clone(),
            ),
            appointments: AppointmentService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                video,
                ids.clone(),
            ),
            registration: RegistrationService::new(store.clone(), store.clone(), store, ids),
        }
    }

    /// Fresh in-memory wiring; seeds the catalogue when `cfg.seed_catalogue()` is set.
    pub fn in_memory(cfg: Arc<CoreConfig>) -> ClinicResult<Self> {
        let store = Arc::new(InMemoryStore::new());
        if cfg.seed_catalogue() {
            store.seed_default_catalogue()?;
        }
        Ok(Self::with_store(cfg, store))
    }
}
