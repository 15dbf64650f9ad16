use crate::constants::DEFAULT_ID_SEED;
use crate::error::RepositoryError;
use crate::model::{
    Appointment, Doctor, Exam, HealthPlan, MedicalRecord, Medication, Patient, Payment,
};
use crate::ports::{
    AppointmentRepository, DoctorRepository, ExamRepository, HealthPlanRepository, IdGenerator,
    MedicalRecordRepository, MedicationRepository, PatientRepository, PaymentRepository,
    RepoResult,
};
use crate::Id;
use chrono::{NaiveDate, NaiveDateTime};
use clinica_types::NonEmptyText;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    appointments: BTreeMap<Id, Appointment>,
    /// Insertion order is registration order.
    medical_records: Vec<MedicalRecord>,
    medications: BTreeMap<Id, Medication>,
    exams: BTreeMap<Id, Exam>,
    payments: BTreeMap<Id, Payment>,
    patients: BTreeMap<Id, Patient>,
    doctors: BTreeMap<Id, Doctor>,
    health_plans: BTreeMap<Id, HealthPlan>,
}

/// Process-local storage implementing every repository port.
///
/// All tables sit behind one mutex, so each port call is atomic with respect to the others.
/// Values are cloned in and out; callers never hold references into the store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Poisoned("in-memory store"))
    }

    pub fn insert_medication(&self, medication: Medication) -> RepoResult<()> {
        self.lock()?.medications.insert(medication.id, medication);
        Ok(())
    }

    pub fn insert_exam(&self, exam: Exam) -> RepoResult<()> {
        self.lock()?.exams.insert(exam.id, exam);
        Ok(())
    }

    pub fn insert_health_plan(&self, plan: HealthPlan) -> RepoResult<()> {
        self.lock()?.health_plans.insert(plan.id, plan);
        Ok(())
    }

    /// Loads the starter catalogue of medications, exams and one health plan.
    pub fn seed_default_catalogue(&self) -> RepoResult<()> {
        let medications = [(1, "Paracetamol"), (2, "Ibuprofen"), (3, "Amoxicillin")];
        let exams = [(1, "Complete blood count"), (2, "X-ray"), (3, "Urinalysis")];

        for (id, name) in medications {
            if let Ok(name) = NonEmptyText::new(name) {
                self.insert_medication(Medication { id, name })?;
            }
        }
        for (id, name) in exams {
            if let Ok(name) = NonEmptyText::new(name) {
                self.insert_exam(Exam { id, name })?;
            }
        }
        if let Ok(name) = NonEmptyText::new("Standard Health Plan") {
            self.insert_health_plan(HealthPlan { id: 1, name })?;
        }

        let tables = self.lock()?;
        tracing::debug!(
            medications = tables.medications.len(),
            exams = tables.exams.len(),
            "seeded default catalogue"
        );
        Ok(())
    }
}

impl AppointmentRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Appointment>> {
        Ok(self.lock()?.appointments.get(&id).cloned())
    }

    fn save(&self, appointment: &Appointment) -> RepoResult<()> {
        self.lock()?
            .appointments
            .insert(appointment.id(), appointment.clone());
        Ok(())
    }

    fn find_by_date(&self, date: NaiveDate) -> RepoResult<Vec<Appointment>> {
        let tables = self.lock()?;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.scheduled_at().date() == date)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.scheduled_at());
        Ok(found)
    }

    fn find_by_patient(&self, patient_id: Id) -> RepoResult<Vec<Appointment>> {
        let tables = self.lock()?;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.patient().id() == patient_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.scheduled_at());
        Ok(found)
    }

    fn find_by_doctor_between(
        &self,
        doctor_id: Id,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepoResult<Vec<Appointment>> {
        let tables = self.lock()?;
        Ok(tables
            .appointments
            .values()
            .filter(|a| a.doctor().id == doctor_id)
            .filter(|a| (from..=to).contains(&a.scheduled_at()))
            .cloned()
            .collect())
    }
}

impl MedicalRecordRepository for InMemoryStore {
    fn save(&self, record: &MedicalRecord) -> RepoResult<()> {
        let mut tables = self.lock()?;
        let appointment_id = record.appointment_id();

        if tables
            .medical_records
            .iter()
            .any(|r| r.appointment_id() == appointment_id)
        {
            return Err(RepositoryError::Duplicate {
                entity: "medical record",
                key: appointment_id.to_string(),
            });
        }

        tables.medical_records.push(record.clone());
        Ok(())
    }

    fn exists_for_appointment(&self, appointment_id: Id) -> RepoResult<bool> {
        Ok(self
            .lock()?
            .medical_records
            .iter()
            .any(|r| r.appointment_id() == appointment_id))
    }

    fn find_by_patient(&self, patient_id: Id) -> RepoResult<Vec<MedicalRecord>> {
        Ok(self
            .lock()?
            .medical_records
            .iter()
            .filter(|r| r.patient_id() == patient_id)
            .cloned()
            .collect())
    }
}

impl MedicationRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Medication>> {
        Ok(self.lock()?.medications.get(&id).cloned())
    }
}

impl ExamRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Exam>> {
        Ok(self.lock()?.exams.get(&id).cloned())
    }
}

impl PaymentRepository for InMemoryStore {
    fn save(&self, payment: &Payment) -> RepoResult<()> {
        self.lock()?.payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Id) -> RepoResult<Option<Payment>> {
        Ok(self.lock()?.payments.get(&id).cloned())
    }
}

impl PatientRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Patient>> {
        Ok(self.lock()?.patients.get(&id).cloned())
    }

    fn save(&self, patient: &Patient) -> RepoResult<()> {
        self.lock()?.patients.insert(patient.id(), patient.clone());
        Ok(())
    }
}

impl DoctorRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<Doctor>> {
        Ok(self.lock()?.doctors.get(&id).cloned())
    }

    fn save(&self, doctor: &Doctor) -> RepoResult<()> {
        let mut tables = self.lock()?;

        if tables
            .doctors
            .values()
            .any(|d| d.id != doctor.id && d.has_crm(doctor.crm.as_str()))
        {
            return Err(RepositoryError::Duplicate {
                entity: "doctor",
                key: doctor.crm.to_string(),
            });
        }

        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Doctor>> {
        Ok(self.lock()?.doctors.values().cloned().collect())
    }
}

impl HealthPlanRepository for InMemoryStore {
    fn find_by_id(&self, id: Id) -> RepoResult<Option<HealthPlan>> {
        Ok(self.lock()?.health_plans.get(&id).cloned())
    }
}

/// Hands out increasing ids starting at a configurable seed.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicI64,
}

impl SequentialIdGenerator {
    pub fn starting_at(seed: Id) -> Self {
        Self {
            next: AtomicI64::new(seed),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(DEFAULT_ID_SEED)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate_id(&self) -> Id {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ana, day, dr_vilegas, text};
    use clinica_types::Sex;
    use std::sync::Arc;
    use std::thread;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 3, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid date-time")
    }

    fn record_for(store: &InMemoryStore, record_id: Id, appointment: Appointment) -> RepoResult<()> {
        let record = MedicalRecord::builder()
            .id(record_id)
            .appointment(appointment)
            .weight(15.2)
            .height(0.95)
            .build()
            .expect("valid record");
        MedicalRecordRepository::save(store, &record)
    }

    #[test]
    fn test_second_record_for_same_appointment_is_duplicate() {
        let store = InMemoryStore::new();
        let appt = Appointment::new(1, ana(), dr_vilegas(), at(10, 9, 0), true);

        record_for(&store, 10, appt.clone()).expect("first insert");
        let err = record_for(&store, 11, appt).expect_err("second insert must fail");

        assert!(matches!(
            err,
            RepositoryError::Duplicate {
                entity: "medical record",
                ref key
            } if key == "1"
        ));
        assert!(store.exists_for_appointment(1).expect("lock"));
        assert_eq!(MedicalRecordRepository::find_by_patient(&store, 1).expect("lock").len(), 1);
    }

    #[test]
    fn test_concurrent_saves_store_exactly_one_record() {
        let store = Arc::new(InMemoryStore::new());
        let appt = Appointment::new(1, ana(), dr_vilegas(), at(10, 9, 0), true);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let appt = appt.clone();
                thread::spawn(move || record_for(&store, 100 + i, appt).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("thread completes"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn test_find_by_date_sorts_by_time() {
        let store = InMemoryStore::new();
        let late = Appointment::new(1, ana(), dr_vilegas(), at(10, 15, 0), false);
        let early = Appointment::new(2, ana(), dr_vilegas(), at(10, 8, 0), false);
        let other_day = Appointment::new(3, ana(), dr_vilegas(), at(11, 8, 0), false);
        for a in [&late, &early, &other_day] {
            AppointmentRepository::save(&store, a).expect("save");
        }

        let day = NaiveDate::from_ymd_opt(2030, 3, 10).expect("valid date");
        let ids: Vec<Id> = store
            .find_by_date(day)
            .expect("lock")
            .iter()
            .map(Appointment::id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_find_by_doctor_between_is_inclusive() {
        let store = InMemoryStore::new();
        let appt = Appointment::new(1, ana(), dr_vilegas(), at(10, 9, 30), false);
        AppointmentRepository::save(&store, &appt).expect("save");

        let hits = store
            .find_by_doctor_between(1, at(10, 9, 0), at(10, 9, 30))
            .expect("lock");
        assert_eq!(hits.len(), 1);

        let misses = store
            .find_by_doctor_between(2, at(10, 9, 0), at(10, 10, 0))
            .expect("lock");
        assert!(misses.is_empty());
    }

    #[test]
    fn test_find_by_patient_orders_by_time() {
        let store = InMemoryStore::new();
        let bruno = Patient::new(
            2,
            text("Bruno"),
            text("Carla Lima"),
            day(2022, 2, 1),
            Sex::Male,
            None,
        );
        let later = Appointment::new(1, ana(), dr_vilegas(), at(12, 9, 0), false);
        let earlier = Appointment::new(2, ana(), dr_vilegas(), at(10, 9, 0), true);
        let someone_else = Appointment::new(3, bruno, dr_vilegas(), at(11, 9, 0), true);
        for a in [&later, &earlier, &someone_else] {
            AppointmentRepository::save(&store, a).expect("save");
        }

        let ids: Vec<Id> = AppointmentRepository::find_by_patient(&store, 1)
            .expect("lock")
            .iter()
            .map(Appointment::id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(AppointmentRepository::find_by_patient(&store, 9)
            .expect("lock")
            .is_empty());
    }

    #[test]
    fn test_doctor_crm_is_unique_ignoring_case() {
        let store = InMemoryStore::new();
        DoctorRepository::save(&store, &dr_vilegas()).expect("first doctor");

        let mut twin = dr_vilegas();
        twin.id = 2;
        twin.crm = text("crm-sp-12345");
        let err = DoctorRepository::save(&store, &twin).expect_err("same CRM");
        assert!(matches!(err, RepositoryError::Duplicate { entity: "doctor", .. }));

        let mut renamed = dr_vilegas();
        renamed.name = text("Dra. Vilegas");
        DoctorRepository::save(&store, &renamed).expect("same doctor may be updated");
        assert_eq!(store.list_all().expect("lock").len(), 1);
    }

    #[test]
    fn test_concurrent_doctor_saves_keep_one_crm() {
        let store = Arc::new(InMemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut doctor = dr_vilegas();
                    doctor.id = 10 + i;
                    DoctorRepository::save(store.as_ref(), &doctor).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("thread completes"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.list_all().expect("lock").len(), 1);
    }

    #[test]
    fn test_inserted_catalogue_entries_are_found() {
        let store = InMemoryStore::new();
        store
            .insert_medication(Medication {
                id: 40,
                name: text("Salbutamol"),
            })
            .expect("insert medication");
        store
            .insert_exam(Exam {
                id: 41,
                name: text("Chest X-ray"),
            })
            .expect("insert exam");
        store
            .insert_health_plan(HealthPlan {
                id: 42,
                name: text("Family Plan"),
            })
            .expect("insert plan");

        assert!(MedicationRepository::find_by_id(&store, 40).expect("lock").is_some());
        assert!(ExamRepository::find_by_id(&store, 41).expect("lock").is_some());
        let plan = HealthPlanRepository::find_by_id(&store, 42)
            .expect("lock")
            .expect("inserted");
        assert_eq!(plan.name, text("Family Plan"));
    }

    #[test]
    fn test_seed_catalogue_resolves_ids() {
        let store = InMemoryStore::new();
        store.seed_default_catalogue().expect("seed");

        let med = MedicationRepository::find_by_id(&store, 1)
            .expect("lock")
            .expect("seeded");
        assert_eq!(med.name, text("Paracetamol"));
        assert!(ExamRepository::find_by_id(&store, 1).expect("lock").is_some());
        assert!(HealthPlanRepository::find_by_id(&store, 1)
            .expect("lock")
            .is_some());
        assert!(ExamRepository::find_by_id(&store, 99).expect("lock").is_none());
    }

    #[test]
    fn test_sequential_ids_start_at_seed() {
        let ids = SequentialIdGenerator::starting_at(500);
        assert_eq!(ids.generate_id(), 500);
        assert_eq!(ids.generate_id(), 501);
        assert_eq!(SequentialIdGenerator::default().generate_id(), 1);
    }
}
