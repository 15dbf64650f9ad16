use chrono::{Duration, Local, NaiveTime};
use clap::{Parser, Subcommand};
use clinica_core::model::CardDetails;
use clinica_core::services::{
    ClinicServices, PhoneCommand, PrescriptionItem, ProcessPaymentCommand, RegisterDoctorCommand,
    RegisterMedicalRecordCommand, RegisterPatientCommand, ScheduleAppointmentCommand,
};
use clinica_core::validation::{
    classify_bmi, compute_and_validate_bmi, validate_height, validate_weight,
};
use clinica_core::model::{AppointmentKind, PhoneKind};
use clinica_core::{ClinicResult, CoreConfig};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clinica")]
#[command(about = "Pediatric clinic backend CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute and classify a BMI
    Bmi {
        /// Weight in kg
        weight: f64,
        /// Height in metres
        height: f64,
    },
    /// Run a full visit (register, schedule, record, pay) against in-memory storage
    Demo {
        /// Card used for the payment step; numbers ending in 0 are declined
        #[arg(long, default_value = "4111111111111111")]
        card_number: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Bmi { weight, height }) => match bmi_report(weight, height) {
            Ok(report) => println!("{report}"),
            Err(e) => eprintln!("Error computing BMI: {e}"),
        },
        Some(Commands::Demo { card_number }) => {
            let stdout = std::io::stdout();
            run_demo(&mut stdout.lock(), &card_number)?;
        }
        None => {
            println!("Use 'clinica --help' for commands");
        }
    }

    Ok(())
}

fn bmi_report(weight: f64, height: f64) -> ClinicResult<String> {
    validate_weight(weight)?;
    validate_height(height)?;
    let bmi = compute_and_validate_bmi(weight, height)?;
    Ok(format!("BMI: {bmi:.2} ({})", classify_bmi(bmi)))
}

/// Walks Ana's first visit with Dr. Vilegas through every use case and reports each step.
fn run_demo(out: &mut impl Write, card_number: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Arc::new(CoreConfig::with_defaults()?);
    let services = ClinicServices::in_memory(cfg)?;

    let patient_id = services
        .registration
        .register_patient(RegisterPatientCommand {
            child_name: "Ana".into(),
            guardian_name: "Maria Souza".into(),
            birth_date: Local::now().date_naive() - Duration::days(4 * 365),
            sex: "F".into(),
            health_plan_id: None,
            initial_measurement: None,
            address: None,
            phones: vec![PhoneCommand {
                number: "+55 98 99999-0000".into(),
                kind: PhoneKind::Mobile,
                contact: None,
            }],
        })?;
    writeln!(out, "Registered patient {patient_id}")?;

    let doctor_id = services.registration.register_doctor(RegisterDoctorCommand {
        name: "Dr. Vilegas".into(),
        specialty: "Pediatrics".into(),
        crm: "CRM-MA 12345".into(),
    })?;
    writeln!(out, "Registered doctor {doctor_id}")?;

    let tomorrow = Local::now().date_naive() + Duration::days(1);
    let nine = NaiveTime::from_hms_opt(9, 0, 0).ok_or("invalid time")?;
    let appointment_id = services
        .appointments
        .schedule(ScheduleAppointmentCommand {
            patient_id,
            doctor_id,
            scheduled_at: tomorrow.and_time(nine),
            new_patient: true,
            kind: AppointmentKind::InPerson,
        })?;
    writeln!(out, "Scheduled appointment {appointment_id}")?;

    let record_cmd = RegisterMedicalRecordCommand {
        appointment_id,
        weight: 15.2,
        height: 0.95,
        symptoms: Some("Fever and cough for two days".into()),
        clinical_notes: Some("Mild upper respiratory infection".into()),
        prescriptions: vec![PrescriptionItem {
            medication_id: 1,
            dosage: "10mg/kg".into(),
            administration: "oral, every 6h".into(),
            duration: "3 days".into(),
        }],
        exam_ids: vec![1],
    };
    let record_id = services.medical_records.register(record_cmd.clone())?;
    writeln!(out, "Registered medical record {record_id}")?;

    if let Some(record) = services
        .medical_records
        .history_for_patient(patient_id)?
        .into_iter()
        .find(|r| r.id() == record_id)
    {
        writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
        writeln!(out, "BMI category: {}", record.classify_bmi())?;
    }

    match services.medical_records.register(record_cmd) {
        Ok(id) => writeln!(out, "Unexpected second record {id}")?,
        Err(e) => writeln!(out, "Second registration rejected: {e}")?,
    }

    let payment = services.payments.process(ProcessPaymentCommand {
        appointment_id,
        amount: None,
        card: CardDetails {
            number: card_number.into(),
            holder_name: "Maria Souza".into(),
            expiry: "12/29".into(),
            cvv: "123".into(),
        },
    });
    match payment {
        Ok(result) => writeln!(
            out,
            "Payment {}: {} ({})",
            result.payment_id, result.status, result.message
        )?,
        Err(e) => writeln!(out, "Payment rejected: {e}")?,
    }

    let history = services.appointments.patient_history(patient_id)?;
    for visit in &history.appointments {
        writeln!(
            out,
            "{} {} with {} ({}): {}",
            history.patient_name,
            visit.scheduled_at,
            visit.doctor_name,
            visit.specialty,
            visit.status
        )?;
    }

    Ok(())
}
