//! Scheduling, cancellation and listing of appointments, and a patient's visit history.

use super::at_boundary;
use crate::constants::APPOINTMENT_SLOT_MINUTES;
use crate::model::{
    Appointment, AppointmentKind, AppointmentStatus, Doctor, MeetingRequest, Patient,
    VideoConference,
};
use crate::ports::{
    AppointmentRepository, DoctorRepository, IdGenerator, PatientRepository,
    VideoConferenceProvider,
};
use crate::{ClinicError, ClinicResult, Id};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScheduleAppointmentCommand {
    pub patient_id: Id,
    pub doctor_id: Id,
    pub scheduled_at: NaiveDateTime,
    pub new_patient: bool,
    pub kind: AppointmentKind,
}

/// One line of a patient's visit history.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub appointment_id: Id,
    pub scheduled_at: NaiveDateTime,
    pub doctor_name: String,
    pub specialty: String,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
    /// Set once the appointment has been realized.
    pub medical_record_id: Option<Id>,
    pub meeting_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientHistory {
    pub patient_id: Id,
    pub patient_name: String,
    pub appointments: Vec<AppointmentSummary>,
}

#[derive(Clone)]
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    patients: Arc<dyn PatientRepository>,
    doctors: Arc<dyn DoctorRepository>,
    video: Arc<dyn VideoConferenceProvider>,
    ids: Arc<dyn IdGenerator>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        patients: Arc<dyn PatientRepository>,
        doctors: Arc<dyn DoctorRepository>,
        video: Arc<dyn VideoConferenceProvider>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            appointments,
            patients,
            doctors,
            video,
            ids,
        }
    }

    /// Schedules an appointment relative to the local wall clock.
    pub fn schedule(&self, cmd: ScheduleAppointmentCommand) -> ClinicResult<Id> {
        self.schedule_as_of(cmd, Local::now().naive_local())
    }

    /// Schedules an appointment, treating `now` as the current time.
    ///
    /// Online appointments get a meeting from the video-conference provider.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the patient or doctor does not exist.
    /// - `Validation` if `scheduled_at` is before `now` or too far out to reason about.
    /// - `Conflict` if the doctor has another scheduled appointment less than one slot away.
    /// - `BusinessRule` if the video-conference provider fails.
    pub fn schedule_as_of(
        &self,
        cmd: ScheduleAppointmentCommand,
        now: NaiveDateTime,
    ) -> ClinicResult<Id> {
        tracing::info!(
            patient_id = cmd.patient_id,
            doctor_id = cmd.doctor_id,
            kind = ?cmd.kind,
            "scheduling appointment"
        );
        at_boundary("failed to schedule appointment", self.try_schedule(cmd, now))
    }

    fn try_schedule(&self, cmd: ScheduleAppointmentCommand, now: NaiveDateTime) -> ClinicResult<Id> {
        let patient = self
            .patients
            .find_by_id(cmd.patient_id)?
            .ok_or_else(|| ClinicError::not_found("patient", cmd.patient_id))?;

        let doctor = self
            .doctors
            .find_by_id(cmd.doctor_id)?
            .ok_or_else(|| ClinicError::not_found("doctor", cmd.doctor_id))?;

        if cmd.scheduled_at < now {
            return Err(ClinicError::Validation(
                "appointment date and time must be in the future".into(),
            ));
        }

        if self.has_conflict(doctor.id, cmd.scheduled_at)? {
            return Err(ClinicError::Conflict(format!(
                "doctor {} already has an appointment around {}",
                doctor.id, cmd.scheduled_at
            )));
        }

        let id = self.ids.generate_id();

        let appointment = match cmd.kind {
            AppointmentKind::InPerson => {
                Appointment::new(id, patient, doctor, cmd.scheduled_at, cmd.new_patient)
            }
            AppointmentKind::Online => {
                let meeting = self.create_meeting(id, &patient, &doctor, cmd.scheduled_at)?;
                // Online visits are follow-ups; first visits happen in person.
                Appointment::new(id, patient, doctor, cmd.scheduled_at, false)
                    .with_kind(AppointmentKind::Online)
                    .with_video_conference(meeting)
            }
        };
        self.appointments.save(&appointment)?;

        tracing::info!(appointment_id = id, "appointment scheduled");
        Ok(id)
    }

    fn create_meeting(
        &self,
        appointment_id: Id,
        patient: &Patient,
        doctor: &Doctor,
        starts_at: NaiveDateTime,
    ) -> ClinicResult<VideoConference> {
        let request = MeetingRequest {
            appointment_id,
            title: format!("Online consultation - {}", patient.child_name()),
            description: format!("Specialty: {}", doctor.specialty),
            starts_at,
        };
        let meeting = self.video.create_meeting(&request)?;

        tracing::info!(
            appointment_id,
            provider = self.video.name(),
            meeting_id = meeting.meeting_id(),
            "video meeting created"
        );
        Ok(meeting)
    }

    /// A doctor is busy if another scheduled appointment starts less than one slot away.
    fn has_conflict(&self, doctor_id: Id, at: NaiveDateTime) -> ClinicResult<bool> {
        let slot = Duration::minutes(APPOINTMENT_SLOT_MINUTES);
        let (Some(from), Some(to)) = (at.checked_sub_signed(slot), at.checked_add_signed(slot))
        else {
            return Err(ClinicError::Validation(format!(
                "appointment time {at} is out of range"
            )));
        };

        let nearby = self.appointments.find_by_doctor_between(doctor_id, from, to)?;

        Ok(nearby.iter().any(|a| {
            a.status() == AppointmentStatus::Scheduled && (a.scheduled_at() - at).abs() < slot
        }))
    }

    /// Cancels an appointment and, for online appointments, its video meeting.
    ///
    /// The meeting is released after the cancellation is stored; a provider failure at that
    /// point is logged and does not undo the cancellation.
    ///
    /// # Errors
    ///
    /// `NotFound` if the appointment does not exist, `InvalidState` if it was realized.
    pub fn cancel(&self, appointment_id: Id) -> ClinicResult<()> {
        tracing::info!(appointment_id, "cancelling appointment");
        at_boundary("failed to cancel appointment", self.try_cancel(appointment_id))
    }

    fn try_cancel(&self, appointment_id: Id) -> ClinicResult<()> {
        let mut appointment = self
            .appointments
            .find_by_id(appointment_id)?
            .ok_or_else(|| ClinicError::not_found("appointment", appointment_id))?;

        let was_scheduled = appointment.status() == AppointmentStatus::Scheduled;
        appointment.cancel()?;
        self.appointments.save(&appointment)?;

        if let (true, Some(meeting)) = (was_scheduled, appointment.video_conference()) {
            self.release_meeting(appointment_id, meeting);
        }
        Ok(())
    }

    fn release_meeting(&self, appointment_id: Id, meeting: &VideoConference) {
        match self.video.cancel_meeting(meeting.meeting_id()) {
            Ok(()) => tracing::info!(
                appointment_id,
                meeting_id = meeting.meeting_id(),
                "video meeting cancelled"
            ),
            Err(err) => tracing::warn!(
                appointment_id,
                meeting_id = meeting.meeting_id(),
                error = %err,
                "could not cancel video meeting"
            ),
        }
    }

    /// Appointments on `date`, ordered by time.
    pub fn list_for_day(&self, date: NaiveDate) -> ClinicResult<Vec<Appointment>> {
        at_boundary(
            "failed to list appointments",
            self.appointments.find_by_date(date).map_err(Into::into),
        )
    }

    /// Every appointment of a patient with its doctor, status and linked medical record.
    ///
    /// Doctor details come from the doctor repository; an appointment whose doctor is no
    /// longer stored falls back to the copy taken when it was scheduled.
    ///
    /// # Errors
    ///
    /// `NotFound` if the patient does not exist.
    pub fn patient_history(&self, patient_id: Id) -> ClinicResult<PatientHistory> {
        tracing::info!(patient_id, "loading patient history");
        at_boundary(
            "failed to load patient history",
            self.try_patient_history(patient_id),
        )
    }

    fn try_patient_history(&self, patient_id: Id) -> ClinicResult<PatientHistory> {
        let patient = self
            .patients
            .find_by_id(patient_id)?
            .ok_or_else(|| ClinicError::not_found("patient", patient_id))?;

        let appointments = self
            .appointments
            .find_by_patient(patient_id)?
            .into_iter()
            .map(|a| self.summarize(&a))
            .collect::<ClinicResult<Vec<_>>>()?;

        tracing::debug!(patient_id, count = appointments.len(), "patient history loaded");
        Ok(PatientHistory {
            patient_id,
            patient_name: patient.child_name().to_string(),
            appointments,
        })
    }

    fn summarize(&self, appointment: &Appointment) -> ClinicResult<AppointmentSummary> {
        let doctor = self
            .doctors
            .find_by_id(appointment.doctor().id)?
            .unwrap_or_else(|| appointment.doctor().clone());

        Ok(AppointmentSummary {
            appointment_id: appointment.id(),
            scheduled_at: appointment.scheduled_at(),
            doctor_name: doctor.name.into_inner(),
            specialty: doctor.specialty.into_inner(),
            kind: appointment.kind(),
            status: appointment.status(),
            medical_record_id: appointment.medical_record_id(),
            meeting_link: appointment
                .video_conference()
                .map(|m| m.link().to_string()),
        })
    }
}
