//! Appointment entity and its status transition table.

use super::{Doctor, Patient, VideoConference};
use crate::{ClinicError, ClinicResult, Id};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Realized,
    Cancelled,
}

/// Events that move an appointment between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentEvent {
    Realize,
    Cancel,
}

impl AppointmentStatus {
    /// Single transition table for the appointment lifecycle.
    ///
    /// `Scheduled` may be realized or cancelled. `Realized` is permanent. Cancelling an
    /// already cancelled appointment leaves it cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidState` for any transition not in the table.
    pub fn apply(self, event: AppointmentEvent) -> ClinicResult<AppointmentStatus> {
        use AppointmentEvent::*;
        use AppointmentStatus::*;

        match (self, event) {
            (Scheduled, Realize) => Ok(Realized),
            (Scheduled | Cancelled, Cancel) => Ok(Cancelled),
            (Realized, Cancel) => Err(ClinicError::InvalidState(
                "a realized appointment cannot be cancelled".into(),
            )),
            (from, Realize) => Err(ClinicError::InvalidState(format!(
                "only scheduled appointments can be realized (current status: {from})"
            ))),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::Realized => "REALIZED",
            AppointmentStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentKind {
    #[default]
    InPerson,
    Online,
}

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    id: Id,
    patient: Patient,
    doctor: Doctor,
    scheduled_at: NaiveDateTime,
    new_patient: bool,
    kind: AppointmentKind,
    status: AppointmentStatus,
    medical_record_id: Option<Id>,
    video_conference: Option<VideoConference>,
}

impl Appointment {
    /// Creates a `Scheduled` appointment with no medical record.
    pub fn new(
        id: Id,
        patient: Patient,
        doctor: Doctor,
        scheduled_at: NaiveDateTime,
        new_patient: bool,
    ) -> Self {
        Self {
            id,
            patient,
            doctor,
            scheduled_at,
            new_patient,
            kind: AppointmentKind::default(),
            status: AppointmentStatus::Scheduled,
            medical_record_id: None,
            video_conference: None,
        }
    }

    pub fn with_kind(mut self, kind: AppointmentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches the meeting an online appointment is held in.
    pub fn with_video_conference(mut self, conference: VideoConference) -> Self {
        self.video_conference = Some(conference);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn doctor(&self) -> &Doctor {
        &self.doctor
    }

    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.scheduled_at
    }

    pub fn is_new_patient(&self) -> bool {
        self.new_patient
    }

    pub fn kind(&self) -> AppointmentKind {
        self.kind
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn medical_record_id(&self) -> Option<Id> {
        self.medical_record_id
    }

    pub fn video_conference(&self) -> Option<&VideoConference> {
        self.video_conference.as_ref()
    }

    /// Marks the appointment as realized and links the medical record it produced.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidState` if the appointment is not `Scheduled`, or if a
    /// medical record is already linked.
    pub fn realize(&mut self, medical_record_id: Id) -> ClinicResult<()> {
        let next = self.status.apply(AppointmentEvent::Realize)?;

        if let Some(existing) = self.medical_record_id {
            return Err(ClinicError::InvalidState(format!(
                "appointment {} already has medical record {existing}",
                self.id
            )));
        }

        self.status = next;
        self.medical_record_id = Some(medical_record_id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ClinicError::InvalidState` if the appointment has been realized.
    pub fn cancel(&mut self) -> ClinicResult<()> {
        self.status = self.status.apply(AppointmentEvent::Cancel)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ana, dr_vilegas};
    use chrono::NaiveDate;

    fn scheduled() -> Appointment {
        let at = NaiveDate::from_ymd_opt(2030, 3, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid date-time");
        Appointment::new(1, ana(), dr_vilegas(), at, true)
    }

    #[test]
    fn test_new_appointment_is_scheduled_without_record() {
        let appt = scheduled();
        assert_eq!(appt.status(), AppointmentStatus::Scheduled);
        assert_eq!(appt.medical_record_id(), None);
        assert_eq!(appt.kind(), AppointmentKind::InPerson);
    }

    #[test]
    fn test_realize_links_record() {
        let mut appt = scheduled();
        appt.realize(42).expect("scheduled appointment can be realized");
        assert_eq!(appt.status(), AppointmentStatus::Realized);
        assert_eq!(appt.medical_record_id(), Some(42));
    }

    #[test]
    fn test_second_realize_is_rejected() {
        let mut appt = scheduled();
        appt.realize(42).expect("first realize");

        let err = appt.realize(43).expect_err("second realize must fail");
        assert!(matches!(err, ClinicError::InvalidState(_)));
        assert_eq!(appt.medical_record_id(), Some(42));
    }

    #[test]
    fn test_realized_appointment_cannot_be_cancelled() {
        let mut appt = scheduled();
        appt.realize(42).expect("realize");

        let err = appt.cancel().expect_err("cancel after realize must fail");
        assert!(matches!(err, ClinicError::InvalidState(_)));
        assert_eq!(appt.status(), AppointmentStatus::Realized);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut appt = scheduled();
        appt.cancel().expect("cancel scheduled");
        appt.cancel().expect("cancel again");
        assert_eq!(appt.status(), AppointmentStatus::Cancelled);
    }

    #[test]
    fn test_cancelled_appointment_cannot_be_realized() {
        let mut appt = scheduled();
        appt.cancel().expect("cancel");

        let err = appt.realize(7).expect_err("realize after cancel must fail");
        assert!(matches!(err, ClinicError::InvalidState(_)));
        assert_eq!(appt.medical_record_id(), None);
    }

    #[test]
    fn test_transition_table_is_exhaustive() {
        use AppointmentEvent::*;
        use AppointmentStatus::*;

        let expected = [
            (Scheduled, Realize, Some(Realized)),
            (Scheduled, Cancel, Some(Cancelled)),
            (Realized, Realize, None),
            (Realized, Cancel, None),
            (Cancelled, Realize, None),
            (Cancelled, Cancel, Some(Cancelled)),
        ];

        for (from, event, to) in expected {
            assert_eq!(from.apply(event).ok(), to, "{from} + {event:?}");
        }
    }
}
