use crate::constants::{MEETING_EARLY_JOIN_MINUTES, MEETING_WINDOW_MINUTES};
use crate::error::GatewayError;
use crate::model::{MeetingRequest, VideoConference};
use crate::ports::VideoConferenceProvider;
use chrono::Duration;
use clinica_types::NonEmptyText;

/// Stand-in for a video-conference service.
///
/// Every meeting gets a random UUID as id and `https://fake-meet.com/<id>` as link. The
/// join window opens a few minutes before the appointment and stays open for an hour.
/// Cancelling never fails.
#[derive(Debug, Clone)]
pub struct FakeVideoConferenceProvider {
    name: NonEmptyText,
}

impl FakeVideoConferenceProvider {
    pub fn new(name: NonEmptyText) -> Self {
        Self { name }
    }

    fn malformed(&self, reason: impl Into<String>) -> GatewayError {
        GatewayError::MalformedResponse {
            gateway: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

impl VideoConferenceProvider for FakeVideoConferenceProvider {
    fn create_meeting(&self, request: &MeetingRequest) -> Result<VideoConference, GatewayError> {
        let opens_at = request
            .starts_at
            .checked_sub_signed(Duration::minutes(MEETING_EARLY_JOIN_MINUTES))
            .ok_or_else(|| self.malformed("meeting start out of range"))?;
        let closes_at = opens_at
            .checked_add_signed(Duration::minutes(MEETING_WINDOW_MINUTES))
            .ok_or_else(|| self.malformed("meeting end out of range"))?;

        let meeting_id = uuid::Uuid::new_v4().to_string();
        let link = format!("https://fake-meet.com/{meeting_id}");

        tracing::debug!(
            provider = %self.name,
            appointment_id = request.appointment_id,
            %meeting_id,
            title = %request.title,
            "meeting created"
        );

        VideoConference::new(link, &meeting_id, self.name.as_str(), opens_at, closes_at)
            .map_err(|e| self.malformed(e.to_string()))
    }

    fn cancel_meeting(&self, meeting_id: &str) -> Result<(), GatewayError> {
        tracing::debug!(provider = %self.name, meeting_id, "meeting cancelled");
        Ok(())
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
