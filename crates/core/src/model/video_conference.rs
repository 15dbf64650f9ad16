//! Video meeting attached to an online appointment.

use crate::{ClinicError, ClinicResult, Id};
use chrono::NaiveDateTime;
use clinica_types::NonEmptyText;
use serde::Serialize;

/// Link and join window of a meeting created by a video-conference provider.
///
/// Two conferences are the same meeting when provider and meeting id match; the link and
/// window are not part of identity.
#[derive(Debug, Clone, Serialize)]
pub struct VideoConference {
    link: NonEmptyText,
    meeting_id: NonEmptyText,
    provider: NonEmptyText,
    opens_at: NaiveDateTime,
    closes_at: NaiveDateTime,
}

impl VideoConference {
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if the link, meeting id or provider is blank, or if
    /// the window opens after it closes.
    pub fn new(
        link: impl AsRef<str>,
        meeting_id: impl AsRef<str>,
        provider: impl AsRef<str>,
        opens_at: NaiveDateTime,
        closes_at: NaiveDateTime,
    ) -> ClinicResult<Self> {
        let link = NonEmptyText::new(link)
            .map_err(|_| ClinicError::Validation("meeting link must not be blank".into()))?;
        let meeting_id = NonEmptyText::new(meeting_id)
            .map_err(|_| ClinicError::Validation("meeting id must not be blank".into()))?;
        let provider = NonEmptyText::new(provider)
            .map_err(|_| ClinicError::Validation("meeting provider must not be blank".into()))?;

        if opens_at > closes_at {
            return Err(ClinicError::Validation(format!(
                "meeting window opens at {opens_at} after it closes at {closes_at}"
            )));
        }

        Ok(Self {
            link,
            meeting_id,
            provider,
            opens_at,
            closes_at,
        })
    }

    pub fn link(&self) -> &str {
        self.link.as_str()
    }

    pub fn meeting_id(&self) -> &str {
        self.meeting_id.as_str()
    }

    pub fn provider(&self) -> &str {
        self.provider.as_str()
    }

    pub fn opens_at(&self) -> NaiveDateTime {
        self.opens_at
    }

    pub fn closes_at(&self) -> NaiveDateTime {
        self.closes_at
    }

    /// True while `at` lies inside the join window, both ends included.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        (self.opens_at..=self.closes_at).contains(&at)
    }
}

impl PartialEq for VideoConference {
    fn eq(&self, other: &Self) -> bool {
        self.meeting_id == other.meeting_id && self.provider == other.provider
    }
}

impl Eq for VideoConference {}

/// What a provider needs to create the meeting of one appointment.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    pub appointment_id: Id,
    pub title: String,
    pub description: String,
    pub starts_at: NaiveDateTime,
}
