use crate::pin::PinGenerator;
use crate::store::InterviewStore;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Textual identifier of the person being interviewed, as stored in `interviews.applicant_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicantId(pub String);

impl ApplicantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated pin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRequest {
    pub organization_id: i64,
    pub applicant_id: ApplicantId,
}

#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub pin: String,
}

pub struct AppState {
    pub store: Arc<dyn InterviewStore>,
    pub pin_generator: PinGenerator,
    /// Deadline for the store work of a single request; `None` waits indefinitely.
    pub store_timeout: Option<Duration>,
}
