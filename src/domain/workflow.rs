use serde::{Deserialize, Serialize};

/// Transformation run state machine.
///
/// State transitions:
/// - Idle -> Validating -> Uploading (start, after validation passes)
/// - Uploading -> Transcribing -> Analyzing (progress labels around the
///   submit call; no separate network calls correspond to these)
/// - Analyzing -> Generating (submit resolved with a result handle)
/// - Generating -> Ready (result bytes fetched and stored)
/// - Uploading/Transcribing/Analyzing/Generating -> Failed (either call
///   failed)
/// - Ready/Failed -> Idle (clear, or superseded by the next start)
///
/// Note: Transcribing and Analyzing communicate expected sub-phases of one
/// backend operation to the user; the service performs them behind a single
/// submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    /// No run active; ready to accept a submission.
    Idle,
    /// Submission accepted, request assembled.
    Validating,
    /// Sending the audio payload to the service.
    Uploading,
    /// Service is transcribing the audio (observational).
    Transcribing,
    /// Service is analyzing the transcription (observational).
    Analyzing,
    /// Fetching the generated result.
    Generating,
    /// Result stored and auditable.
    Ready,
    /// A service call failed; see the recorded message.
    Failed,
}

impl WorkflowState {
    /// User-facing label for the in-flight stages.
    #[must_use]
    pub fn stage_label(&self) -> Option<&'static str> {
        match self {
            WorkflowState::Uploading => Some("Uploading audio..."),
            WorkflowState::Transcribing => Some("Transcribing to MIDI..."),
            WorkflowState::Analyzing => Some("Analyzing with AI..."),
            WorkflowState::Generating => Some("Generating new audio..."),
            WorkflowState::Idle
            | WorkflowState::Validating
            | WorkflowState::Ready
            | WorkflowState::Failed => None,
        }
    }

    /// States during which the busy flag is held and a second `start` is
    /// rejected.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            WorkflowState::Validating
                | WorkflowState::Uploading
                | WorkflowState::Transcribing
                | WorkflowState::Analyzing
                | WorkflowState::Generating
        )
    }

    /// Terminal until the next explicit `start` or `clear`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Ready | WorkflowState::Failed)
    }

    /// States from which a service failure may be recorded.
    #[must_use]
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            WorkflowState::Uploading
                | WorkflowState::Transcribing
                | WorkflowState::Analyzing
                | WorkflowState::Generating
        )
    }
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Idle
    }
}

/// Events emitted by the workflow controller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEvent {
    /// Run state changed.
    StateChanged {
        from: WorkflowState,
        to: WorkflowState,
    },
    /// A run failed with a user-facing message.
    Failed { message: String },
    /// A run completed and its output is available.
    OutputReady { filename: String, size_bytes: usize },
}

/// Point-in-time view of the workflow, for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    pub stage_label: Option<&'static str>,
    pub busy: bool,
    pub error: Option<String>,
    pub has_output: bool,
}
