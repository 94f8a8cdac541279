use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::domain::{
    DomainError, InputAudioAsset, OutputAudioAsset, TransformationRequest, WorkflowEvent,
    WorkflowSnapshot, WorkflowState,
};
use crate::ports::{PlaybackHost, SubmitRequest, TransformService};

/// Dwell between the transcribe and analyze labels so both are observable
/// while the single submit call is in flight.
const PROGRESS_LABEL_DWELL: Duration = Duration::from_millis(500);

/// The run state machine: validates a submission, drives the service calls
/// in sequence, and tracks progress and failure.
///
/// At most one run is active at a time; the busy flag rejects a second
/// `start` until the current run settles. There are no retries and no
/// cancellation of an in-flight run - a failed run is retried by calling
/// `start` again, which begins fresh from `Idle`.
pub struct WorkflowController {
    service: Arc<dyn TransformService>,
    playback: Arc<dyn PlaybackHost>,
    state: RwLock<WorkflowState>,
    error: RwLock<Option<String>>,
    output: RwLock<Option<OutputAudioAsset>>,
    busy: AtomicBool,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowController {
    pub fn new(service: Arc<dyn TransformService>, playback: Arc<dyn PlaybackHost>) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            service,
            playback,
            state: RwLock::new(WorkflowState::Idle),
            error: RwLock::new(None),
            output: RwLock::new(None),
            busy: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to state-change notifications. Consumers render from
    /// [`snapshot`](Self::snapshot) when notified.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> WorkflowState {
        *self.state.read()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.read().clone()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let state = self.state();
        WorkflowSnapshot {
            state,
            stage_label: state.stage_label(),
            busy: self.is_busy(),
            error: self.error_message(),
            has_output: self.has_output(),
        }
    }

    pub fn has_output(&self) -> bool {
        self.output.read().is_some()
    }

    pub fn output_handle_id(&self) -> Option<u64> {
        self.output.read().as_ref().and_then(OutputAudioAsset::handle_id)
    }

    pub fn output_filename(&self) -> Option<String> {
        self.output.read().as_ref().map(|o| o.filename().to_string())
    }

    pub fn output_bytes(&self) -> Option<Vec<u8>> {
        self.output.read().as_ref().map(|o| o.bytes().to_vec())
    }

    /// Move the output out of the controller (used by the feedback loop).
    pub fn take_output(&self) -> Option<OutputAudioAsset> {
        self.output.write().take()
    }

    /// Run one end-to-end transformation.
    ///
    /// Rejects synchronously, before any network activity and without a
    /// state transition, when no input is staged, the composed prompt is
    /// empty, or a run is already in flight. Service failures settle the run
    /// in `Failed` with a recorded message and are also returned; a prior
    /// output is only replaced on success.
    pub async fn start(
        &self,
        input: Option<&InputAudioAsset>,
        request: &TransformationRequest,
    ) -> Result<(), DomainError> {
        let input = input.ok_or(DomainError::NoInputStaged)?;
        let prompt = request.composed_prompt();
        if prompt.is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(DomainError::RunInProgress);
        }

        *self.error.write() = None;
        // A fresh run supersedes any prior terminal state.
        self.transition(WorkflowState::Idle);
        self.transition(WorkflowState::Validating);
        self.transition(WorkflowState::Uploading);
        info!(
            file = %input.display_name(),
            payload_bytes = input.size_bytes(),
            prompt = %prompt,
            "starting transformation run"
        );

        self.transition(WorkflowState::Transcribing);
        tokio::time::sleep(PROGRESS_LABEL_DWELL).await;
        self.transition(WorkflowState::Analyzing);

        let handle = match self
            .service
            .submit(SubmitRequest {
                payload: input.bytes(),
                file_name: input.display_name(),
                mime_type: input.mime_type(),
                prompt: &prompt,
            })
            .await
        {
            Ok(handle) => handle,
            Err(err) => return self.fail(err),
        };

        self.transition(WorkflowState::Generating);
        let bytes = match self.service.fetch_result(&handle).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(err),
        };

        let playable = match self.playback.load(&bytes) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(error = %err, "result stored but not auditable");
                None
            }
        };
        let output = OutputAudioAsset::new(bytes, playable);
        let filename = output.filename().to_string();
        let size_bytes = output.bytes().len();
        // Replacing the slot drops the prior output and releases its handle.
        *self.output.write() = Some(output);

        self.busy.store(false, Ordering::SeqCst);
        self.transition(WorkflowState::Ready);
        info!(filename = %filename, size_bytes, "transformation complete");
        let _ = self.events.send(WorkflowEvent::OutputReady {
            filename,
            size_bytes,
        });
        Ok(())
    }

    /// Reset to `Idle`, discarding the error and the output (releasing its
    /// playable handle). Does not abort an in-flight network call.
    pub fn clear(&self) {
        *self.error.write() = None;
        *self.output.write() = None;
        self.busy.store(false, Ordering::SeqCst);
        self.transition(WorkflowState::Idle);
        info!("workflow cleared");
    }

    fn transition(&self, to: WorkflowState) {
        let from = {
            let mut state = self.state.write();
            let from = *state;
            if from == to {
                return;
            }
            *state = to;
            from
        };
        debug!(?from, ?to, "workflow state changed");
        let _ = self.events.send(WorkflowEvent::StateChanged { from, to });
    }

    fn fail(&self, err: DomainError) -> Result<(), DomainError> {
        let message = err.to_string();
        error!(error = %message, "transformation run failed");
        *self.error.write() = Some(message.clone());
        self.busy.store(false, Ordering::SeqCst);
        self.transition(WorkflowState::Failed);
        let _ = self.events.send(WorkflowEvent::Failed { message });
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{MockPlaybackHost, MockTransformService};
    use crate::domain::TagSet;

    fn input() -> InputAudioAsset {
        InputAudioAsset::new("take1.wav", "audio/wav", vec![1, 2, 3, 4])
    }

    fn request(text: &str, words: &[&str]) -> TransformationRequest {
        let mut tags = TagSet::new();
        for word in words {
            tags.toggle(word);
        }
        TransformationRequest::new(text, tags)
    }

    fn controller(
        service: Arc<MockTransformService>,
        host: Arc<MockPlaybackHost>,
    ) -> WorkflowController {
        WorkflowController::new(service, host)
    }

    fn drain_states(rx: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<WorkflowState> {
        let mut states = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WorkflowEvent::StateChanged { to, .. } = event {
                states.push(to);
            }
        }
        states
    }

    #[tokio::test]
    async fn test_successful_run_visits_states_in_order() {
        let service = MockTransformService::returning(vec![9, 9, 9]);
        let workflow = controller(service.clone(), MockPlaybackHost::new());
        let mut rx = workflow.subscribe();

        assert_eq!(workflow.state(), WorkflowState::Idle);
        workflow
            .start(Some(&input()), &request("dreamy", &["jazz"]))
            .await
            .unwrap();

        assert_eq!(
            drain_states(&mut rx),
            vec![
                WorkflowState::Validating,
                WorkflowState::Uploading,
                WorkflowState::Transcribing,
                WorkflowState::Analyzing,
                WorkflowState::Generating,
                WorkflowState::Ready,
            ]
        );
        assert!(!workflow.is_busy());
        assert!(workflow.has_output());
        assert_eq!(workflow.output_bytes(), Some(vec![9, 9, 9]));
        assert_eq!(workflow.error_message(), None);

        let submissions = service.submissions.lock().clone();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].file_name, "take1.wav");
        assert_eq!(submissions[0].prompt, "dreamy, jazz");
        assert_eq!(submissions[0].payload_len, 4);
    }

    #[tokio::test]
    async fn test_no_input_rejected_without_transition() {
        let workflow = controller(
            MockTransformService::returning(vec![1]),
            MockPlaybackHost::new(),
        );
        let mut rx = workflow.subscribe();

        let err = workflow
            .start(None, &request("anything", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoInputStaged));
        assert!(err.is_validation());
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert!(!workflow.is_busy());
        assert!(drain_states(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_transition() {
        let service = MockTransformService::returning(vec![1]);
        let workflow = controller(service.clone(), MockPlaybackHost::new());

        let err = workflow
            .start(Some(&input()), &request("   ", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmptyPrompt));
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert!(service.submissions.lock().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_settles_in_failed() {
        let service = MockTransformService::returning(vec![1]);
        service.fail_submit.store(true, Ordering::SeqCst);
        let workflow = controller(service, MockPlaybackHost::new());

        let err = workflow
            .start(Some(&input()), &request("", &["calm"]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Service(_)));
        assert_eq!(workflow.state(), WorkflowState::Failed);
        assert!(!workflow.is_busy());
        assert!(workflow.error_message().is_some());
        assert!(!workflow.has_output());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_output() {
        let service = MockTransformService::returning(vec![7, 7]);
        let workflow = controller(service.clone(), MockPlaybackHost::new());

        workflow
            .start(Some(&input()), &request("first pass", &[]))
            .await
            .unwrap();
        assert_eq!(workflow.output_bytes(), Some(vec![7, 7]));

        service.fail_fetch.store(true, Ordering::SeqCst);
        let err = workflow
            .start(Some(&input()), &request("second pass", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Service(_)));
        assert_eq!(workflow.state(), WorkflowState::Failed);
        assert!(!workflow.is_busy());
        // The earlier output is untouched by the failed run.
        assert_eq!(workflow.output_bytes(), Some(vec![7, 7]));
    }

    #[tokio::test]
    async fn test_second_start_while_busy_rejected() {
        let service = MockTransformService::returning(vec![5]);
        let gate = service.hold_submit();
        let workflow = Arc::new(controller(service, MockPlaybackHost::new()));

        let running = {
            let workflow = Arc::clone(&workflow);
            tokio::spawn(async move {
                workflow
                    .start(Some(&input()), &request("slow", &[]))
                    .await
            })
        };

        // Let the first run reach the held submit call.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(workflow.is_busy());

        let err = workflow
            .start(Some(&input()), &request("eager", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RunInProgress));

        gate.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(workflow.state(), WorkflowState::Ready);
    }

    #[tokio::test]
    async fn test_successor_run_releases_prior_playable_handle() {
        let service = MockTransformService::returning(vec![1, 2]);
        let host = MockPlaybackHost::new();
        let workflow = controller(service, host.clone());

        workflow
            .start(Some(&input()), &request("one", &[]))
            .await
            .unwrap();
        let first = workflow.output_handle_id().unwrap();
        assert!(host.released.lock().is_empty());

        workflow
            .start(Some(&input()), &request("two", &[]))
            .await
            .unwrap();
        assert_eq!(host.released.lock().as_slice(), &[first]);
        assert_ne!(workflow.output_handle_id(), Some(first));
    }

    #[tokio::test]
    async fn test_clear_resets_and_releases() {
        let service = MockTransformService::returning(vec![3]);
        let host = MockPlaybackHost::new();
        let workflow = controller(service, host.clone());

        workflow
            .start(Some(&input()), &request("make it swing", &[]))
            .await
            .unwrap();
        let id = workflow.output_handle_id().unwrap();

        workflow.clear();
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert!(!workflow.has_output());
        assert_eq!(workflow.error_message(), None);
        assert!(!workflow.is_busy());
        assert_eq!(host.released.lock().as_slice(), &[id]);
    }

    #[tokio::test]
    async fn test_undecodable_result_is_stored_without_handle() {
        let service = MockTransformService::returning(vec![0]);
        let host = MockPlaybackHost::new();
        host.fail_load.store(true, Ordering::SeqCst);
        let workflow = controller(service, host);

        workflow
            .start(Some(&input()), &request("brighter", &[]))
            .await
            .unwrap();
        assert_eq!(workflow.state(), WorkflowState::Ready);
        assert!(workflow.has_output());
        assert_eq!(workflow.output_handle_id(), None);
    }
}
