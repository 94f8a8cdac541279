//! Hand-rolled port fakes shared by the app-layer tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use crate::domain::{DomainError, PlayableHandle, PlaybackEvent};
use crate::ports::{PlaybackHost, ResultHandle, SubmitRequest, TransformService};

#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub file_name: String,
    pub prompt: String,
    pub payload_len: usize,
}

/// Transformation service fake: records submissions, optionally fails either
/// call, optionally holds the submit call until notified.
pub struct MockTransformService {
    result: Vec<u8>,
    pub fail_submit: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub submissions: Mutex<Vec<RecordedSubmission>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockTransformService {
    pub fn returning(result: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            result,
            fail_submit: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            submissions: Mutex::new(Vec::new()),
            hold: Mutex::new(None),
        })
    }

    /// Make `submit` wait on the returned gate before responding.
    pub fn hold_submit(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl TransformService for MockTransformService {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<ResultHandle, DomainError> {
        self.submissions.lock().push(RecordedSubmission {
            file_name: request.file_name.to_string(),
            prompt: request.prompt.to_string(),
            payload_len: request.payload.len(),
        });

        let gate = self.hold.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(DomainError::Service("HTTP 500 for submit".to_string()));
        }
        Ok(ResultHandle::new("out_1.wav"))
    }

    async fn fetch_result(&self, _handle: &ResultHandle) -> Result<Vec<u8>, DomainError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(DomainError::Service("HTTP 404 for download".to_string()));
        }
        Ok(self.result.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Play(u64),
    Pause(u64),
    Seek(u64, Duration),
}

/// Playback host fake: assigns handle ids, records commands and releases,
/// and lets tests emit host events.
pub struct MockPlaybackHost {
    pub commands: Mutex<Vec<HostCommand>>,
    pub released: Arc<Mutex<Vec<u64>>>,
    pub fail_load: AtomicBool,
    pub duration: Mutex<Option<Duration>>,
    events: broadcast::Sender<PlaybackEvent>,
    next_id: AtomicU64,
}

impl MockPlaybackHost {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            commands: Mutex::new(Vec::new()),
            released: Arc::new(Mutex::new(Vec::new())),
            fail_load: AtomicBool::new(false),
            duration: Mutex::new(Some(Duration::from_secs(120))),
            events,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }
}

impl PlaybackHost for MockPlaybackHost {
    fn load(&self, _bytes: &[u8]) -> Result<PlayableHandle, DomainError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(DomainError::Playback("undecodable".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let released = Arc::clone(&self.released);
        Ok(PlayableHandle::new(
            id,
            Arc::new(move |id| released.lock().push(id)),
        ))
    }

    fn play(&self, handle: u64) -> Result<(), DomainError> {
        self.commands.lock().push(HostCommand::Play(handle));
        Ok(())
    }

    fn pause(&self, handle: u64) -> Result<(), DomainError> {
        self.commands.lock().push(HostCommand::Pause(handle));
        Ok(())
    }

    fn seek(&self, handle: u64, position: Duration) -> Result<(), DomainError> {
        self.commands.lock().push(HostCommand::Seek(handle, position));
        Ok(())
    }

    fn duration(&self, _handle: u64) -> Option<Duration> {
        *self.duration.lock()
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}
