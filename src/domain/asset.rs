use std::fmt;
use std::sync::Arc;

/// Media type used for every asset this client stages or produces.
pub const WAV_MIME: &str = "audio/wav";

/// File name given to a finished output asset.
pub const OUTPUT_FILENAME: &str = "composition_output.wav";

/// The audio file currently staged for transformation.
///
/// Exactly one input is staged at a time. Assets are replaced wholesale on a
/// new selection (or by the feedback loop) and never mutated in place.
#[derive(Debug, Clone)]
pub struct InputAudioAsset {
    display_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl InputAudioAsset {
    pub fn new(display_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            display_name: display_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Size in megabytes, for display next to the file name.
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }
}

/// RAII guard over the playback-host decoder slot backing an auditioned
/// output. Dropping the guard releases the slot.
pub struct PlayableHandle {
    id: u64,
    release: Arc<dyn Fn(u64) + Send + Sync>,
}

impl PlayableHandle {
    pub fn new(id: u64, release: Arc<dyn Fn(u64) + Send + Sync>) -> Self {
        Self { id, release }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for PlayableHandle {
    fn drop(&mut self) {
        (self.release)(self.id);
    }
}

impl fmt::Debug for PlayableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayableHandle").field("id", &self.id).finish()
    }
}

/// The result of a completed transformation run.
///
/// Created when a run reaches `Ready`. Superseding or clearing the asset
/// drops its [`PlayableHandle`], which releases the backing decoder slot.
#[derive(Debug)]
pub struct OutputAudioAsset {
    bytes: Vec<u8>,
    playable: Option<PlayableHandle>,
    filename: String,
}

impl OutputAudioAsset {
    pub fn new(bytes: Vec<u8>, playable: Option<PlayableHandle>) -> Self {
        Self {
            bytes,
            playable,
            filename: OUTPUT_FILENAME.to_string(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn handle_id(&self) -> Option<u64> {
        self.playable.as_ref().map(PlayableHandle::id)
    }

    /// Consume the asset, dropping the playable handle and keeping the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
