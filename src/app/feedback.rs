use crate::domain::{InputAudioAsset, OutputAudioAsset, WAV_MIME};

/// Display name given to an output restaged as input.
pub const REUSED_INPUT_NAME: &str = "transformed_audio.wav";

/// Convert a finished output into a fresh input asset so the result can be
/// transformed again. Consumes the output; its playable handle is released
/// here, and the new input is not auditable until it has been transformed.
pub fn reuse_as_input(output: OutputAudioAsset) -> InputAudioAsset {
    InputAudioAsset::new(REUSED_INPUT_NAME, WAV_MIME, output.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayableHandle;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_reuse_carries_bytes_and_fixed_name() {
        let output = OutputAudioAsset::new(vec![10, 20, 30], None);
        let input = reuse_as_input(output);
        assert_eq!(input.bytes(), &[10, 20, 30]);
        assert_eq!(input.display_name(), "transformed_audio.wav");
        assert_eq!(input.mime_type(), "audio/wav");
    }

    #[test]
    fn test_reuse_releases_playable_handle() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&released);
        let handle = PlayableHandle::new(4, Arc::new(move |id| sink.lock().push(id)));

        let output = OutputAudioAsset::new(vec![1], Some(handle));
        let _input = reuse_as_input(output);
        assert_eq!(released.lock().as_slice(), &[4]);
    }
}
