pub mod asset;
pub mod config;
pub mod error;
pub mod playback;
pub mod tags;
pub mod workflow;

pub use asset::{InputAudioAsset, OutputAudioAsset, PlayableHandle, OUTPUT_FILENAME, WAV_MIME};
pub use config::AppConfig;
pub use error::DomainError;
pub use playback::{format_time, waveform_bars, PlaybackEvent, PlaybackState, WaveformBar};
pub use tags::{TagCategory, TagSet, TransformationRequest, TAXONOMY};
pub use workflow::{WorkflowEvent, WorkflowSnapshot, WorkflowState};
