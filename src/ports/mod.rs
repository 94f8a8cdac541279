pub mod config;
pub mod playback;
pub mod transform;

pub use config::ConfigStore;
pub use playback::PlaybackHost;
pub use transform::{ResultHandle, SubmitRequest, TransformService};
