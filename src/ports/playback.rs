use std::time::Duration;

use tokio::sync::broadcast;

use crate::domain::{DomainError, PlayableHandle, PlaybackEvent};

/// Port for the host environment's media decode and playback primitives.
///
/// Implementations decode loaded bytes into playable slots addressed by the
/// returned [`PlayableHandle`]; the handle releases its slot on drop.
/// Operations on a released or unknown handle are ignored.
pub trait PlaybackHost: Send + Sync {
    /// Decode `bytes` into a new playable slot, paused at position zero.
    ///
    /// Emits [`PlaybackEvent::DurationKnown`] once the track length is
    /// available.
    fn load(&self, bytes: &[u8]) -> Result<PlayableHandle, DomainError>;

    /// Begin or resume playback of a slot.
    fn play(&self, handle: u64) -> Result<(), DomainError>;

    /// Pause playback of a slot.
    fn pause(&self, handle: u64) -> Result<(), DomainError>;

    /// Move a slot's playback position.
    fn seek(&self, handle: u64, position: Duration) -> Result<(), DomainError>;

    /// Current known duration of a slot, once decode has determined it.
    fn duration(&self, handle: u64) -> Option<Duration>;

    /// Subscribe to playback events (time advance, duration, ended).
    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent>;
}
