use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::{PlaybackEvent, PlaybackState};
use crate::ports::PlaybackHost;

/// Owns playback state for the one output currently under audition and
/// drives the host's play/pause/seek controls.
///
/// Host events for handles other than the staged one are ignored, which
/// stands in for unsubscription when an asset is replaced.
pub struct AudioPlaybackController {
    host: Arc<dyn PlaybackHost>,
    staged: RwLock<Option<u64>>,
    state: RwLock<PlaybackState>,
}

impl AudioPlaybackController {
    pub fn new(host: Arc<dyn PlaybackHost>) -> Self {
        Self {
            host,
            staged: RwLock::new(None),
            state: RwLock::new(PlaybackState::default()),
        }
    }

    /// Audition a freshly loaded handle, resetting position and pulling the
    /// duration the host already knows.
    pub fn stage(&self, handle: u64) {
        let duration = self
            .host
            .duration(handle)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        *self.staged.write() = Some(handle);
        let mut state = self.state.write();
        state.reset();
        state.duration = duration;
        debug!(handle, duration, "output staged for audition");
    }

    /// Stop auditing the current handle. The handle itself is released by
    /// whoever owns the output asset.
    pub fn unstage(&self) {
        let previous = self.staged.write().take();
        if let Some(handle) = previous {
            let _ = self.host.pause(handle);
        }
        self.state.write().reset();
    }

    pub fn staged(&self) -> Option<u64> {
        *self.staged.read()
    }

    pub fn state(&self) -> PlaybackState {
        self.state.read().clone()
    }

    /// Flip between playing and paused. No-op returning `false` when nothing
    /// is staged. Returns whether playback is running afterwards.
    pub fn toggle_play(&self) -> bool {
        let Some(handle) = self.staged() else {
            return false;
        };
        let mut state = self.state.write();
        let result = if state.is_playing {
            self.host.pause(handle)
        } else {
            self.host.play(handle)
        };
        match result {
            Ok(()) => state.is_playing = !state.is_playing,
            Err(e) => warn!(handle, error = %e, "playback toggle failed"),
        }
        state.is_playing
    }

    /// Jump to a fraction of the track, e.g. from a click on the progress
    /// bar. `ratio` is clamped to `[0, 1]`; no-op when nothing is staged.
    pub fn seek(&self, ratio: f64) {
        let Some(handle) = self.staged() else {
            return;
        };
        if !ratio.is_finite() {
            return;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let mut state = self.state.write();
        let target = ratio * state.duration;
        match self.host.seek(handle, Duration::from_secs_f64(target)) {
            Ok(()) => state.current_time = target,
            Err(e) => warn!(handle, error = %e, "seek failed"),
        }
    }

    /// Apply a host event to the playback state. The only mutations outside
    /// direct user action.
    pub fn handle_event(&self, event: &PlaybackEvent) {
        let staged = self.staged();
        let mut state = self.state.write();
        match *event {
            PlaybackEvent::TimeAdvance { handle, seconds } if staged == Some(handle) => {
                state.current_time = seconds;
            }
            PlaybackEvent::DurationKnown { handle, seconds } if staged == Some(handle) => {
                state.duration = seconds;
            }
            PlaybackEvent::Ended { handle } if staged == Some(handle) => {
                state.is_playing = false;
            }
            _ => {}
        }
    }

    /// Forward host events into this controller from a background task.
    pub fn spawn_pump(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut rx = controller.host.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => controller.handle_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "playback events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{HostCommand, MockPlaybackHost};

    fn staged_player(host: &Arc<MockPlaybackHost>) -> AudioPlaybackController {
        let player = AudioPlaybackController::new(host.clone() as Arc<dyn PlaybackHost>);
        player.stage(1);
        player
    }

    #[test]
    fn test_stage_pulls_duration_and_resets() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);
        let state = player.state();
        assert_eq!(state.duration, 120.0);
        assert_eq!(state.current_time, 0.0);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_toggle_play_noop_without_asset() {
        let host = MockPlaybackHost::new();
        let player = AudioPlaybackController::new(host.clone() as Arc<dyn PlaybackHost>);
        assert!(!player.toggle_play());
        assert!(host.commands.lock().is_empty());
    }

    #[test]
    fn test_toggle_play_alternates() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);

        assert!(player.toggle_play());
        assert!(player.state().is_playing);
        assert!(!player.toggle_play());
        assert!(!player.state().is_playing);

        assert_eq!(
            host.commands.lock().as_slice(),
            &[HostCommand::Play(1), HostCommand::Pause(1)]
        );
    }

    #[test]
    fn test_seek_scales_and_clamps() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);

        player.seek(0.5);
        assert_eq!(player.state().current_time, 60.0);

        player.seek(-0.2);
        assert_eq!(player.state().current_time, 0.0);

        player.seek(1.4);
        assert_eq!(player.state().current_time, 120.0);

        assert_eq!(
            host.commands.lock().as_slice(),
            &[
                HostCommand::Seek(1, Duration::from_secs(60)),
                HostCommand::Seek(1, Duration::from_secs(0)),
                HostCommand::Seek(1, Duration::from_secs(120)),
            ]
        );
    }

    #[test]
    fn test_seek_noop_without_asset() {
        let host = MockPlaybackHost::new();
        let player = AudioPlaybackController::new(host.clone() as Arc<dyn PlaybackHost>);
        player.seek(0.5);
        assert!(host.commands.lock().is_empty());
    }

    #[test]
    fn test_events_update_state() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);
        player.toggle_play();

        player.handle_event(&PlaybackEvent::TimeAdvance {
            handle: 1,
            seconds: 42.5,
        });
        assert_eq!(player.state().current_time, 42.5);

        player.handle_event(&PlaybackEvent::DurationKnown {
            handle: 1,
            seconds: 180.0,
        });
        assert_eq!(player.state().duration, 180.0);

        player.handle_event(&PlaybackEvent::Ended { handle: 1 });
        assert!(!player.state().is_playing);
    }

    #[test]
    fn test_events_for_other_handles_ignored() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);

        player.handle_event(&PlaybackEvent::TimeAdvance {
            handle: 99,
            seconds: 10.0,
        });
        assert_eq!(player.state().current_time, 0.0);

        player.handle_event(&PlaybackEvent::DurationKnown {
            handle: 99,
            seconds: 5.0,
        });
        assert_eq!(player.state().duration, 120.0);
    }

    #[test]
    fn test_unstage_pauses_and_resets() {
        let host = MockPlaybackHost::new();
        let player = staged_player(&host);
        player.toggle_play();

        player.unstage();
        assert_eq!(player.staged(), None);
        let state = player.state();
        assert_eq!(state.duration, 0.0);
        assert!(!state.is_playing);
        assert_eq!(
            host.commands.lock().last(),
            Some(&HostCommand::Pause(1))
        );
    }

    #[tokio::test]
    async fn test_pump_forwards_host_events() {
        let host = MockPlaybackHost::new();
        let player = Arc::new(AudioPlaybackController::new(
            host.clone() as Arc<dyn PlaybackHost>
        ));
        player.stage(1);
        let pump = player.spawn_pump();

        host.emit(PlaybackEvent::TimeAdvance {
            handle: 1,
            seconds: 7.0,
        });

        // Give the pump task a chance to run.
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if player.state().current_time == 7.0 {
                break;
            }
        }
        assert_eq!(player.state().current_time, 7.0);
        pump.abort();
    }
}
