use rand::Rng;
use serde::Serialize;

/// Playback position for the output currently under audition.
///
/// Scoped to one playable handle at a time; reset whenever the staged handle
/// changes. Times are in seconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
}

impl PlaybackState {
    pub fn reset(&mut self) {
        *self = PlaybackState::default();
    }

    /// Progress through the track as a percentage, 0 while the duration is
    /// unknown.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.duration > 0.0 {
            self.current_time / self.duration * 100.0
        } else {
            0.0
        }
    }
}

/// Events emitted by the playback host as side effects of real-time
/// playback. These are the only points where playback state changes outside
/// direct user action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PlaybackEvent {
    /// Playback position advanced.
    TimeAdvance { handle: u64, seconds: f64 },
    /// Track duration became known after decode.
    DurationKnown { handle: u64, seconds: f64 },
    /// The track played to its end.
    Ended { handle: u64 },
}

/// Render `seconds` as `m:ss` with zero-padded seconds. Non-finite or
/// negative input renders as `0:00`.
#[must_use]
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// One bar of the decorative waveform display.
#[derive(Debug, Clone, Serialize)]
pub struct WaveformBar {
    /// Height in percent of the display area.
    pub height: f64,
    /// Whether playback progress has reached this bar.
    pub active: bool,
}

/// Decorative waveform for an `count`-bar display, not a spectral analysis.
///
/// Heights follow a sine contour with per-render jitter; the active
/// partition is deterministic for a given progress value, and the active
/// count is non-decreasing as progress grows.
#[must_use]
pub fn waveform_bars(count: usize, progress_percent: f64) -> Vec<WaveformBar> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| WaveformBar {
            height: (i as f64 * 0.3).sin() * 30.0 + rng.gen_range(0.0..20.0) + 20.0,
            active: (i as f64 / count as f64) * 100.0 <= progress_percent,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(59.9), "0:59");
    }

    #[test]
    fn test_progress_percent() {
        let mut state = PlaybackState::default();
        assert_eq!(state.progress_percent(), 0.0);

        state.duration = 120.0;
        state.current_time = 30.0;
        assert!((state.progress_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_waveform_bar_heights_in_range() {
        for bar in waveform_bars(50, 0.0) {
            // sin contour (-30..30) + jitter (0..20) + 20
            assert!(bar.height >= -10.0 && bar.height <= 70.0);
        }
    }

    #[test]
    fn test_waveform_active_count_non_decreasing() {
        let count = 50;
        let mut previous_active = 0;
        for step in 0..=100 {
            let progress = f64::from(step);
            let active = waveform_bars(count, progress)
                .iter()
                .filter(|b| b.active)
                .count();
            assert!(active >= previous_active);
            previous_active = active;
        }
        assert_eq!(previous_active, count);
    }

    #[test]
    fn test_waveform_active_partition_deterministic() {
        let first: Vec<bool> = waveform_bars(50, 42.0).iter().map(|b| b.active).collect();
        let second: Vec<bool> = waveform_bars(50, 42.0).iter().map(|b| b.active).collect();
        assert_eq!(first, second);
    }
}
