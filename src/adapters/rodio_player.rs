use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::config::PlaybackConfig;
use crate::domain::{DomainError, PlayableHandle, PlaybackEvent};
use crate::ports::PlaybackHost;

/// Commands sent to the playback thread.
enum PlayerCommand {
    Load {
        id: u64,
        bytes: Vec<u8>,
        reply: Sender<Result<(), DomainError>>,
    },
    Play(u64),
    Pause(u64),
    Seek(u64, Duration),
    QueryDuration(u64, Sender<Option<Duration>>),
    Release(u64),
}

/// One decoded track, paused or playing.
struct Slot {
    sink: Sink,
    duration: Option<Duration>,
    finished: bool,
}

/// Playback host backed by rodio.
///
/// The OS audio stream is not `Send`, so a dedicated thread owns it and all
/// sinks; callers talk to it over a command channel. While any slot is
/// playing the thread emits `TimeAdvance` ticks, and `Ended` once a sink
/// drains.
pub struct RodioPlayer {
    commands: Sender<PlayerCommand>,
    events: broadcast::Sender<PlaybackEvent>,
    next_id: AtomicU64,
}

impl RodioPlayer {
    /// Start the playback thread. Fails if no audio output is available.
    pub fn spawn(config: &PlaybackConfig) -> Result<Self, DomainError> {
        let (commands, command_rx) = mpsc::channel();
        let (events, _) = broadcast::channel(64);
        let (ready_tx, ready_rx) = mpsc::channel();

        let tick = Duration::from_millis(config.tick_interval_ms.max(50));
        let event_tx = events.clone();
        thread::Builder::new()
            .name("retune-playback".to_string())
            .spawn(move || playback_loop(command_rx, event_tx, tick, ready_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(DomainError::Playback(
                    "Playback thread exited during startup".to_string(),
                ))
            }
        }

        info!(tick_ms = tick.as_millis() as u64, "playback host started");
        Ok(Self {
            commands,
            events,
            next_id: AtomicU64::new(1),
        })
    }

    fn send(&self, command: PlayerCommand) -> Result<(), DomainError> {
        self.commands
            .send(command)
            .map_err(|_| DomainError::Playback("Playback thread is gone".to_string()))
    }
}

impl PlaybackHost for RodioPlayer {
    fn load(&self, bytes: &[u8]) -> Result<PlayableHandle, DomainError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(PlayerCommand::Load {
            id,
            bytes: bytes.to_vec(),
            reply: reply_tx,
        })?;
        reply_rx
            .recv()
            .map_err(|_| DomainError::Playback("Playback thread is gone".to_string()))??;

        let commands = self.commands.clone();
        Ok(PlayableHandle::new(
            id,
            Arc::new(move |id| {
                let _ = commands.send(PlayerCommand::Release(id));
            }),
        ))
    }

    fn play(&self, handle: u64) -> Result<(), DomainError> {
        self.send(PlayerCommand::Play(handle))
    }

    fn pause(&self, handle: u64) -> Result<(), DomainError> {
        self.send(PlayerCommand::Pause(handle))
    }

    fn seek(&self, handle: u64, position: Duration) -> Result<(), DomainError> {
        self.send(PlayerCommand::Seek(handle, position))
    }

    fn duration(&self, handle: u64) -> Option<Duration> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(PlayerCommand::QueryDuration(handle, reply_tx)).ok()?;
        reply_rx.recv().ok().flatten()
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

fn playback_loop(
    commands: Receiver<PlayerCommand>,
    events: broadcast::Sender<PlaybackEvent>,
    tick: Duration,
    ready: Sender<Result<(), DomainError>>,
) {
    // The stream must outlive every sink; it lives on this thread until the
    // command channel closes.
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => {
            let _ = ready.send(Ok(()));
            pair
        }
        Err(e) => {
            let _ = ready.send(Err(DomainError::Playback(format!(
                "No audio output available: {}",
                e
            ))));
            return;
        }
    };

    let mut slots: HashMap<u64, Slot> = HashMap::new();

    loop {
        match commands.recv_timeout(tick) {
            Ok(PlayerCommand::Load { id, bytes, reply }) => {
                let result = load_slot(&stream_handle, id, bytes, &events).map(|slot| {
                    slots.insert(id, slot);
                });
                let _ = reply.send(result);
            }
            Ok(PlayerCommand::Play(id)) => {
                if let Some(slot) = slots.get(&id) {
                    slot.sink.play();
                }
            }
            Ok(PlayerCommand::Pause(id)) => {
                if let Some(slot) = slots.get(&id) {
                    slot.sink.pause();
                }
            }
            Ok(PlayerCommand::Seek(id, position)) => {
                if let Some(slot) = slots.get_mut(&id) {
                    match slot.sink.try_seek(position) {
                        Ok(()) => slot.finished = false,
                        Err(e) => warn!(handle = id, error = %e, "seek failed"),
                    }
                }
            }
            Ok(PlayerCommand::QueryDuration(id, reply)) => {
                let _ = reply.send(slots.get(&id).and_then(|slot| slot.duration));
            }
            Ok(PlayerCommand::Release(id)) => {
                if slots.remove(&id).is_some() {
                    debug!(handle = id, "playback slot released");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                for (id, slot) in slots.iter_mut() {
                    if slot.finished {
                        continue;
                    }
                    if slot.sink.empty() {
                        slot.finished = true;
                        let _ = events.send(PlaybackEvent::Ended { handle: *id });
                    } else if !slot.sink.is_paused() {
                        let _ = events.send(PlaybackEvent::TimeAdvance {
                            handle: *id,
                            seconds: slot.sink.get_pos().as_secs_f64(),
                        });
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("playback thread shutting down");
}

fn load_slot(
    stream_handle: &OutputStreamHandle,
    id: u64,
    bytes: Vec<u8>,
    events: &broadcast::Sender<PlaybackEvent>,
) -> Result<Slot, DomainError> {
    let decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| DomainError::Playback(format!("Failed to decode audio: {}", e)))?;

    let duration = decoder.total_duration();
    if let Some(d) = duration {
        let _ = events.send(PlaybackEvent::DurationKnown {
            handle: id,
            seconds: d.as_secs_f64(),
        });
    }

    let sink = Sink::try_new(stream_handle).map_err(|e| DomainError::Playback(e.to_string()))?;
    // Pause before append so the track does not start on load.
    sink.pause();
    sink.append(decoder);

    debug!(handle = id, duration = ?duration, "playback slot loaded");
    Ok(Slot {
        sink,
        duration,
        finished: false,
    })
}
