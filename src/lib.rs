#![forbid(unsafe_code)]

//! Retune: client orchestration for natural-language audio transformation.
//!
//! Stage an audio asset, describe the change in free text and/or descriptive
//! tags, submit it to the remote transformation service, audition the
//! result, and optionally feed the result back in as the next input.
//!
//! The crate is laid out hexagonally: `domain` holds pure data and
//! derivations, `ports` the capability traits for the external
//! collaborators (transformation service, playback host, config store),
//! `adapters` their concrete implementations, and `app` the controllers
//! that sequence a run and drive audition.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{AudioPlaybackController, StudioController, WorkflowController};
pub use domain::{
    AppConfig, DomainError, InputAudioAsset, OutputAudioAsset, PlaybackState, TagSet,
    TransformationRequest, WorkflowState,
};
