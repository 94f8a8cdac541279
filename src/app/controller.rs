use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{HttpTransformService, RodioPlayer, TomlConfigStore};
use crate::app::feedback;
use crate::app::player::AudioPlaybackController;
use crate::app::workflow::WorkflowController;
use crate::domain::{AppConfig, DomainError, InputAudioAsset, TransformationRequest};
use crate::infrastructure::init_logging;
use crate::ports::{ConfigStore, PlaybackHost, TransformService};

/// Application root: boots configuration, logging, and the adapters, owns
/// the staged input, and wires the workflow and playback controllers
/// together.
pub struct StudioController {
    config: RwLock<AppConfig>,
    config_store: Option<Arc<TomlConfigStore>>,
    input: RwLock<Option<Arc<InputAudioAsset>>>,
    workflow: Arc<WorkflowController>,
    player: Arc<AudioPlaybackController>,
    _log_guard: Option<WorkerGuard>,
}

impl StudioController {
    /// Initialize against the real adapters: config store, logging, HTTP
    /// service, and the rodio playback host.
    pub fn new() -> Result<Self, DomainError> {
        let config_store = Arc::new(TomlConfigStore::new()?);
        let config = config_store.load()?;
        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
        )?;

        info!("Retune starting up");

        let service: Arc<dyn TransformService> =
            Arc::new(HttpTransformService::new(&config.service)?);
        let playback: Arc<dyn PlaybackHost> = Arc::new(RodioPlayer::spawn(&config.playback)?);

        let mut controller = Self::with_collaborators(config, service, playback);
        controller.config_store = Some(config_store);
        controller._log_guard = log_guard;
        Ok(controller)
    }

    /// Build a controller around explicit collaborators, without touching
    /// disk or installing a logging subscriber.
    pub fn with_collaborators(
        config: AppConfig,
        service: Arc<dyn TransformService>,
        playback: Arc<dyn PlaybackHost>,
    ) -> Self {
        let workflow = Arc::new(WorkflowController::new(service, Arc::clone(&playback)));
        let player = Arc::new(AudioPlaybackController::new(playback));
        Self {
            config: RwLock::new(config),
            config_store: None,
            input: RwLock::new(None),
            workflow,
            player,
            _log_guard: None,
        }
    }

    /// Forward playback-host events into the playback controller. Call once
    /// from within the runtime.
    pub fn start_playback_pump(&self) -> tokio::task::JoinHandle<()> {
        self.player.spawn_pump()
    }

    pub fn workflow(&self) -> Arc<WorkflowController> {
        Arc::clone(&self.workflow)
    }

    pub fn player(&self) -> Arc<AudioPlaybackController> {
        Arc::clone(&self.player)
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Update the configuration, persisting it when a store is attached.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        if let Some(store) = &self.config_store {
            store.save(&config)?;
        }
        *self.config.write() = config;
        info!("Configuration updated");
        Ok(())
    }

    /// Stage a new input, replacing any previous one wholesale.
    pub fn stage_input(&self, asset: InputAudioAsset) {
        info!(
            file = %asset.display_name(),
            size_bytes = asset.size_bytes(),
            "input staged"
        );
        *self.input.write() = Some(Arc::new(asset));
    }

    /// Stage an input from raw bytes, as handed over by the host
    /// environment's file picker or drop target.
    pub fn stage_input_from_bytes(
        &self,
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) {
        self.stage_input(InputAudioAsset::new(display_name, mime_type, bytes));
    }

    pub fn input(&self) -> Option<Arc<InputAudioAsset>> {
        self.input.read().clone()
    }

    /// Run one transformation of the staged input and, on success, stage the
    /// fresh output for audition.
    pub async fn transform(&self, request: &TransformationRequest) -> Result<(), DomainError> {
        let input = self.input.read().clone();
        self.workflow.start(input.as_deref(), request).await?;
        if let Some(handle) = self.workflow.output_handle_id() {
            self.player.stage(handle);
        }
        Ok(())
    }

    /// Feed the current output back in as the next input. Returns `false`
    /// (no-op) when there is no output to reuse.
    pub fn reuse_output_as_input(&self) -> bool {
        let Some(output) = self.workflow.take_output() else {
            return false;
        };
        self.player.unstage();
        self.workflow.clear();
        let input = feedback::reuse_as_input(output);
        info!(size_bytes = input.size_bytes(), "output restaged as input");
        *self.input.write() = Some(Arc::new(input));
        true
    }

    /// Discard the staged input, the current run, the output, and playback
    /// state.
    pub fn clear(&self) {
        *self.input.write() = None;
        self.player.unstage();
        self.workflow.clear();
        info!("session cleared");
    }

    /// Get the data directory path, when a config store is attached.
    pub fn data_dir(&self) -> Option<String> {
        self.config_store
            .as_ref()
            .map(|s| s.data_dir().to_string_lossy().to_string())
    }

    /// Get the config file path, when a config store is attached.
    pub fn config_path(&self) -> Option<String> {
        self.config_store
            .as_ref()
            .map(|s| s.config_path().to_string_lossy().to_string())
    }
}
