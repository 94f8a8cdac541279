pub mod config_store;
pub mod http_service;
pub mod rodio_player;

pub use config_store::TomlConfigStore;
pub use http_service::HttpTransformService;
pub use rodio_player::RodioPlayer;
