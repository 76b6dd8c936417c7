// Downloader module - URL classification, file numbering, tool gateway,
// progress normalization and the orchestrator tying them together

pub mod config;
pub mod errors;
pub mod format_selector;
pub mod gateway;
pub mod media_info;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod sequencer;
pub mod strategy;
pub mod tools;
pub mod traits;
pub mod utils;

pub use config::DownloaderConfig;
pub use errors::{GatewayError, ParseError};
pub use format_selector::{build_format_selector, FormatSelector};
pub use gateway::ProcessGateway;
pub use models::{
    ContainerFormat, DownloadRequest, DownloadResult, ProgressEvent, ProgressStatus, QualityOption,
    QualitySpec, Strategy, VideoInfo,
};
pub use orchestrator::Downloader;
pub use progress::{NormalizerState, ProgressNormalizer, RawFields, RawProgress};
pub use sequencer::next_number;
pub use strategy::classify;
pub use tools::{DependencyReport, ToolManager, ToolType};
pub use traits::{ExtractorOptions, ToolGateway};
