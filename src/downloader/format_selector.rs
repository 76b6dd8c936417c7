// FormatSelector - yt-dlp format expression for a quality/container pair
//
// Precedence:
// 1. MP3 container or audio-only quality -> best audio, MP3 output
// 2. "best"                              -> best video + best audio
// 3. height bound H                      -> best video <= H + best audio
//
// Audio-only intent wins over the container the user picked.

use serde::{Deserialize, Serialize};

use super::models::{ContainerFormat, QualitySpec};

/// Selector handed to the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSelector {
    /// yt-dlp `-f` expression
    pub spec: String,

    /// yt-dlp `--merge-output-format` value
    pub merge_output_format: String,
}

impl FormatSelector {
    pub fn build(quality: QualitySpec, format: ContainerFormat) -> Self {
        if format.is_audio() || quality == QualitySpec::AudioOnly {
            return Self {
                spec: "bestaudio/best".to_string(),
                merge_output_format: ContainerFormat::Mp3.extension().to_string(),
            };
        }

        let spec = match quality {
            QualitySpec::MaxHeight(h) => {
                format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]")
            }
            _ => "bestvideo+bestaudio/best".to_string(),
        };

        Self {
            spec,
            merge_output_format: format.extension().to_string(),
        }
    }

    /// Whether the selector only fetches audio
    pub fn is_audio_only(&self) -> bool {
        self.merge_output_format == ContainerFormat::Mp3.extension()
    }
}

pub fn build_format_selector(quality: QualitySpec, format: ContainerFormat) -> FormatSelector {
    FormatSelector::build(quality, format)
}
