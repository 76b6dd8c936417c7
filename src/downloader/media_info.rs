// Video info parsing from yt-dlp --dump-json output

use std::collections::HashSet;

use super::models::{QualityOption, VideoInfo};

pub const AUDIO_ONLY_LABEL: &str = "Audio Only (MP3)";

/// "m:ss" display string
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One option per distinct video height, highest first, audio last
pub fn extract_quality_options(formats: &[serde_json::Value]) -> Vec<QualityOption> {
    let mut options = Vec::new();
    let mut seen_heights = HashSet::new();

    for f in formats {
        let has_video = f["vcodec"].as_str().map_or(true, |v| v != "none");
        let height = match f["height"].as_u64().and_then(|h| u32::try_from(h).ok()) {
            Some(h) if h > 0 => h,
            _ => continue,
        };
        if !has_video || !seen_heights.insert(height) {
            continue;
        }

        options.push(QualityOption {
            format_id: f["format_id"].as_str().unwrap_or_default().to_string(),
            quality: format!("{}p", height),
            ext: f["ext"].as_str().unwrap_or("mp4").to_string(),
            filesize: f["filesize"].as_u64().or_else(|| f["filesize_approx"].as_u64()),
            height: Some(height),
        });
    }

    options.sort_by(|a, b| b.height.cmp(&a.height));

    options.push(QualityOption {
        format_id: "bestaudio".to_string(),
        quality: AUDIO_ONLY_LABEL.to_string(),
        ext: "mp3".to_string(),
        filesize: None,
        height: None,
    });

    options
}

pub fn parse_video_info(json: &serde_json::Value) -> VideoInfo {
    let duration_seconds = json["duration"].as_f64().unwrap_or(0.0).max(0.0) as u64;
    let formats = json["formats"]
        .as_array()
        .map(|f| extract_quality_options(f))
        .unwrap_or_else(|| extract_quality_options(&[]));

    VideoInfo {
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        duration_seconds,
        duration: format_duration(duration_seconds),
        thumbnail: json["thumbnail"].as_str().unwrap_or_default().to_string(),
        formats,
    }
}
