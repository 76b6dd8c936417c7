// URL classification

use super::models::Strategy;

/// Suffix marking an HLS manifest
const MANIFEST_SUFFIX: &str = ".m3u8";

/// Pick the download strategy for a URL. Never fails.
pub fn classify(url: &str) -> Strategy {
    if url.trim().ends_with(MANIFEST_SUFFIX) {
        Strategy::DirectStreamCopy
    } else {
        Strategy::ExtractorDownload
    }
}
