// Logging setup for the binary

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "video_downloader_lib=info";
const VERBOSE_DIRECTIVE: &str = "video_downloader_lib=debug";

/// Filter from RUST_LOG, falling back to info (or debug with --verbose)
pub fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Logs go to stderr so they stay out of
/// stdout, which carries results.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
