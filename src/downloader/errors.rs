// Error types for the download core

use thiserror::Error;

/// Failures at the external tool boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Binary could not be located or started
    #[error("{0} not found")]
    ToolMissing(String),

    /// Tool ran but exited unsuccessfully
    #[error("{tool} exited with {}: {stderr}", exit_label(.exit_code))]
    ProcessFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// Catch-all for anything the extractor reports (network, geo-block,
    /// unsupported URL, no matching format, ...)
    #[error("{message}")]
    ExtractionFailed { message: String },

    /// Local filesystem failure around a download
    #[error("I/O error: {0}")]
    Io(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status code {}", code),
        None => "no status code (terminated by signal)".to_string(),
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Invalid quality/format strings coming from the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown quality '{0}' (expected best, bestaudio or a height like 720p)")]
    Quality(String),

    #[error("unknown format '{0}' (expected MP4, MP3, WEBM, MKV or AVI)")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(GatewayError::ToolMissing("ffmpeg".into()).to_string(), "ffmpeg not found");

        let err = GatewayError::ProcessFailed {
            tool: "ffmpeg".into(),
            exit_code: Some(1),
            stderr: "Connection refused".into(),
        };
        assert_eq!(err.to_string(), "ffmpeg exited with status code 1: Connection refused");

        let err = GatewayError::ExtractionFailed { message: "ERROR: Unsupported URL".into() };
        assert_eq!(err.to_string(), "ERROR: Unsupported URL");
    }
}
