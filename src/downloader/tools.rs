// External tool discovery and dependency report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::config::DownloaderConfig;
use super::utils::run_output_with_timeout;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    /// Extractor
    YtDlp,
    /// Muxer
    Ffmpeg,
}

impl ToolType {
    pub const ALL: [ToolType; 2] = [ToolType::YtDlp, ToolType::Ffmpeg];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    /// Argument that makes the tool print its version and exit 0
    pub fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp - video extraction and download",
            ToolType::Ffmpeg => "FFmpeg - stream copy and audio/video merging",
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "pip install -U yt-dlp  (or: brew install yt-dlp / winget install yt-dlp)",
            ToolType::Ffmpeg => "download from https://ffmpeg.org/download.html (or: brew install ffmpeg / winget install ffmpeg)",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find a tool binary: common install locations first, then PATH
pub fn locate(tool: ToolType) -> Option<PathBuf> {
    let binary_name = tool.as_str();

    let common_paths = [
        format!("/opt/homebrew/bin/{}", binary_name), // Homebrew on Apple Silicon
        format!("/usr/local/bin/{}", binary_name),    // Homebrew on Intel Mac
        format!("/usr/bin/{}", binary_name),
    ];

    for path in common_paths {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    which::which(binary_name).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub description: String,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
    pub problem: Option<String>,
}

/// Result of checking every required tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyReport {
    pub tools: Vec<ToolInfo>,
    pub all_ok: bool,
}

impl DependencyReport {
    pub fn missing(&self) -> impl Iterator<Item = &ToolInfo> {
        self.tools.iter().filter(|t| !t.is_available)
    }

    /// Install commands for everything missing
    pub fn installation_commands(&self) -> Vec<String> {
        self.missing()
            .map(|t| format!("{}: {}", t.name, t.tool_type.install_hint()))
            .collect()
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tool in &self.tools {
            if tool.is_available {
                writeln!(
                    f,
                    "[ok]      {:<8} {} ({})",
                    tool.name,
                    tool.version.as_deref().unwrap_or("unknown version"),
                    tool.path.as_deref().unwrap_or("?"),
                )?;
            } else {
                writeln!(
                    f,
                    "[missing] {:<8} {}",
                    tool.name,
                    tool.problem.as_deref().unwrap_or("not found"),
                )?;
            }
        }

        if self.all_ok {
            write!(f, "All required components are available.")
        } else {
            writeln!(f, "\nTo install the missing components:")?;
            for cmd in self.installation_commands() {
                writeln!(f, "  {}", cmd)?;
            }
            Ok(())
        }
    }
}

pub struct ToolManager {
    ytdlp_path: PathBuf,
    ffmpeg_path: PathBuf,
    probe_timeout: Duration,
}

impl ToolManager {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
            probe_timeout: config.probe_timeout,
        }
    }

    pub fn binary(&self, tool: ToolType) -> &Path {
        match tool {
            ToolType::YtDlp => &self.ytdlp_path,
            ToolType::Ffmpeg => &self.ffmpeg_path,
        }
    }

    /// Run the version command. `Err` carries a human-readable reason.
    pub fn get_version(&self, tool: ToolType) -> Result<String, String> {
        let path = self.binary(tool);
        match run_output_with_timeout(path, &[tool.version_arg()], self.probe_timeout) {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a long banner, keep the first line only
                let out = String::from_utf8_lossy(&output.stdout);
                Ok(out.lines().next().unwrap_or_default().trim().to_string())
            }
            Ok(output) => Err(format!("{} did not start correctly ({})", tool, output.status)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(format!("{} was not found ({})", tool, path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                Err(format!("{} did not respond in time", tool))
            }
            Err(e) => Err(format!("error while testing {}: {}", tool, e)),
        }
    }

    pub fn get_tool_info(&self, tool: ToolType) -> ToolInfo {
        let (version, problem) = match self.get_version(tool) {
            Ok(version) => (Some(version), None),
            Err(problem) => {
                tracing::warn!(tool = tool.as_str(), %problem, "tool probe failed");
                (None, Some(problem))
            }
        };

        ToolInfo {
            name: tool.as_str().to_string(),
            tool_type: tool,
            description: tool.description().to_string(),
            is_available: version.is_some(),
            path: version
                .as_ref()
                .map(|_| self.binary(tool).display().to_string()),
            version,
            problem,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        ToolType::ALL.iter().map(|t| self.get_tool_info(*t)).collect()
    }

    pub fn check_all(&self) -> DependencyReport {
        let tools = self.get_all_tools();
        let all_ok = tools.iter().all(|t| t.is_available);
        DependencyReport { tools, all_ok }
    }
}
