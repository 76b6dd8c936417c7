pub mod downloader;

mod cli;
mod logging;

pub use cli::run;
