//! Tube Tutor - turns a YouTube video's subtitles into an English study sheet
//!
//! This library fetches a video's subtitle track, asks a Gemini model for a summary,
//! a vocabulary list and graded shadowing passages, and serves the result over HTTP.

pub mod cli;
pub mod config;
pub mod output;
pub mod server;
pub mod transcript;
pub mod tutor;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use output::AnalysisResult;
pub use transcript::{Cue, TranscriptSource};
pub use tutor::{AnalysisPipeline, LanguageModel};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures an analysis request can end in
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    #[error("Server Error: API Key missing.")]
    MissingApiKey,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("자막을 가져올 수 없습니다. (Cookies required?)")]
    TranscriptUnavailable,

    #[error("{0}")]
    Upstream(String),
}
