use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub mod gemini;
pub mod prompt;

use crate::config::{Config, TranscriptConfig};
use crate::transcript::cookies::resolve_cookie_file;
use crate::transcript::{assemble_text, fetch_transcript, TrackRequest, TranscriptSource, YtDlpSource};
use crate::utils::{extract_video_id, sanitize_model_output};
use crate::{AnalyzeError, Result};

pub use gemini::GeminiClient;
pub use prompt::build_prompt;

/// A hosted text-generation model
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Return the model's raw text answer to `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Subtitle selection settings used per request
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub languages: Vec<String>,
    pub translate_to: String,
    pub cookie_paths: Vec<PathBuf>,
    pub max_chars: usize,
}

impl From<&TranscriptConfig> for PipelineSettings {
    fn from(config: &TranscriptConfig) -> Self {
        Self {
            languages: config.languages.clone(),
            translate_to: config.translate_to.clone(),
            cookie_paths: config.cookie_paths.clone(),
            max_chars: config.max_chars,
        }
    }
}

/// Video URL in, study-sheet JSON text out
pub struct AnalysisPipeline {
    /// `None` when no API key was configured; every analysis then fails up front
    model: Option<Arc<dyn LanguageModel>>,
    transcripts: Arc<dyn TranscriptSource>,
    settings: PipelineSettings,
}

impl AnalysisPipeline {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        transcripts: Arc<dyn TranscriptSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            model,
            transcripts,
            settings,
        }
    }

    /// Wire the production collaborators from configuration
    pub fn from_config(config: &Config) -> Self {
        let model = config.api_key().map(|key| {
            Arc::new(GeminiClient::new(&config.model, key)) as Arc<dyn LanguageModel>
        });
        if model.is_none() {
            tracing::warn!(
                "{} is not set; /analyze will answer with a configuration error",
                config.model.api_key_env
            );
        }

        Self::new(
            model,
            Arc::new(YtDlpSource::new(config.transcript.yt_dlp_path.clone())),
            PipelineSettings::from(&config.transcript),
        )
    }

    pub fn is_model_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Run one analysis request from URL to sanitized JSON text
    pub async fn analyze(&self, url: &str) -> std::result::Result<String, AnalyzeError> {
        let model = self.model.as_ref().ok_or(AnalyzeError::MissingApiKey)?;

        tracing::info!("Analyzing: {}", url);
        let video_id = extract_video_id(url).ok_or(AnalyzeError::InvalidUrl)?;

        let request = TrackRequest {
            video_id,
            cookies: resolve_cookie_file(&self.settings.cookie_paths),
        };

        let cues = fetch_transcript(
            self.transcripts.as_ref(),
            &request,
            &self.settings.languages,
            &self.settings.translate_to,
        )
        .await
        .map_err(|e| {
            tracing::warn!("Transcript error for {}: {:#}", request.video_id, e);
            AnalyzeError::TranscriptUnavailable
        })?;

        let text = assemble_text(&cues, self.settings.max_chars);
        tracing::debug!("Transcript for {}: {} cues, {} chars", request.video_id, cues.len(), text.chars().count());

        let prompt = build_prompt(&text);
        let raw = model.generate(&prompt).await.map_err(|e| {
            tracing::error!("Error: {:#}", e);
            AnalyzeError::Upstream(format!("{:#}", e))
        })?;

        Ok(sanitize_model_output(&raw))
    }
}
