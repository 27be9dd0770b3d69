use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub mod cookies;
pub mod youtube;

use crate::utils::truncate_chars;
use crate::Result;

pub use youtube::YtDlpSource;

/// A single timed caption entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    /// Caption text
    pub text: String,

    /// Start time in seconds
    pub start: Option<f64>,

    /// Duration in seconds
    pub duration: Option<f64>,
}

impl Cue {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            duration: None,
        }
    }
}

/// How a subtitle track was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Uploaded by a person
    Manual,
    /// Speech recognition output
    Generated,
}

/// One subtitle track offered for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub language_code: String,
    pub name: Option<String>,
    pub kind: TrackKind,
    /// Caption download URL
    pub url: String,
    /// Source language when this track is a machine translation
    pub translated_from: Option<String>,
}

impl Track {
    /// Ask the platform to machine-translate this track into `language_code`
    pub fn translate(&self, language_code: &str) -> Result<Track> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| anyhow::anyhow!("Invalid caption URL {}: {}", self.url, e))?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "tlang")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("tlang", language_code);

        Ok(Track {
            language_code: language_code.to_string(),
            name: self.name.clone(),
            kind: self.kind,
            url: url.to_string(),
            translated_from: Some(self.language_code.clone()),
        })
    }
}

/// Every track available for a video, manual tracks first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackList {
    pub video_id: String,
    pub tracks: Vec<Track>,
}

impl TrackList {
    /// First manual track matching one of `languages`, tried in order
    pub fn find_manually_created(&self, languages: &[String]) -> Option<&Track> {
        self.find(languages, TrackKind::Manual)
    }

    /// First generated track matching one of `languages`, tried in order
    pub fn find_generated(&self, languages: &[String]) -> Option<&Track> {
        self.find(languages, TrackKind::Generated)
    }

    /// First track of any language and kind
    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    fn find(&self, languages: &[String], kind: TrackKind) -> Option<&Track> {
        languages.iter().find_map(|lang| {
            self.tracks
                .iter()
                .find(|track| track.kind == kind && &track.language_code == lang)
        })
    }
}

/// What to fetch and how to authenticate
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRequest {
    pub video_id: String,
    /// Netscape cookie file for bot-detection challenges
    pub cookies: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("No subtitle tracks available for video {0}")]
    NoTracks(String),
}

/// Where subtitle tracks come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// List the tracks offered for a video
    async fn list_tracks(&self, request: &TrackRequest) -> Result<TrackList>;

    /// Download the cues of one track
    async fn fetch_cues(&self, request: &TrackRequest, track: &Track) -> Result<Vec<Cue>>;
}

/// Pick a track: manual in a preferred language, then generated in a preferred
/// language, then the first track translated into `translate_to`
pub fn select_track(list: &TrackList, languages: &[String], translate_to: &str) -> Result<Track> {
    if let Some(track) = list.find_manually_created(languages) {
        tracing::debug!("Using manual {} subtitles", track.language_code);
        return Ok(track.clone());
    }

    if let Some(track) = list.find_generated(languages) {
        tracing::debug!("Using generated {} subtitles", track.language_code);
        return Ok(track.clone());
    }

    let first = list
        .first()
        .ok_or_else(|| TranscriptError::NoTracks(list.video_id.clone()))?;
    tracing::debug!(
        "No preferred subtitles, translating {} track to {}",
        first.language_code,
        translate_to
    );
    first.translate(translate_to)
}

/// List, select and download a transcript
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    request: &TrackRequest,
    languages: &[String],
    translate_to: &str,
) -> Result<Vec<Cue>> {
    let list = source.list_tracks(request).await?;
    tracing::debug!("Found {} subtitle tracks for {}", list.tracks.len(), request.video_id);

    let track = select_track(&list, languages, translate_to)?;
    source.fetch_cues(request, &track).await
}

/// Join cue texts with single spaces, keeping order, and cut to `max_chars`
pub fn assemble_text(cues: &[Cue], max_chars: usize) -> String {
    let full_text = cues
        .iter()
        .map(|cue| cue.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&full_text, max_chars).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: TrackKind) -> Track {
        Track {
            language_code: lang.to_string(),
            name: None,
            kind,
            url: format!("https://www.youtube.com/api/timedtext?v=abc&lang={}&fmt=json3", lang),
            translated_from: None,
        }
    }

    fn english() -> Vec<String> {
        vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()]
    }

    #[test]
    fn test_select_prefers_manual_english() {
        let list = TrackList {
            video_id: "abc".to_string(),
            tracks: vec![
                track("fr", TrackKind::Manual),
                track("en-GB", TrackKind::Manual),
                track("en", TrackKind::Generated),
            ],
        };

        let selected = select_track(&list, &english(), "en").unwrap();
        assert_eq!(selected.language_code, "en-GB");
        assert_eq!(selected.kind, TrackKind::Manual);
    }

    #[test]
    fn test_select_respects_language_order() {
        let list = TrackList {
            video_id: "abc".to_string(),
            tracks: vec![track("en-GB", TrackKind::Manual), track("en", TrackKind::Manual)],
        };

        let selected = select_track(&list, &english(), "en").unwrap();
        assert_eq!(selected.language_code, "en");
    }

    #[test]
    fn test_select_falls_back_to_generated() {
        let list = TrackList {
            video_id: "abc".to_string(),
            tracks: vec![track("de", TrackKind::Manual), track("en-US", TrackKind::Generated)],
        };

        let selected = select_track(&list, &english(), "en").unwrap();
        assert_eq!(selected.language_code, "en-US");
        assert_eq!(selected.kind, TrackKind::Generated);
        assert!(selected.translated_from.is_none());
    }

    #[test]
    fn test_select_translates_first_track() {
        let list = TrackList {
            video_id: "abc".to_string(),
            tracks: vec![track("ko", TrackKind::Manual), track("ja", TrackKind::Generated)],
        };

        let selected = select_track(&list, &english(), "en").unwrap();
        assert_eq!(selected.language_code, "en");
        assert_eq!(selected.translated_from.as_deref(), Some("ko"));
        assert!(selected.url.contains("tlang=en"));
        assert!(selected.url.contains("lang=ko"));
    }

    #[test]
    fn test_select_fails_without_tracks() {
        let list = TrackList {
            video_id: "abc".to_string(),
            tracks: vec![],
        };

        let err = select_track(&list, &english(), "en").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_translate_replaces_existing_tlang() {
        let mut original = track("ko", TrackKind::Generated);
        original.url.push_str("&tlang=fr");

        let translated = original.translate("en").unwrap();
        assert!(translated.url.contains("tlang=en"));
        assert!(!translated.url.contains("tlang=fr"));
    }

    #[test]
    fn test_assemble_text_joins_in_order() {
        let cues = vec![Cue::new("Hello"), Cue::new("world")];
        assert_eq!(assemble_text(&cues, 20_000), "Hello world");
    }

    #[test]
    fn test_assemble_text_truncates() {
        let cues = vec![Cue::new("abcdef"), Cue::new("ghij")];
        assert_eq!(assemble_text(&cues, 8), "abcdef g");
        assert_eq!(assemble_text(&[], 8), "");
    }

    #[tokio::test]
    async fn test_fetch_transcript_uses_selected_track() {
        let mut source = MockTranscriptSource::new();
        source.expect_list_tracks().times(1).returning(|request| {
            Ok(TrackList {
                video_id: request.video_id.clone(),
                tracks: vec![track("en", TrackKind::Generated)],
            })
        });
        source
            .expect_fetch_cues()
            .withf(|_, track| track.language_code == "en" && track.kind == TrackKind::Generated)
            .times(1)
            .returning(|_, _| Ok(vec![Cue::new("hi")]));

        let request = TrackRequest {
            video_id: "abc".to_string(),
            cookies: None,
        };
        let cues = fetch_transcript(&source, &request, &english(), "en").await.unwrap();
        assert_eq!(cues, vec![Cue::new("hi")]);
    }

    #[tokio::test]
    async fn test_fetch_transcript_skips_download_without_tracks() {
        let mut source = MockTranscriptSource::new();
        source.expect_list_tracks().returning(|request| {
            Ok(TrackList {
                video_id: request.video_id.clone(),
                tracks: vec![],
            })
        });
        source.expect_fetch_cues().times(0);

        let request = TrackRequest {
            video_id: "abc".to_string(),
            cookies: None,
        };
        assert!(fetch_transcript(&source, &request, &english(), "en").await.is_err());
    }
}
