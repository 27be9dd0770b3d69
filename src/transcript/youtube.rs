use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use super::cookies::cookie_header;
use super::{Cue, Track, TrackKind, TrackList, TrackRequest, TranscriptSource};
use crate::Result;

const CAPTION_FORMAT: &str = "json3";

/// YouTube subtitle source: yt-dlp lists the tracks, reqwest downloads them
pub struct YtDlpSource {
    yt_dlp_path: String,
    client: Client,
}

impl YtDlpSource {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            client: Client::new(),
        }
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, request: &TrackRequest) -> Result<Value> {
        let url = watch_url(&request.video_id);
        tracing::debug!("Listing subtitle tracks for: {}", url);

        let mut command = Command::new(&self.yt_dlp_path);
        command.args(["--dump-json", "--skip-download", "--no-playlist", "--no-warnings"]);
        if let Some(cookies) = &request.cookies {
            command.arg("--cookies").arg(cookies);
        }

        let output = command
            .arg(&url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }
}

#[async_trait]
impl TranscriptSource for YtDlpSource {
    async fn list_tracks(&self, request: &TrackRequest) -> Result<TrackList> {
        let info = self.get_video_info(request).await?;
        Ok(parse_track_list(&request.video_id, &info))
    }

    async fn fetch_cues(&self, request: &TrackRequest, track: &Track) -> Result<Vec<Cue>> {
        let url = with_caption_format(&track.url)?;
        tracing::debug!(
            "Downloading {} subtitles ({:?})",
            track.language_code,
            track.kind
        );

        let mut builder = self.client.get(url);
        if let Some(path) = &request.cookies {
            if let Some(header) = cookie_header(path, "www.youtube.com")? {
                builder = builder.header(COOKIE, header);
            }
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to download subtitles: HTTP {}", response.status());
        }

        let body = response.text().await?;
        parse_json3(&body)
    }
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Canonical watch URL for a video id
fn watch_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/watch?v={}",
        urlencoding::encode(video_id)
    )
}

/// Force the caption URL to return the json3 format
fn with_caption_format(raw: &str) -> Result<String> {
    let mut url = Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid caption URL {}: {}", raw, e))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", CAPTION_FORMAT);

    Ok(url.to_string())
}

/// Build a track list from yt-dlp's `--dump-json` output.
///
/// Manual tracks come from `subtitles`, generated ones from `automatic_captions`.
/// yt-dlp lists every auto-translation of the speech track as a generated language
/// (URL carrying `tlang=`); those are dropped so only real tracks remain. The `-orig`
/// entry (the spoken language) is renamed to its bare code and moved to the front.
pub fn parse_track_list(video_id: &str, info: &Value) -> TrackList {
    let mut tracks = collect_tracks(&info["subtitles"], TrackKind::Manual);

    let mut generated = collect_tracks(&info["automatic_captions"], TrackKind::Generated);
    if let Some(pos) = generated
        .iter()
        .position(|track| track.language_code.ends_with("-orig"))
    {
        let mut original = generated.remove(pos);
        original.language_code = original.language_code.trim_end_matches("-orig").to_string();
        generated.retain(|track| track.language_code != original.language_code);
        generated.insert(0, original);
    }
    tracks.extend(generated);

    TrackList {
        video_id: video_id.to_string(),
        tracks,
    }
}

fn collect_tracks(section: &Value, kind: TrackKind) -> Vec<Track> {
    let Some(languages) = section.as_object() else {
        return Vec::new();
    };

    languages
        .iter()
        .filter(|(language, _)| language.as_str() != "live_chat")
        .filter_map(|(language, formats)| {
            let formats = formats.as_array()?;
            let format = formats
                .iter()
                .find(|format| format["ext"].as_str() == Some(CAPTION_FORMAT))?;
            let url = format["url"].as_str()?;
            if is_translation_url(url) {
                return None;
            }

            Some(Track {
                language_code: language.clone(),
                name: format["name"].as_str().map(|s| s.to_string()),
                kind,
                url: url.to_string(),
                translated_from: None,
            })
        })
        .collect()
}

/// Whether a caption URL asks the platform for a machine translation
fn is_translation_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| url.query_pairs().any(|(key, _)| key == "tlang"))
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<f64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<f64>,
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse YouTube's json3 caption format into cues, skipping events without text
pub fn parse_json3(body: &str) -> Result<Vec<Cue>> {
    let captions: Json3 = serde_json::from_str(body).context("Failed to parse subtitle data")?;

    let cues = captions
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|seg| seg.utf8).collect();
            if text.trim().is_empty() {
                return None;
            }

            Some(Cue {
                text,
                start: event.start_ms.map(|ms| ms / 1000.0),
                duration: event.duration_ms.map(|ms| ms / 1000.0),
            })
        })
        .collect();

    Ok(cues)
}
