use anyhow::Result;
use console::style;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::cli::OutputFormat;

/// Study sheet the model is asked to produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short summary in Korean
    pub summary: String,

    /// Vocabulary entries (ten requested)
    #[serde(default)]
    pub vocab: Vec<VocabEntry>,

    /// Shadowing passages from easiest to hardest (three requested)
    #[serde(default)]
    pub shadowing: Vec<ShadowingPassage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    pub word: String,
    pub meaning: String,
    pub example: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowingPassage {
    pub level: String,
    pub text: String,
}

/// Render model output in the requested format.
///
/// The JSON is only parsed for display; output that does not match the study-sheet
/// shape is returned unchanged.
pub fn render(raw: &str, format: &OutputFormat, styled: bool) -> String {
    let Ok(result) = serde_json::from_str::<AnalysisResult>(raw) else {
        tracing::debug!("Model output is not a study sheet, printing it raw");
        return raw.to_string();
    };

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&result).unwrap_or_else(|_| raw.to_string()),
        OutputFormat::Text => format_as_text(&result, styled),
    }
}

/// Human-readable study sheet
pub fn format_as_text(result: &AnalysisResult, styled: bool) -> String {
    let heading = |text: &str| {
        if styled {
            style(text).bold().cyan().to_string()
        } else {
            text.to_string()
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", heading("Summary"));
    let _ = writeln!(out, "{}\n", result.summary);

    let _ = writeln!(out, "{}", heading("Vocabulary"));
    for (i, entry) in result.vocab.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {} - {}", i + 1, entry.word, entry.meaning);
        let _ = writeln!(out, "    e.g. {}", entry.example);
    }

    let _ = writeln!(out, "\n{}", heading("Shadowing"));
    for passage in &result.shadowing {
        let _ = writeln!(out, "[{}] {}", passage.level, passage.text);
    }

    out.trim_end().to_string()
}

/// Save rendered output to file
pub async fn save_to_file(raw: &str, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(raw, format, false);
    fs_err::write(path, content)?;
    Ok(())
}

/// Print rendered output to console
pub fn print_to_console(raw: &str, format: &OutputFormat) {
    println!("{}", render(raw, format, true));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"{
        "summary": "영어 공부에 대한 영상이에요.",
        "vocab": [{"word": "shadow", "meaning": "따라 말하다", "example": "Shadow the speaker."}],
        "shadowing": [
            {"level": "초급", "text": "I like tea."},
            {"level": "고급", "text": "Notwithstanding the rain, we went."}
        ]
    }"#;

    #[test]
    fn test_text_rendering() {
        let text = render(SHEET, &OutputFormat::Text, false);
        assert!(text.starts_with("Summary\n영어 공부에 대한 영상이에요."));
        assert!(text.contains(" 1. shadow - 따라 말하다"));
        assert!(text.contains("    e.g. Shadow the speaker."));
        assert!(text.ends_with("[고급] Notwithstanding the rain, we went."));
    }

    #[test]
    fn test_json_rendering_keeps_korean_literal() {
        let json = render(SHEET, &OutputFormat::Json, false);
        assert!(json.contains("영어 공부"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_unparseable_output_is_returned_raw() {
        assert_eq!(render("not json", &OutputFormat::Text, false), "not json");
        assert_eq!(render("{\"other\": 1}", &OutputFormat::Json, false), "{\"other\": 1}");
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.txt");

        save_to_file(SHEET, &path, &OutputFormat::Text).await.unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("Vocabulary"));
    }
}
