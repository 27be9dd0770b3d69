/// Extract the video identifier from a YouTube URL.
///
/// Plain substring matching: the text after `v=` up to the next `&`, otherwise the
/// text after `youtu.be/` up to the next `?`. The result is not checked against
/// YouTube's id grammar, so odd URLs that happen to contain a marker yield odd ids.
/// `None` means neither marker is present.
pub fn extract_video_id(url: &str) -> Option<String> {
    if let Some((_, rest)) = url.split_once("v=") {
        let id = rest.split('&').next().unwrap_or_default();
        return Some(id.to_string());
    }

    if let Some((_, rest)) = url.split_once("youtu.be/") {
        let id = rest.split('?').next().unwrap_or_default();
        return Some(id.to_string());
    }

    None
}

/// Keep the first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Turn raw model output into the JSON object text returned to clients.
///
/// Strips a leading ```` ``` ```` / ```` ```json ```` fence and a trailing ```` ``` ````
/// fence, then keeps everything from the first `{` to the last `}`. Output without a
/// brace pair is passed through as-is; nothing here parses the JSON.
pub fn sanitize_model_output(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!(
            "{} - required for listing YouTube subtitle tracks",
            yt_dlp_path
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
