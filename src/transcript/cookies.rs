//! Netscape-format cookie files (the `cookies.txt` browsers and yt-dlp export).

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::Result;

/// Return the first candidate cookie file that exists
pub fn resolve_cookie_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|path| path.is_file()).cloned();

    match &found {
        Some(path) => tracing::debug!("Using cookie file: {}", path.display()),
        None => tracing::debug!("No cookie file found, fetching subtitles unauthenticated"),
    }

    found
}

/// Build a `Cookie` header value from the entries of `path` that apply to `domain`
pub fn cookie_header(path: &Path, domain: &str) -> Result<Option<String>> {
    let content = fs_err::read_to_string(path).context("Failed to read cookie file")?;

    Ok(header_from_netscape(&content, domain))
}

fn header_from_netscape(content: &str, domain: &str) -> Option<String> {
    let pairs: Vec<String> = content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let line = match line.strip_prefix("#HttpOnly_") {
                Some(rest) => rest,
                None if line.starts_with('#') => return None,
                None => line,
            };

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 {
                return None;
            }

            let cookie_domain = fields[0].trim_start_matches('.');
            let applies = domain == cookie_domain || domain.ends_with(&format!(".{}", cookie_domain));
            applies.then(|| format!("{}={}", fields[5], fields[6]))
        })
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
