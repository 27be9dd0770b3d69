use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Subtitle retrieval settings
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// API key read from the environment at load time, never from the file
    #[serde(skip)]
    api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Front-end page served on `GET /` (built-in page if unset)
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini model name
    pub name: String,

    /// Base URL of the Generative Language API
    pub endpoint: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// yt-dlp executable used to list subtitle tracks
    pub yt_dlp_path: String,

    /// Preferred subtitle languages, in order
    pub languages: Vec<String>,

    /// Language to machine-translate into when no preferred track exists
    pub translate_to: String,

    /// Cookie files to try, first existing one wins
    pub cookie_paths: Vec<PathBuf>,

    /// Transcript characters kept for the prompt
    pub max_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5002,
            index_path: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            translate_to: "en".to_string(),
            cookie_paths: vec![
                PathBuf::from("/etc/secrets/cookies.txt"),
                PathBuf::from("cookies.txt"),
            ],
            max_chars: 20_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            transcript: TranscriptConfig::default(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults, then read the API key
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };

        config.api_key = std::env::var(&config.model.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(config)
    }

    /// Parse and validate a config file
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Get configuration file path, if one exists
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("tube-tutor").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            anyhow::bail!("Model name must be configured");
        }

        if self.transcript.languages.is_empty() {
            anyhow::bail!("At least one subtitle language must be configured");
        }

        if self.transcript.max_chars == 0 {
            anyhow::bail!("transcript.max_chars must be greater than zero");
        }

        Ok(())
    }

    /// API key for the language model, if the environment provided one
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Override the API key (used by tests and embedders)
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen: {}:{}", self.server.host, self.server.port);
        match &self.server.index_path {
            Some(path) => println!("  Index Page: {}", path.display()),
            None => println!("  Index Page: built-in"),
        }
        println!("  Model: {}", self.model.name);
        println!("  Endpoint: {}", self.model.endpoint);
        println!(
            "  API Key ({}): {}",
            self.model.api_key_env,
            if self.api_key.is_some() { "set" } else { "not set" }
        );
        println!("  yt-dlp: {}", self.transcript.yt_dlp_path);
        println!("  Languages: {}", self.transcript.languages.join(", "));
        println!("  Translate To: {}", self.transcript.translate_to);
        for path in &self.transcript.cookie_paths {
            println!("  Cookie Candidate: {}", path.display());
        }
        println!("  Max Transcript Chars: {}", self.transcript.max_chars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5002);
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.transcript.languages, vec!["en", "en-US", "en-GB"]);
        assert_eq!(
            config.transcript.cookie_paths,
            vec![
                PathBuf::from("/etc/secrets/cookies.txt"),
                PathBuf::from("cookies.txt")
            ]
        );
        assert_eq!(config.transcript.max_chars, 20_000);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 8080\ntranscript:\n  max_chars: 500").unwrap();

        let config = Config::load_from(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.transcript.max_chars, 500);
        assert_eq!(config.transcript.translate_to, "en");
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key: secret").unwrap();

        let config = Config::load_from(&file.path().to_path_buf()).unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_validate_rejects_empty_languages() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transcript:\n  languages: []").unwrap();

        assert!(Config::load_from(&file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max_chars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transcript:\n  max_chars: 0").unwrap();

        assert!(Config::load_from(&file.path().to_path_buf()).is_err());
    }
}
