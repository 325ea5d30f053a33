mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./vidrelay.toml",
        "./config.toml",
        "~/.config/vidrelay/config.toml",
        "/etc/vidrelay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

/// Fill credentials from the environment when the file leaves them empty.
fn apply_env(config: &mut Config) {
    if config.telegram.bot_token.is_empty() {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            config.telegram.bot_token = token;
        }
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.split.target_max_bytes == 0 {
        anyhow::bail!("split.target_max_bytes cannot be 0");
    }

    if config.tools.timeout_secs == 0 {
        anyhow::bail!("tools.timeout_secs cannot be 0");
    }

    if config.telegram.timeout_secs == 0 {
        anyhow::bail!("telegram.timeout_secs cannot be 0");
    }

    if !config.telegram.api_url.starts_with("http://")
        && !config.telegram.api_url.starts_with("https://")
    {
        anyhow::bail!(
            "telegram.api_url must be an http(s) URL, got '{}'",
            config.telegram.api_url
        );
    }

    if let Some(ref cookies) = config.tools.cookies_file {
        if !cookies.exists() {
            tracing::warn!("Cookies file does not exist: {:?}", cookies);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.split.target_max_bytes, 1_900_000_000);
        assert_eq!(config.split.overlap_seconds, 3);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.links.links_file, Path::new("links.txt"));
        assert!(!config.links.reverse);
    }

    #[test]
    fn zero_target_is_rejected() {
        let mut config = Config::default();
        config.split.target_max_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn non_http_api_url_is_rejected() {
        let mut config = Config::default();
        config.telegram.api_url = "ftp://example.com".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn warnings_flag_missing_destination() {
        let warnings = Config::default().warnings();
        assert!(warnings.iter().any(|w| w.contains("chat_id")));
    }

    #[test]
    fn public_api_is_detected_by_host() {
        let mut config = Config::default();
        assert!(config.telegram.uses_public_api());

        config.telegram.api_url = "https://API.telegram.org/".into();
        assert!(config.telegram.uses_public_api());

        config.telegram.api_url = "http://localhost:8081".into();
        assert!(!config.telegram.uses_public_api());
        assert!(!config.warnings().iter().any(|w| w.contains("50 MB")));
    }
}
