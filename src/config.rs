use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    pub user_agent: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://time.com/".into(),
            user_agent: None,
            // 5 MB cap
            max_body_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub anchor_prefix: String,
    pub max_stories: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            anchor_prefix: "<a href=\"https://time.com/".into(),
            max_stories: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listen: String,
    pub upstream: UpstreamConfig,
    pub extract: ExtractConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            upstream: UpstreamConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.upstream.url)
            .with_context(|| format!("invalid upstream url: {}", self.upstream.url))?;
        if url.scheme() != "http" {
            bail!("upstream must be a plain http:// url, got {}", self.upstream.url);
        }
        if url.host_str().is_none() {
            bail!("upstream url has no host: {}", self.upstream.url);
        }
        if self.upstream.max_body_bytes == 0 {
            bail!("upstream.max_body_bytes must be greater than zero");
        }
        if self.extract.anchor_prefix.is_empty() {
            bail!("extract.anchor_prefix must not be empty");
        }
        Ok(())
    }
}

pub fn load(config_override: Option<String>, listen_override: Option<String>) -> Result<RelayConfig> {
    let mut cfg = match config_override {
        Some(path_str) => read(&PathBuf::from(&path_str))?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read(&path)?,
            // Built-in defaults
            _ => RelayConfig::default(),
        },
    };

    if let Some(listen) = listen_override {
        cfg.listen = listen;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn read(path: &PathBuf) -> Result<RelayConfig> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let parsed: RelayConfig = toml::from_str(&txt)
        .with_context(|| format!("failed to parse toml: {}", path.display()))?;
    Ok(parsed)
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("story-relay");
        p.push("config.toml");
        return Some(p);
    }
    if let Ok(home) = env::var("HOME") {
        let mut p = PathBuf::from(home);
        p.push(".config");
        p.push("story-relay");
        p.push("config.toml");
        return Some(p);
    }
    None
}
