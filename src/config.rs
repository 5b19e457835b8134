use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mirror::RetryPolicy;
use crate::model::Visibility;
use crate::paths::paths;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("ghm/", env!("CARGO_PKG_VERSION"));

/// Raw contents of `config.toml`.
///
/// Every key is optional; anything left out falls back to the built-in default.
///
/// Example TOML:
/// ```toml
/// [host]
/// api_url = "https://github.example.com/api/v3"
///
/// [mirror]
/// hidden_ref_prefix = "refs/pull/"
/// fallback_branches = ["main", "master", "trunk"]
/// settle_delay_secs = 10
/// poll_attempts = 3
/// poll_delay_secs = 5
///
/// [defaults]
/// visibility = "private"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub host: HostSection,
    #[serde(default)]
    pub mirror: MirrorSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostSection {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorSection {
    #[serde(default)]
    pub hidden_ref_prefix: Option<String>,
    #[serde(default)]
    pub fallback_branches: Option<Vec<String>>,
    #[serde(default)]
    pub settle_delay_secs: Option<u64>,
    #[serde(default)]
    pub poll_attempts: Option<u32>,
    #[serde(default)]
    pub poll_delay_secs: Option<u64>,
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Validated settings, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub user_agent: String,
    pub mirror: MirrorSettings,
    pub default_visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub hidden_ref_prefix: String,
    pub fallback_branches: Vec<String>,
    pub settle_delay: Duration,
    pub poll: RetryPolicy,
    /// Parent for the scratch mirror directory; system temp dir when `None`.
    pub work_dir: Option<PathBuf>,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        MirrorSettings {
            hidden_ref_prefix: "refs/pull/".to_string(),
            fallback_branches: vec!["main".to_string(), "master".to_string()],
            settle_delay: Duration::from_secs(10),
            poll: RetryPolicy::new(3, Duration::from_secs(5)),
            work_dir: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            mirror: MirrorSettings::default(),
            default_visibility: Visibility::Private,
        }
    }
}

impl Settings {
    /// Merge a parsed config file over the defaults and validate the result.
    ///
    /// # Errors
    /// - `poll_attempts` is zero.
    /// - `hidden_ref_prefix` is empty or not under `refs/`.
    /// - `api_url` is not an absolute http(s) URL.
    /// - `defaults.visibility` is neither `private` nor `public`.
    pub fn from_file(file: ConfigFile) -> Result<Settings> {
        let mut s = Settings::default();

        if let Some(url) = file.host.api_url {
            s.api_url = url.trim_end_matches('/').to_string();
        }
        let parsed = reqwest::Url::parse(&s.api_url)
            .with_context(|| format!("invalid host.api_url: {}", s.api_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("host.api_url must be http(s): {}", s.api_url);
        }
        if let Some(ua) = file.host.user_agent {
            s.user_agent = ua;
        }

        let m = file.mirror;
        if let Some(prefix) = m.hidden_ref_prefix {
            if !prefix.starts_with("refs/") || prefix == "refs/" {
                bail!("mirror.hidden_ref_prefix must name a namespace under refs/: {prefix:?}");
            }
            s.mirror.hidden_ref_prefix = prefix;
        }
        if let Some(branches) = m.fallback_branches {
            s.mirror.fallback_branches = branches
                .into_iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect();
        }
        if let Some(secs) = m.settle_delay_secs {
            s.mirror.settle_delay = Duration::from_secs(secs);
        }
        let attempts = m.poll_attempts.unwrap_or(s.mirror.poll.max_attempts);
        if attempts == 0 {
            bail!("mirror.poll_attempts must be at least 1");
        }
        let delay = m
            .poll_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(s.mirror.poll.delay);
        s.mirror.poll = RetryPolicy::new(attempts, delay);
        s.mirror.work_dir = m.work_dir;

        if let Some(v) = file.defaults.visibility {
            s.default_visibility = v
                .parse()
                .map_err(|e| anyhow::anyhow!("defaults.visibility: {}", e))?;
        }

        Ok(s)
    }
}

/// Load settings from `explicit` if given, otherwise from the default
/// location under [`crate::paths::ghm_home`].
///
/// # Errors
/// - An explicitly named file that cannot be read.
/// - A file that fails to parse or validate.
///
/// # Notes
/// A missing default file is not an error; built-in defaults are used.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = paths().config;
            if !p.exists() {
                return Ok(Settings::default());
            }
            p
        }
    };
    let txt = fs::read_to_string(&path)
        .with_context(|| format!("config not found: {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Settings::from_file(file)
}
