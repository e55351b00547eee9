//! Configuration module for Folio
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority, applied by the binary)
//! 2. Environment variables (FOLIO_*)
//! 3. Site config (`<source>/folio.toml`)
//! 4. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, FolioResult};

/// Name of the config file inside the source directory
pub const CONFIG_FILE: &str = "folio.toml";

/// Default permalink pattern (Jekyll's `date` style)
pub const DEFAULT_PERMALINK: &str = "/:categories/:year/:month/:day/:slug.html";

/// Site-wide metadata exposed to layouts as `site`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            base_url: default_base_url(),
        }
    }
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_base_url() -> String {
    "/".to_string()
}

/// Build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory, relative to the source directory
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Content root holding documents, relative to the source directory
    #[serde(default = "default_posts")]
    pub posts: PathBuf,

    /// Layouts directory, relative to the source directory
    #[serde(default = "default_layouts")]
    pub layouts: PathBuf,

    #[serde(default = "default_permalink")]
    pub permalink: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            posts: default_posts(),
            layouts: default_layouts(),
            permalink: default_permalink(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("_site")
}

fn default_posts() -> PathBuf {
    PathBuf::from("_posts")
}

fn default_layouts() -> PathBuf {
    PathBuf::from("_layouts")
}

fn default_permalink() -> String {
    DEFAULT_PERMALINK.to_string()
}

/// Which index pages to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_true")]
    pub home: bool,

    #[serde(default = "default_true")]
    pub categories: bool,

    #[serde(default = "default_true")]
    pub tags: bool,

    /// Layout wrapping index pages; built-in shell when unset
    #[serde(default)]
    pub layout: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            home: true,
            categories: true,
            tags: true,
            layout: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Local preview server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub indexes: IndexConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> FolioResult<Self> {
        load_with_warnings(path).map(|(config, _)| config)
    }

    /// Load `<source>/folio.toml` (defaults when absent) plus env overrides.
    pub fn for_source(source: &Path) -> FolioResult<(Self, Vec<ConfigWarning>)> {
        let path = source.join(CONFIG_FILE);
        let (config, warnings) = if path.is_file() {
            load_with_warnings(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            (Config::default(), Vec::new())
        };
        Ok((with_env_overrides(config), warnings))
    }

    pub fn output_dir(&self, source: &Path) -> PathBuf {
        source.join(&self.build.output)
    }

    pub fn posts_dir(&self, source: &Path) -> PathBuf {
        source.join(&self.build.posts)
    }

    pub fn layouts_dir(&self, source: &Path) -> PathBuf {
        source.join(&self.build.layouts)
    }
}

/// Load configuration and collect non-fatal warnings (e.g. unknown keys).
pub fn load_with_warnings(path: &Path) -> FolioResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path)?;

    let mut unknown_paths: Vec<String> = Vec::new();
    let deserializer = toml::de::Deserializer::new(&content);

    let config: Config = serde_ignored::deserialize(deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| FolioError::Config {
        file: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(&content, &key),
                suggestion: suggest_key(&key),
                key,
                file: path.to_path_buf(),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Apply environment variable overrides (FOLIO_* prefix)
pub fn with_env_overrides(config: Config) -> Config {
    with_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup (the environment in production).
pub fn with_overrides_from(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(output) = lookup("FOLIO_OUTPUT").filter(|v| !v.is_empty()) {
        config.build.output = PathBuf::from(output);
    }

    if let Some(base_url) = lookup("FOLIO_BASE_URL").filter(|v| !v.is_empty()) {
        config.site.base_url = base_url;
    }

    if let Some(permalink) = lookup("FOLIO_PERMALINK").filter(|v| !v.is_empty()) {
        config.build.permalink = permalink;
    }

    if let Some(port) = lookup("FOLIO_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.serve.port = port,
            Err(_) => tracing::warn!(value = %port, "ignoring invalid FOLIO_PORT"),
        }
    }

    config
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains(needle))
        .map(|i| i + 1)
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "site",
        "title",
        "description",
        "base_url",
        "build",
        "output",
        "posts",
        "layouts",
        "permalink",
        "indexes",
        "home",
        "categories",
        "tags",
        "layout",
        "serve",
        "host",
        "port",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            Some((_, best_dist)) if dist >= best_dist => best,
            _ => Some((*candidate, dist)),
        };
    }

    match best {
        Some((candidate, dist)) if dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
