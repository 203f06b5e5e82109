//! Loader for `jobhawk` configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached: `HAWK__`-prefixed
//! environment variables first, then files and inline YAML snippets (later
//! sources override earlier ones). String values may reference environment
//! variables as `${VAR}` or `$VAR`; they are expanded after merging.
//!
//! Every section has defaults, so a minimal file only names what differs:
//!
//! ```yaml
//! portal: linkedin
//! search:
//!   positions: ["Rust Engineer"]
//!   locations: ["Berlin"]
//! answers:
//!   years of experience: "6"
//! uploads:
//!   resume: "${HOME}/cv.pdf"
//! ```
use config::{Config, ConfigError, Environment, File};
use hawk_common::observability::{LogConfig, LogFormat};
use hawk_common::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HawkConfig {
    /// Registry name of the job portal to drive (e.g. `linkedin`).
    pub portal: String,
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub policy: PolicyConfig,
    /// Question text → canned answer used to fill form fields.
    pub answers: BTreeMap<String, String>,
    /// Upload field label → local file path (resume, cover letter, ...).
    pub uploads: BTreeMap<String, PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for HawkConfig {
    fn default() -> Self {
        Self {
            portal: "linkedin".to_string(),
            search: SearchConfig::default(),
            browser: BrowserConfig::default(),
            policy: PolicyConfig::default(),
            answers: BTreeMap::new(),
            uploads: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HawkConfig {
    /// Reject configurations that cannot drive a single search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portal.trim().is_empty() {
            return Err(ConfigError::Message("`portal` must not be empty".into()));
        }
        if self.search.positions.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Message(
                "`search.positions` needs at least one position".into(),
            ));
        }
        if self.search.max_pages == 0 {
            return Err(ConfigError::Message(
                "`search.max_pages` must be greater than zero".into(),
            ));
        }
        if self.policy.max_form_steps == 0 {
            return Err(ConfigError::Message(
                "`policy.max_form_steps` must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// What to search for and which postings to leave alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub positions: Vec<String>,
    /// An empty list searches without a location filter.
    pub locations: Vec<String>,
    pub remote: bool,
    /// Search radius in miles.
    pub distance: u32,
    pub experience_level: ExperienceLevels,
    pub job_types: JobTypes,
    pub date: DateWindow,
    /// Listing pages visited per (position, location) pair.
    pub max_pages: u32,
    /// Scroll the result list before collecting tiles.
    pub scroll: bool,
    pub company_blacklist: Vec<String>,
    pub title_blacklist: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            locations: Vec::new(),
            remote: false,
            distance: 25,
            experience_level: ExperienceLevels::default(),
            job_types: JobTypes::default(),
            date: DateWindow::AllTime,
            max_pages: 5,
            scroll: true,
            company_blacklist: Vec::new(),
            title_blacklist: Vec::new(),
        }
    }
}

impl SearchConfig {
    /// Every (position, location) pair in declaration order. With no
    /// locations configured each position is paired with an empty location.
    pub fn search_terms(&self) -> Vec<(String, String)> {
        let locations: Vec<String> = if self.locations.is_empty() {
            vec![String::new()]
        } else {
            self.locations.clone()
        };
        self.positions
            .iter()
            .filter(|p| !p.trim().is_empty())
            .flat_map(|p| locations.iter().map(move |l| (p.clone(), l.clone())))
            .collect()
    }
}

/// Seniority filters, in the portal's ordinal order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExperienceLevels {
    pub internship: bool,
    pub entry: bool,
    pub associate: bool,
    pub mid_senior_level: bool,
    pub director: bool,
    pub executive: bool,
}

impl ExperienceLevels {
    /// 1-based ordinals of the selected levels.
    pub fn selected(&self) -> Vec<u8> {
        [
            self.internship,
            self.entry,
            self.associate,
            self.mid_senior_level,
            self.director,
            self.executive,
        ]
        .iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(i, _)| i as u8 + 1)
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobTypes {
    pub full_time: bool,
    pub contract: bool,
    pub part_time: bool,
    pub temporary: bool,
    pub internship: bool,
    pub other: bool,
    pub volunteer: bool,
}

impl JobTypes {
    /// Single-letter codes of the selected job types.
    pub fn selected(&self) -> Vec<char> {
        [
            (self.full_time, 'F'),
            (self.contract, 'C'),
            (self.part_time, 'P'),
            (self.temporary, 'T'),
            (self.internship, 'I'),
            (self.other, 'O'),
            (self.volunteer, 'V'),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, code)| *code)
        .collect()
    }
}

/// How recent a posting must be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    #[default]
    AllTime,
    Month,
    Week,
    #[serde(alias = "24_hours", alias = "24 hours")]
    Day,
}

impl DateWindow {
    /// Maximum posting age in seconds, `None` for no limit.
    pub fn max_age_secs(&self) -> Option<u64> {
        match self {
            DateWindow::AllTime => None,
            DateWindow::Month => Some(2_592_000),
            DateWindow::Week => Some(604_800),
            DateWindow::Day => Some(86_400),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    /// Browser profile holding the logged-in portal session.
    pub profile_dir: Option<PathBuf>,
    /// Upper bound for waiting on a single element.
    pub element_timeout_ms: u64,
    /// Upper bound for a page navigation.
    pub page_load_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            profile_dir: None,
            element_timeout_ms: 10_000,
            page_load_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Configured profile directory, or `<data_local_dir>/jobhawk/chrome_profile`.
    pub fn resolved_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("jobhawk")
                .join("chrome_profile")
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Retries for listing and job page navigation.
    pub navigation: RetryPolicy,
    /// Form steps allowed before an application is abandoned.
    pub max_form_steps: usize,
    /// Listing pages that may fail in a row before the run stops.
    pub max_consecutive_page_failures: usize,
    pub run_timeout_secs: Option<u64>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            navigation: RetryPolicy::default(),
            max_form_steps: 12,
            max_consecutive_page_failures: 3,
            run_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
            emit_stderr: true,
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') || s.starts_with('~') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::full(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct HawkConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HawkConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HawkConfigLoader {
    /// Start with `HAWK__` environment overrides (`HAWK__BROWSER__HEADLESS=true`).
    ///
    /// ```
    /// use hawk_config::HawkConfigLoader;
    ///
    /// let config = HawkConfigLoader::new()
    ///     .with_yaml_str("portal: linkedin\nsearch:\n  positions: [\"Rust Engineer\"]")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.portal, "linkedin");
    /// assert_eq!(config.search.max_pages, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use hawk_config::HawkConfigLoader;
    ///
    /// let config = HawkConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// search:
    ///   positions: ["Backend Engineer"]
    ///   locations: ["Remote", "Lisbon"]
    /// uploads:
    ///   resume: "/srv/cv.pdf"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.search.search_terms().len(), 2);
    /// assert_eq!(config.uploads["resume"].to_str(), Some("/srv/cv.pdf"));
    /// ```
    pub fn load(self) -> Result<HawkConfig, ConfigError> {
        // Added last so `HAWK__*` variables override every file source.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("HAWK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
