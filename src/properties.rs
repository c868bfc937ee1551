//! Key/value property lookup with relaxed environment binding.
//!
//! Properties are addressed by dotted, dash-separated names such as
//! `app.kafka.startup.producer.wait-for-ack`. Sources are stacked in a
//! [`LayeredSource`]; the first source that knows a key wins.
//!
//! # Example
//!
//! ```rust
//! use startup_smoke_producer::properties::{EnvSource, LayeredSource, MapSource, PropertySource};
//!
//! let env = EnvSource::from_vars([("APP_TOPIC", "orders.smoke")]);
//! let cli = MapSource::from_pairs([("app.exit-after-send", "false")]);
//! let sources = LayeredSource::new().with(cli).with(env);
//!
//! assert_eq!(sources.get("app.topic").as_deref(), Some("orders.smoke"));
//! assert_eq!(sources.get_bool("app.exit-after-send", true).unwrap(), false);
//! ```

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A read-only view over configuration values.
pub trait PropertySource: Send + Sync {
    /// Short label used in diagnostics.
    fn name(&self) -> &str;

    /// Raw lookup. A key that is present with an empty value returns `Some("")`.
    fn get(&self, key: &str) -> Option<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Boolean lookup using relaxed conversion (`true/false`, `yes/no`,
    /// `on/off`, `1/0`, any case).
    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::Config(format!("{} has invalid boolean value '{}'", key, raw))
            }),
        }
    }

    fn get_u64(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} has invalid numeric value '{}'", key, raw))
            }),
        }
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// In-memory properties, used for command line overrides.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    name: String,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new("map");
        for (key, value) in pairs {
            source.insert(key, value);
        }
        source
    }

    /// Builds a source from `key=value` assignments as given on the command line.
    pub fn from_assignments<I, S>(name: impl Into<String>, assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut source = Self::new(name);
        for assignment in assignments {
            let (key, value) = parse_assignment(assignment.as_ref())?;
            source.insert(key, value);
        }
        Ok(source)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl PropertySource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    let trimmed = assignment.trim().trim_start_matches("--");
    match trimmed.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::Config(format!(
            "expected key=value, got '{}'",
            assignment
        ))),
    }
}

/// Environment variables with relaxed binding.
///
/// `app.kafka.startup.producer.wait-for-ack` is found under its literal name,
/// under `APP_KAFKA_STARTUP_PRODUCER_WAIT_FOR_ACK` and under
/// `APP_KAFKA_STARTUP_PRODUCER_WAITFORACK`.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Environment variable names tried for `key`, in lookup order.
    pub fn candidate_names(key: &str) -> Vec<String> {
        let mut names = vec![key.to_string()];
        let underscored = key.replace(['.', '-'], "_").to_ascii_uppercase();
        let dashless = key.replace('-', "").replace('.', "_").to_ascii_uppercase();
        for name in [underscored, dashless] {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl PropertySource for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        Self::candidate_names(key)
            .into_iter()
            .find_map(|name| self.vars.get(&name).cloned())
    }
}

/// A configuration file (TOML, YAML, JSON or INI) read through the `config`
/// crate. Nested tables are addressed with dotted keys.
pub struct FileSource {
    path: PathBuf,
    name: String,
    settings: config::Config,
}

impl FileSource {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        Ok(Self {
            path: path.to_path_buf(),
            name: format!("file:{}", path.display()),
            settings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PropertySource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.settings
            .get_string(key)
            .or_else(|_| self.settings.get_string(&key.to_ascii_lowercase()))
            .ok()
    }
}

/// Ordered stack of sources. Earlier sources take precedence.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn PropertySource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: PropertySource + 'static>(mut self, source: S) -> Self {
        self.layers.push(Box::new(source));
        self
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name()).collect()
    }
}

impl PropertySource for LayeredSource {
    fn name(&self) -> &str {
        "layered"
    }

    fn get(&self, key: &str) -> Option<String> {
        for layer in &self.layers {
            if let Some(value) = layer.get(key) {
                trace!(key, source = layer.name(), "Resolved property");
                return Some(value);
            }
        }
        None
    }
}
