use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::Resource;
use crate::error::{GroveError, Result};

pub const STATE_PROVIDER: &str = "state";
pub const PROJECT_PROVIDER: &str = "project";
pub const DYNAMIC_PROVIDER: &str = "dynamic";

const KNOWN_PROVIDERS: [&str; 3] = [STATE_PROVIDER, PROJECT_PROVIDER, DYNAMIC_PROVIDER];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub dynamic: DynamicConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, grove_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("GROVE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(grove_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a complete config from TOML text, applying defaults for
    /// missing sections.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| GroveError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("grove/config.toml"))
    }

    fn load_project(grove_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&grove_root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| GroveError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| GroveError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.view {
            self.view.merge(patch);
        }
        if let Some(patch) = patch.dynamic {
            self.dynamic.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(values) = env_list("GROVE_STORAGE_PROVIDERS") {
            self.storage.providers = merge_unique(values, &[]);
        }
        if let Some(value) = env_string("GROVE_STATE_BACKEND") {
            self.storage.state_backend = parse_state_backend(&value)?;
        }
        if let Some(value) = env_string("GROVE_PROJECT_FILE") {
            self.storage.project_file = PathBuf::from(value);
        }
        if let Some(value) = env_string("GROVE_SORT_ORDER") {
            self.view.sort_order = parse_sort_order(&value)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage.providers.is_empty() {
            return Err(GroveError::Config(
                "storage.providers must name at least one provider".to_string(),
            ));
        }
        for provider in &self.storage.providers {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(GroveError::Config(format!(
                    "unknown storage provider {provider} (expected state|project|dynamic)"
                )));
            }
        }
        for rule in &self.dynamic.groups {
            if rule.name.trim().is_empty() || rule.pattern.trim().is_empty() {
                return Err(GroveError::Config(
                    "dynamic groups need a name and a pattern".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Active providers in registration (load) order.
    #[serde(default)]
    pub providers: Vec<String>,
    /// New groups go here unless a provider is named explicitly.
    #[serde(default)]
    pub default_provider: String,
    #[serde(default)]
    pub state_backend: StateBackend,
    /// Project file location, relative to the project root.
    #[serde(default)]
    pub project_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            providers: vec![STATE_PROVIDER.to_string(), PROJECT_PROVIDER.to_string()],
            default_provider: STATE_PROVIDER.to_string(),
            state_backend: StateBackend::Sqlite,
            project_file: PathBuf::from(".grove/groups.json"),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(values) = patch.providers {
            self.providers = merge_unique(values, &[]);
        }
        if let Some(value) = patch.default_provider {
            self.default_provider = value;
        }
        if let Some(value) = patch.state_backend {
            self.state_backend = value;
        }
        if let Some(value) = patch.project_file {
            self.project_file = value;
        }
    }

    #[must_use]
    pub fn is_enabled(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p == provider)
    }

    /// Provider that receives new groups: the configured default when it is
    /// enabled and writable, else the first enabled writable provider.
    #[must_use]
    pub fn default_target(&self) -> Option<&str> {
        if self.default_provider != DYNAMIC_PROVIDER && self.is_enabled(&self.default_provider) {
            return Some(self.default_provider.as_str());
        }
        self.providers
            .iter()
            .map(String::as_str)
            .find(|p| *p != DYNAMIC_PROVIDER)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ViewConfig {
    fn merge(&mut self, patch: ViewPatch) {
        if let Some(value) = patch.sort_order {
            self.sort_order = value;
        }
    }
}

/// Ordering applied to resource listings by presentation collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    FullPath,
    BaseName,
}

impl SortOrder {
    #[must_use]
    pub fn compare(self, a: &Resource, b: &Resource) -> Ordering {
        match self {
            Self::FullPath => a.key().cmp(b.key()),
            Self::BaseName => a
                .base_name()
                .to_lowercase()
                .cmp(&b.base_name().to_lowercase())
                .then_with(|| a.key().cmp(b.key())),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullPath => "full_path",
            Self::BaseName => "base_name",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicConfig {
    #[serde(default)]
    pub groups: Vec<DynamicGroupRule>,
}

impl DynamicConfig {
    fn merge(&mut self, patch: DynamicPatch) {
        if let Some(groups) = patch.groups {
            for rule in groups {
                if let Some(existing) = self.groups.iter_mut().find(|r| r.name == rule.name) {
                    *existing = rule;
                } else {
                    self.groups.push(rule);
                }
            }
        }
    }
}

/// A synthetic group whose members are the paths matching `pattern`,
/// relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGroupRule {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub view: Option<ViewPatch>,
    pub dynamic: Option<DynamicPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub providers: Option<Vec<String>>,
    pub default_provider: Option<String>,
    pub state_backend: Option<StateBackend>,
    pub project_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ViewPatch {
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DynamicPatch {
    pub groups: Option<Vec<DynamicGroupRule>>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

fn parse_sort_order(value: &str) -> Result<SortOrder> {
    match value.to_lowercase().replace('-', "_").as_str() {
        "full_path" | "fullpath" | "path" => Ok(SortOrder::FullPath),
        "base_name" | "basename" | "name" => Ok(SortOrder::BaseName),
        _ => Err(GroveError::Config(format!(
            "invalid sort order {value} (expected full_path|base_name)"
        ))),
    }
}

fn parse_state_backend(value: &str) -> Result<StateBackend> {
    match value.to_lowercase().as_str() {
        "sqlite" => Ok(StateBackend::Sqlite),
        "memory" => Ok(StateBackend::Memory),
        _ => Err(GroveError::Config(format!(
            "invalid state backend {value} (expected sqlite|memory)"
        ))),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
}
