//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::options::{
    DEFAULT_ABBR_LENGTH, DEFAULT_HASH_LENGTH, DEFAULT_RELEASE, MAX_ABBR_LENGTH, MAX_HASH_LENGTH,
    MIN_ABBR_LENGTH, MIN_HASH_LENGTH, OptionSettings,
};
use crate::app::rules::{CustomRule, PresetRule, RuleSet};
use crate::app::scanner::DEFAULT_MARKER_ATTRIBUTE;
use crate::domain::model::{CaseMode, ReleaseEntry};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".classtrace/config.toml";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub releases: Releases,
    #[serde(default)]
    pub marker: Marker,
    #[serde(default)]
    pub rules: Rules,
}

/// Generator settings. Unset values resolve to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Options {
    #[serde(default)]
    pub project_prefix: Option<String>,
    #[serde(default)]
    pub path_hash_length: Option<usize>,
    #[serde(default)]
    pub dom_hash_length: Option<usize>,
    #[serde(default)]
    pub abbr_length: Option<usize>,
    #[serde(default)]
    pub reversed_name_case: Option<String>,
}

impl Options {
    pub fn project_prefix(&self) -> &str {
        self.project_prefix.as_deref().unwrap_or_default()
    }

    pub fn path_hash_length(&self) -> usize {
        self.path_hash_length.unwrap_or(DEFAULT_HASH_LENGTH)
    }

    pub fn dom_hash_length(&self) -> usize {
        self.dom_hash_length.unwrap_or(DEFAULT_HASH_LENGTH)
    }

    pub fn abbr_length(&self) -> usize {
        self.abbr_length.unwrap_or(DEFAULT_ABBR_LENGTH)
    }

    /// Parsed case mode. Unrecognised values keep the name as written.
    pub fn reversed_name_case(&self) -> CaseMode {
        let Some(mode) = self.reversed_name_case.as_deref() else {
            return CaseMode::default();
        };
        mode.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to preserved case");
            CaseMode::Preserve
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Releases {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub entries: Vec<ReleaseEntry>,
}

impl Releases {
    /// Release name used when no entry is active.
    pub fn default_name(&self) -> &str {
        self.default.as_deref().unwrap_or(DEFAULT_RELEASE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    attribute: Option<String>,
}

impl Marker {
    fn default_enabled() -> bool {
        false
    }

    fn default_attribute() -> &'static str {
        DEFAULT_MARKER_ATTRIBUTE
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or_else(Self::default_enabled)
    }

    pub fn attribute(&self) -> String {
        self.attribute
            .clone()
            .unwrap_or_else(|| Self::default_attribute().to_owned())
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            enabled: Some(Self::default_enabled()),
            attribute: Some(Self::default_attribute().to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rules {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub custom: Vec<CustomRule>,
}

impl Rules {
    /// Id of the rule used when the caller names none.
    pub fn default_rule(&self) -> &str {
        self.default
            .as_deref()
            .unwrap_or_else(|| PresetRule::Alpha.id())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    project_prefix: Option<String>,
    rule: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            project_prefix: env::var("CLASSTRACE_PROJECT_PREFIX").ok(),
            rule: env::var("CLASSTRACE_RULE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(project_prefix: &str, rule: &str) -> Self {
        Self {
            project_prefix: Some(project_prefix.to_owned()),
            rule: Some(rule.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, an optional
    /// explicit file, and env overrides.
    pub fn load(workspace_root: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path(workspace_root)?;
        Self::load_with_layers(global, workspace, explicit.map(Path::to_path_buf), env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        explicit: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        // An explicitly requested file must exist.
        if let Some(explicit_path) = explicit {
            layers.push(Self::from_file(&explicit_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            options: merge_options(self.options, other.options),
            releases: merge_releases(self.releases, other.releases),
            marker: merge_marker(self.marker, other.marker),
            rules: merge_rules(self.rules, other.rules),
        }
    }

    /// Snapshot of the values every option generator reads, clamped to supported ranges.
    pub fn generation_settings(&self) -> OptionSettings {
        OptionSettings {
            project_prefix: self.options.project_prefix().to_owned(),
            path_hash_length: clamp_setting(
                "path_hash_length",
                self.options.path_hash_length(),
                MIN_HASH_LENGTH,
                MAX_HASH_LENGTH,
            ),
            dom_hash_length: clamp_setting(
                "dom_hash_length",
                self.options.dom_hash_length(),
                MIN_HASH_LENGTH,
                MAX_HASH_LENGTH,
            ),
            abbr_length: clamp_setting(
                "abbr_length",
                self.options.abbr_length(),
                MIN_ABBR_LENGTH,
                MAX_ABBR_LENGTH,
            ),
            reversed_name_case: self.options.reversed_name_case(),
            releases: self.releases.entries.clone(),
            default_release: self.releases.default_name().to_owned(),
            ..OptionSettings::default()
        }
    }

    /// Presets plus the configured custom rules.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(self.rules.custom.clone())
    }
}

fn clamp_setting(name: &str, value: usize, min: usize, max: usize) -> usize {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::warn!(setting = name, value, clamped, "setting out of range");
    }
    clamped
}

fn merge_options(base: Options, overlay: Options) -> Options {
    Options {
        project_prefix: overlay.project_prefix.or(base.project_prefix),
        path_hash_length: overlay.path_hash_length.or(base.path_hash_length),
        dom_hash_length: overlay.dom_hash_length.or(base.dom_hash_length),
        abbr_length: overlay.abbr_length.or(base.abbr_length),
        reversed_name_case: overlay.reversed_name_case.or(base.reversed_name_case),
    }
}

fn merge_releases(base: Releases, overlay: Releases) -> Releases {
    let mut entries = base.entries;
    for entry in overlay.entries {
        match entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    Releases {
        default: overlay.default.or(base.default),
        entries,
    }
}

fn merge_marker(mut base: Marker, overlay: Marker) -> Marker {
    if let Some(value) = overlay.enabled {
        base.enabled = Some(value);
    }
    if let Some(value) = overlay.attribute {
        base.attribute = Some(value);
    }
    base
}

fn merge_rules(base: Rules, overlay: Rules) -> Rules {
    let mut custom = base.custom;
    for rule in overlay.custom {
        match custom.iter_mut().find(|existing| existing.id == rule.id) {
            Some(existing) => *existing = rule,
            None => custom.push(rule),
        }
    }

    Rules {
        default: overlay.default.or(base.default),
        custom,
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("classtrace/config.toml"))
}

fn workspace_config_path(workspace_root: Option<&Path>) -> Result<Option<PathBuf>> {
    let root = match workspace_root {
        Some(root) => root.to_path_buf(),
        None => {
            let cwd = env::current_dir()?;
            find_repo_root(&cwd).unwrap_or(cwd)
        }
    };
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(prefix) = env.project_prefix {
        config.options.project_prefix = Some(prefix);
    }
    if let Some(rule) = env.rule {
        config.rules.default = Some(rule);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.options.path_hash_length(), 8);
        assert_eq!(config.options.reversed_name_case(), CaseMode::Lowercase);
        assert_eq!(config.releases.default_name(), "stable");
        assert_eq!(config.rules.default_rule(), "ruleAlpha");
        assert!(!config.marker.enabled());
        assert_eq!(config.marker.attribute(), "data-class-origin");
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[options]
project_prefix = "acme"
path_hash_length = 12
[releases]
entries = [
  { name = "r1", expiry = "2025-01-01" },
  { name = "r2", expiry = "2025-03-01" },
]
[[rules.custom]]
id = "mine"
name = "Mine"
options = ["projectPrefix"]
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".classtrace"))?;
        fs::write(
            workspace_dir.join(".classtrace/config.toml"),
            r#"
[options]
abbr_length = 4
[releases]
default = "edge"
entries = [{ name = "r2", expiry = "2025-04-01" }]
[marker]
enabled = true
[[rules.custom]]
id = "mine"
name = "Mine, again"
options = ["domHash"]
separator = "_"
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".classtrace/config.toml")),
            None,
            EnvOverrides::default(),
        )?;

        assert_eq!(config.options.project_prefix(), "acme");
        assert_eq!(config.options.path_hash_length(), 12);
        assert_eq!(config.options.abbr_length(), 4);
        assert_eq!(config.releases.default_name(), "edge");
        assert_eq!(
            config.releases.entries,
            vec![
                ReleaseEntry::new("r1", "2025-01-01"),
                ReleaseEntry::new("r2", "2025-04-01"),
            ]
        );
        assert!(config.marker.enabled());
        assert_eq!(config.marker.attribute(), "data-class-origin");
        assert_eq!(config.rules.custom.len(), 1);
        assert_eq!(config.rules.custom[0].name, "Mine, again");
        assert_eq!(config.rules.custom[0].separator, "_");

        Ok(())
    }

    #[test]
    fn workspace_can_reset_values_to_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[options]
project_prefix = "acme"
path_hash_length = 12
reversed_name_case = "uppercase"
[releases]
default = "edge"
[rules]
default = "ruleGamma"
"#,
        )?;
        let workspace = temp.path().join("workspace.toml");
        fs::write(
            &workspace,
            r#"
[options]
project_prefix = ""
path_hash_length = 8
reversed_name_case = "lowercase"
[releases]
default = "stable"
[rules]
default = "ruleAlpha"
"#,
        )?;

        let config =
            Config::load_with_layers(Some(global), Some(workspace), None, EnvOverrides::default())?;

        assert_eq!(config.options.project_prefix(), "");
        assert_eq!(config.options.path_hash_length(), 8);
        assert_eq!(config.options.reversed_name_case(), CaseMode::Lowercase);
        assert_eq!(config.releases.default_name(), "stable");
        assert_eq!(config.rules.default_rule(), "ruleAlpha");

        let settings = config.generation_settings();
        assert_eq!(settings.project_prefix, "");
        assert_eq!(settings.path_hash_length, 8);
        Ok(())
    }

    #[test]
    fn unset_values_keep_the_lower_layer() -> Result<()> {
        let base = Config::from_str("[options]\npath_hash_length = 12\n")?;
        let overlay = Config::from_str("[options]\nabbr_length = 5\n")?;
        let merged = base.merge(overlay);
        assert_eq!(merged.options.path_hash_length(), 12);
        assert_eq!(merged.options.abbr_length(), 5);
        assert_eq!(merged.options.dom_hash_length(), 8);
        Ok(())
    }

    #[test]
    fn explicit_file_must_exist() {
        let result = Config::load_with_layers(
            None,
            None,
            Some(PathBuf::from("/definitely/missing/classtrace.toml")),
            EnvOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("Env Prefix", "ruleGamma");
        let config = Config::load_with_layers(None, None, None, overrides)?;
        assert_eq!(config.options.project_prefix(), "Env Prefix");
        assert_eq!(config.rules.default_rule(), "ruleGamma");
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn generation_settings_clamp_ranges() -> Result<()> {
        let config = Config::from_str(
            r#"
[options]
path_hash_length = 2
dom_hash_length = 64
abbr_length = 0
reversed_name_case = "sideways"
"#,
        )?;
        let settings = config.generation_settings();
        assert_eq!(settings.path_hash_length, 4);
        assert_eq!(settings.dom_hash_length, 32);
        assert_eq!(settings.abbr_length, 1);
        assert_eq!(settings.reversed_name_case, CaseMode::Preserve);
        Ok(())
    }

    #[test]
    fn rule_set_exposes_custom_rules() -> Result<()> {
        let config = Config::from_str(
            r#"
[rules]
custom = [{ id = "short", name = "Short", options = ["pathHash"], separator = "-" }]
"#,
        )?;
        let rules = config.rule_set();
        assert_eq!(rules.custom().len(), 1);
        let rule = rules.find("short")?;
        assert_eq!(rule.separator, "-");
        Ok(())
    }
}
