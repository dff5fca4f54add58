//! Rules: ordered option sequences joined into one class name.

use serde::{Deserialize, Serialize};

use crate::app::options::{OptionKind, OptionSettings};
use crate::domain::errors::DomainError;
use crate::domain::model::GenerationContext;

pub const DEFAULT_SEPARATOR: &str = "--";

/// Run `options` in order and join the non-empty segments with `separator`.
pub fn compose(
    options: &[OptionKind],
    context: &GenerationContext,
    settings: &OptionSettings,
    separator: &str,
) -> String {
    let segments = options.iter().map(|option| {
        let segment = option.generate(context, settings);
        if segment.is_empty() {
            tracing::debug!(option = %option, "option produced no segment");
        }
        segment
    });
    join_segments(segments, separator)
}

/// Join segments in order, dropping empty ones.
pub fn join_segments<I, S>(segments: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(separator);
        }
        joined.push_str(segment);
    }
    joined
}

/// Built-in rules. Not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresetRule {
    Alpha,
    Beta,
    Gamma,
}

impl PresetRule {
    pub fn all() -> &'static [PresetRule] {
        &[PresetRule::Alpha, PresetRule::Beta, PresetRule::Gamma]
    }

    pub fn id(&self) -> &'static str {
        match self {
            PresetRule::Alpha => "ruleAlpha",
            PresetRule::Beta => "ruleBeta",
            PresetRule::Gamma => "ruleGamma",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PresetRule::Alpha => "Rule Alpha",
            PresetRule::Beta => "Rule Beta",
            PresetRule::Gamma => "Rule Gamma",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetRule::Alpha => "Project Prefix + Abbreviated File Path + Path Hash",
            PresetRule::Beta => "Project Prefix + Abbreviated DOM Position + DOM Hash",
            PresetRule::Gamma => "Project Prefix + Reversed File Name",
        }
    }

    pub fn options(&self) -> &'static [OptionKind] {
        match self {
            PresetRule::Alpha => &[
                OptionKind::ProjectPrefix,
                OptionKind::AbbreviatedFilePath,
                OptionKind::PathHash,
            ],
            PresetRule::Beta => &[
                OptionKind::ProjectPrefix,
                OptionKind::AbbreviatedDomPosition,
                OptionKind::DomHash,
            ],
            PresetRule::Gamma => &[OptionKind::ProjectPrefix, OptionKind::ReversedFileName],
        }
    }

    pub fn from_id(id: &str) -> Option<PresetRule> {
        PresetRule::all()
            .iter()
            .copied()
            .find(|preset| preset.id().eq_ignore_ascii_case(id.trim()))
    }
}

/// User-defined rule as persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: String,
    pub name: String,
    pub options: Vec<String>,
    #[serde(default = "CustomRule::default_separator")]
    pub separator: String,
}

impl CustomRule {
    fn default_separator() -> String {
        DEFAULT_SEPARATOR.to_owned()
    }
}

/// A resolved rule ready to generate class names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub options: Vec<OptionKind>,
    pub separator: String,
    pub preset: bool,
}

impl Rule {
    pub fn from_preset(preset: PresetRule) -> Self {
        Self {
            id: preset.id().to_owned(),
            name: preset.name().to_owned(),
            description: preset.description().to_owned(),
            options: preset.options().to_vec(),
            separator: DEFAULT_SEPARATOR.to_owned(),
            preset: true,
        }
    }

    /// Resolve a custom rule's option ids. Unknown ids and empty option lists are rejected.
    pub fn from_custom(custom: &CustomRule) -> Result<Self, DomainError> {
        let options = custom
            .options
            .iter()
            .map(|id| id.parse::<OptionKind>())
            .collect::<Result<Vec<_>, _>>()?;

        if options.is_empty() {
            return Err(DomainError::EmptyResult {
                rule: custom.id.clone(),
            });
        }

        let description = options
            .iter()
            .map(OptionKind::name)
            .collect::<Vec<_>>()
            .join(" + ");

        Ok(Self {
            id: custom.id.clone(),
            name: custom.name.clone(),
            description,
            options,
            separator: custom.separator.clone(),
            preset: false,
        })
    }

    /// One-off rule built from an explicit option list.
    pub fn ad_hoc(options: Vec<OptionKind>, separator: impl Into<String>) -> Self {
        Self {
            id: "adHoc".to_owned(),
            name: "Ad hoc".to_owned(),
            description: String::new(),
            options,
            separator: separator.into(),
            preset: false,
        }
    }

    pub fn generate(&self, context: &GenerationContext, settings: &OptionSettings) -> String {
        compose(&self.options, context, settings, &self.separator)
    }

    /// Placeholder preview, e.g. `{projectPrefix}--{pathHash}`.
    pub fn pattern(&self) -> String {
        self.options
            .iter()
            .map(|option| format!("{{{}}}", option.id()))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

/// Presets plus the host-supplied custom rules.
#[derive(Debug, Default, Clone)]
pub struct RuleSet {
    custom: Vec<CustomRule>,
}

impl RuleSet {
    pub fn new(custom: Vec<CustomRule>) -> Self {
        Self { custom }
    }

    pub fn custom(&self) -> &[CustomRule] {
        &self.custom
    }

    /// Look up a rule by id. Presets win over custom rules with the same id.
    pub fn find(&self, id: &str) -> Result<Rule, DomainError> {
        if let Some(preset) = PresetRule::from_id(id) {
            return Ok(Rule::from_preset(preset));
        }

        self.custom
            .iter()
            .find(|rule| rule.id == id.trim())
            .ok_or_else(|| DomainError::UnknownRule(id.trim().to_string()))
            .and_then(Rule::from_custom)
    }

    /// All rules in listing order: presets first, then custom rules that resolve.
    pub fn rules(&self) -> Vec<Rule> {
        let presets = PresetRule::all().iter().copied().map(Rule::from_preset);
        let custom = self
            .custom
            .iter()
            .filter_map(|custom| match Rule::from_custom(custom) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    tracing::warn!(rule = %custom.id, error = %err, "skipping invalid custom rule");
                    None
                }
            });
        presets.chain(custom).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use time::macros::date;

    use super::*;

    fn context(relative: &str, text: &str, offset: usize) -> GenerationContext {
        GenerationContext::for_file(
            &Path::new("/site").join(relative),
            Some(Path::new("/site")),
            text,
            offset,
        )
    }

    fn settings(prefix: &str) -> OptionSettings {
        OptionSettings {
            project_prefix: prefix.to_owned(),
            ..OptionSettings::default().with_today(date!(2025 - 06 - 01))
        }
    }

    #[test]
    fn empty_segments_are_dropped_without_double_separators() {
        assert_eq!(join_segments(["abc", "", "def"], "--"), "abc--def");
        assert_eq!(join_segments(["", "", ""], "--"), "");
        assert_eq!(join_segments(["", "x"], "_"), "x");
    }

    #[test]
    fn compose_preserves_option_order() {
        let ctx = context("templates/utility_bill.html", "", 0);
        let forward = compose(
            &[OptionKind::ProjectPrefix, OptionKind::ReversedFileName],
            &ctx,
            &settings("Acme"),
            "__",
        );
        let backward = compose(
            &[OptionKind::ReversedFileName, OptionKind::ProjectPrefix],
            &ctx,
            &settings("Acme"),
            "__",
        );
        assert_eq!(forward, "acme__llib_ytilitu");
        assert_eq!(backward, "llib_ytilitu__acme");
    }

    #[test]
    fn gamma_omits_missing_prefix() {
        let ctx = context("templates/utility_bill.html", "", 0);
        let rule = Rule::from_preset(PresetRule::Gamma);
        assert_eq!(rule.generate(&ctx, &settings("")), "llib_ytilitu");
        assert_eq!(
            rule.generate(&ctx, &settings("Project Sample")),
            "project-sample--llib_ytilitu"
        );
    }

    #[test]
    fn alpha_combines_path_segments_and_hash() {
        let ctx = context("src/templates/client/utility_bill.html", "", 0);
        let rule = Rule::from_preset(PresetRule::Alpha);
        let hash = crate::app::options::truncated_md5("src/templates/client/utility_bill.html", 8);
        assert_eq!(
            rule.generate(&ctx, &settings("project sample")),
            format!("project-sample--tem-cli-uti--{hash}")
        );
    }

    #[test]
    fn beta_reads_dom_position() {
        let text = "<html><body><div><section><header><span>x</span>";
        let ctx = context("index.html", text, text.find("<span").unwrap());
        let rule = Rule::from_preset(PresetRule::Beta);
        let hash = crate::app::options::truncated_md5("html>body>div>section>header>span", 8);
        assert_eq!(rule.generate(&ctx, &settings("")), format!("div-sec-hea-spa--{hash}"));
    }

    #[test]
    fn pattern_lists_placeholders() {
        assert_eq!(
            Rule::from_preset(PresetRule::Gamma).pattern(),
            "{projectPrefix}--{reversedFileName}"
        );
        let ad_hoc = Rule::ad_hoc(vec![OptionKind::DomHash, OptionKind::ReleaseName], "-");
        assert_eq!(ad_hoc.pattern(), "{domHash}-{releaseName}");
    }

    #[test]
    fn custom_rules_resolve_option_ids() {
        let custom = CustomRule {
            id: "rule_1".into(),
            name: "Release first".into(),
            options: vec!["releaseName".into(), "pathHash".into()],
            separator: "_".into(),
        };
        let set = RuleSet::new(vec![custom]);
        let rule = set.find("rule_1").unwrap();

        assert!(!rule.preset);
        assert_eq!(rule.options, vec![OptionKind::ReleaseName, OptionKind::PathHash]);
        assert_eq!(rule.description, "Release Name + Path Hash");

        let ctx = context("a.html", "", 0);
        let hash = crate::app::options::truncated_md5("a.html", 8);
        assert_eq!(rule.generate(&ctx, &settings("")), format!("stable_{hash}"));
    }

    #[test]
    fn invalid_custom_rules_are_reported() {
        let unknown = CustomRule {
            id: "bad".into(),
            name: "Bad".into(),
            options: vec!["projectPrefix".into(), "colour".into()],
            separator: "--".into(),
        };
        let empty = CustomRule {
            id: "empty".into(),
            name: "Empty".into(),
            options: Vec::new(),
            separator: "--".into(),
        };
        let set = RuleSet::new(vec![unknown, empty]);

        assert_eq!(set.find("bad"), Err(DomainError::UnknownOption("colour".into())));
        assert_eq!(
            set.find("empty"),
            Err(DomainError::EmptyResult {
                rule: "empty".into()
            })
        );
        assert_eq!(set.find("nope"), Err(DomainError::UnknownRule("nope".into())));
        assert_eq!(set.rules().len(), 3);
    }

    #[test]
    fn presets_are_found_case_insensitively() {
        let set = RuleSet::default();
        assert_eq!(set.find("RULEBETA").unwrap().id, "ruleBeta");
    }

    #[test]
    fn custom_rule_separator_defaults_when_missing() {
        let rule: CustomRule =
            serde_json::from_str(r#"{"id":"r","name":"R","options":["domHash"]}"#).unwrap();
        assert_eq!(rule.separator, "--");
    }
}
