//! Option generators: independent producers of one class-name segment each.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::app::release;
use crate::app::scanner::{ancestor_chain_to_string, compute_ancestor_chain};
use crate::domain::errors::DomainError;
use crate::domain::model::{CaseMode, GenerationContext, ReleaseEntry};

pub const DEFAULT_HASH_LENGTH: usize = 8;
pub const MIN_HASH_LENGTH: usize = 4;
pub const MAX_HASH_LENGTH: usize = 32;
pub const DEFAULT_ABBR_LENGTH: usize = 3;
pub const MIN_ABBR_LENGTH: usize = 1;
pub const MAX_ABBR_LENGTH: usize = 10;
pub const PREFIX_MAX_CHARS: usize = 50;
pub const DEFAULT_RELEASE: &str = "stable";

const EXCLUDED_DOM_TAGS: [&str; 5] = ["html", "head", "body", "script", "style"];
const SKIP_ROOT_FOLDERS: [&str; 5] = ["www", "htdocs", "public_html", "src", "app"];

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static INVALID_CLASS_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\-_]").expect("class character pattern is valid"));

/// Configuration values read by the generators for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSettings {
    pub project_prefix: String,
    pub path_hash_length: usize,
    pub dom_hash_length: usize,
    pub abbr_length: usize,
    pub reversed_name_case: CaseMode,
    pub releases: Vec<ReleaseEntry>,
    pub default_release: String,
    /// UTC calendar day used for release expiry checks.
    pub today: Date,
}

impl Default for OptionSettings {
    fn default() -> Self {
        Self {
            project_prefix: String::new(),
            path_hash_length: DEFAULT_HASH_LENGTH,
            dom_hash_length: DEFAULT_HASH_LENGTH,
            abbr_length: DEFAULT_ABBR_LENGTH,
            reversed_name_case: CaseMode::default(),
            releases: Vec::new(),
            default_release: DEFAULT_RELEASE.to_owned(),
            today: OffsetDateTime::now_utc().date(),
        }
    }
}

impl OptionSettings {
    /// Pin the calendar day used by the release option.
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = today;
        self
    }
}

/// The closed set of segment generators, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
    ProjectPrefix,
    PathHash,
    ReversedFileName,
    DomHash,
    AbbreviatedDomPosition,
    AbbreviatedFilePath,
    ReleaseName,
}

impl OptionKind {
    pub fn all() -> &'static [OptionKind] {
        &[
            OptionKind::ProjectPrefix,
            OptionKind::PathHash,
            OptionKind::ReversedFileName,
            OptionKind::DomHash,
            OptionKind::AbbreviatedDomPosition,
            OptionKind::AbbreviatedFilePath,
            OptionKind::ReleaseName,
        ]
    }

    /// Stable identifier used in persisted rule definitions.
    pub fn id(&self) -> &'static str {
        match self {
            OptionKind::ProjectPrefix => "projectPrefix",
            OptionKind::PathHash => "pathHash",
            OptionKind::ReversedFileName => "reversedFileName",
            OptionKind::DomHash => "domHash",
            OptionKind::AbbreviatedDomPosition => "abbreviatedDomPosition",
            OptionKind::AbbreviatedFilePath => "abbreviatedFilePath",
            OptionKind::ReleaseName => "releaseName",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::ProjectPrefix => "Project Prefix",
            OptionKind::PathHash => "Path Hash",
            OptionKind::ReversedFileName => "Reversed File Name",
            OptionKind::DomHash => "DOM Hash",
            OptionKind::AbbreviatedDomPosition => "Abbreviated DOM Position",
            OptionKind::AbbreviatedFilePath => "Abbreviated File Path",
            OptionKind::ReleaseName => "Release Name",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OptionKind::ProjectPrefix => "Custom text prefix for the entire project (max 50 chars)",
            OptionKind::PathHash => "Hash of the relative file path",
            OptionKind::ReversedFileName => "File name reversed (without extension)",
            OptionKind::DomHash => "Hash of the DOM ancestor chain",
            OptionKind::AbbreviatedDomPosition => {
                "Abbreviated ancestor tag names (e.g., div-sec-hea-spa)"
            }
            OptionKind::AbbreviatedFilePath => {
                "Abbreviated folder/file names (e.g., int-tem-cli-uti)"
            }
            OptionKind::ReleaseName => "Current active release name based on expiry dates",
        }
    }

    /// Produce this option's segment. An empty string means "nothing to contribute".
    pub fn generate(&self, context: &GenerationContext, settings: &OptionSettings) -> String {
        match self {
            OptionKind::ProjectPrefix => project_prefix(&settings.project_prefix),
            OptionKind::PathHash => truncated_md5(&context.relative_path, settings.path_hash_length),
            OptionKind::ReversedFileName => {
                reversed_file_name(&context.file_name, settings.reversed_name_case)
            }
            OptionKind::DomHash => {
                let chain = compute_ancestor_chain(&context.document_text, context.element_offset);
                truncated_md5(&ancestor_chain_to_string(&chain), settings.dom_hash_length)
            }
            OptionKind::AbbreviatedDomPosition => {
                let chain = compute_ancestor_chain(&context.document_text, context.element_offset);
                abbreviated_dom_position(&chain, settings.abbr_length)
            }
            OptionKind::AbbreviatedFilePath => {
                abbreviated_file_path(&context.relative_path, settings.abbr_length)
            }
            OptionKind::ReleaseName => release::release_name(
                &settings.releases,
                &settings.default_release,
                settings.today,
            ),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for OptionKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        OptionKind::all()
            .iter()
            .copied()
            .find(|kind| kind.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DomainError::UnknownOption(trimmed.to_string()))
    }
}

/// Lowercase, collapse whitespace runs to `-`, and drop anything outside `[a-z0-9_-]`.
pub fn sanitize_class_segment(value: &str) -> String {
    let lowered = value.to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lowered, "-");
    INVALID_CLASS_CHARS.replace_all(&hyphenated, "").into_owned()
}

/// Hex MD5 of `input` cut to `length` characters. Empty input yields an empty segment.
pub fn truncated_md5(input: &str, length: usize) -> String {
    if input.is_empty() {
        return String::new();
    }
    let digest = format!("{:x}", md5::compute(input.as_bytes()));
    digest[..length.min(digest.len())].to_owned()
}

fn project_prefix(prefix: &str) -> String {
    let truncated: String = prefix.chars().take(PREFIX_MAX_CHARS).collect();
    sanitize_class_segment(&truncated)
}

fn reversed_file_name(file_name: &str, case: CaseMode) -> String {
    let reversed: String = file_name.chars().rev().collect();
    case.apply(&reversed)
}

fn abbreviate(segment: &str, length: usize) -> String {
    segment.chars().take(length).collect::<String>().to_lowercase()
}

fn abbreviated_dom_position(chain: &[String], length: usize) -> String {
    chain
        .iter()
        .filter(|tag| {
            !EXCLUDED_DOM_TAGS
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(tag))
        })
        .map(|tag| abbreviate(tag, length))
        .collect::<Vec<_>>()
        .join("-")
}

fn abbreviated_file_path(relative_path: &str, length: usize) -> String {
    let normalized = relative_path.replace('\\', "/");
    let segments: Vec<&str> = normalized
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.is_empty() {
        return String::new();
    }

    let start = segments
        .iter()
        .position(|segment| {
            SKIP_ROOT_FOLDERS
                .iter()
                .any(|root| root.eq_ignore_ascii_case(segment))
        })
        .map_or(0, |index| index + 1);

    let meaningful = &segments[start..];
    if meaningful.is_empty() {
        abbreviate_segments(&segments, length)
    } else {
        abbreviate_segments(meaningful, length)
    }
}

fn abbreviate_segments(segments: &[&str], length: usize) -> String {
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let segment = if index == last {
                strip_extension(segment)
            } else {
                segment
            };
            abbreviate(segment, length)
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(dot) if dot + 1 < segment.len() => &segment[..dot],
        _ => segment,
    }
}
