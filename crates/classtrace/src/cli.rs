//! Command-line host: reads a document, runs the engine, and writes the result back.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use crate::app::classify::Classifier;
use crate::app::mutate::TextEdit;
use crate::app::options::{OptionKind, OptionSettings};
use crate::app::release::{active_release, expired_releases, parse_expiry};
use crate::app::rules::{DEFAULT_SEPARATOR, Rule, RuleSet};
use crate::app::scanner::{ancestor_chain_to_string, compute_ancestor_chain, locate_element};
use crate::domain::errors::DomainError;
use crate::domain::model::{ElementInfo, GenerationContext};
use crate::infra::clipboard::{ClassClipboard, CopiedVia};
use crate::infra::config::Config;
use crate::infra::document::{DocumentSnapshot, Position};
use crate::infra::git;

#[derive(Parser, Debug)]
#[command(name = "classtrace")]
#[command(author, version, long_about = None)]
#[command(about = "Deterministic, traceable CSS class names for markup")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Additional config file layered over the user and workspace files
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Workspace root used for relative paths (defaults to the git work tree)
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a generated class to the element at a position and save the file
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        rule: RuleArgs,

        /// Also record the workspace-relative path in the marker attribute
        #[arg(long)]
        marker: bool,

        /// Print the rewritten tag instead of saving
        #[arg(long)]
        dry_run: bool,

        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Print the class name for the element at a position
    Generate {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        rule: RuleArgs,

        /// Copy the class name to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Print the tag chain enclosing the element at a position
    Ancestors {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List preset and custom rules with their patterns
    Rules,

    /// List the available option segments
    Options,

    /// Show the active and expired releases
    Releases,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Markup file to read
    pub file: PathBuf,

    /// Byte offset into the file
    #[arg(long, conflicts_with_all = ["line", "column"])]
    pub offset: Option<usize>,

    /// 1-based line number
    #[arg(long, requires = "column")]
    pub line: Option<usize>,

    /// 1-based column, counted in characters
    #[arg(long, requires = "line")]
    pub column: Option<usize>,
}

impl TargetArgs {
    pub fn position(&self) -> Result<Position> {
        match (self.offset, self.line, self.column) {
            (Some(offset), None, None) => Ok(Position::Offset(offset)),
            (None, Some(line), Some(column)) => Ok(Position::LineColumn { line, column }),
            _ => bail!("specify either --offset or both --line and --column"),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RuleArgs {
    /// Rule id (defaults to the configured rule)
    #[arg(long, conflicts_with = "options")]
    pub rule: Option<String>,

    /// Comma-separated option ids forming a one-off rule
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub options: Vec<String>,

    /// Separator for --options
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    pub separator: String,
}

impl RuleArgs {
    pub fn resolve(&self, config: &Config) -> Result<Rule, DomainError> {
        if !self.options.is_empty() {
            let options = self
                .options
                .iter()
                .map(|id| id.parse::<OptionKind>())
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Rule::ad_hoc(options, self.separator.clone()));
        }

        let id = self.rule.as_deref().unwrap_or(config.rules.default_rule());
        config.rule_set().find(id)
    }
}

#[derive(Serialize)]
struct ApplyReport<'a> {
    class: &'a str,
    rule: &'a str,
    element: &'a ElementInfo,
    ancestors: &'a [String],
    edit: &'a TextEdit,
    changed: bool,
    written: bool,
}

/// Document plus the configuration that applies to it.
struct Workspace {
    document: DocumentSnapshot,
    root: Option<PathBuf>,
    config: Config,
}

impl Workspace {
    fn context_at(&self, target: &TargetArgs) -> Result<GenerationContext> {
        let offset = self.document.resolve(target.position()?)?;
        Ok(self.document.context(self.root.as_deref(), offset))
    }
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Apply {
                target,
                rule,
                marker,
                dry_run,
                json,
            } => self.apply(target, rule, *marker, *dry_run, *json),
            Commands::Generate { target, rule, copy } => self.generate(target, rule, *copy),
            Commands::Ancestors { target } => self.ancestors(target),
            Commands::Rules => {
                let config = self.load_config(&env::current_dir()?)?;
                print!("{}", render_rules(&config.rule_set()));
                Ok(())
            }
            Commands::Options => {
                print!("{}", render_options());
                Ok(())
            }
            Commands::Releases => {
                let config = self.load_config(&env::current_dir()?)?;
                print!("{}", render_releases(&config.generation_settings()));
                Ok(())
            }
            Commands::Completions { shell } => {
                let mut command = Cli::command();
                clap_complete::generate(*shell, &mut command, "classtrace", &mut io::stdout());
                Ok(())
            }
        }
    }

    fn apply(
        &self,
        target: &TargetArgs,
        rule_args: &RuleArgs,
        marker: bool,
        dry_run: bool,
        json: bool,
    ) -> Result<()> {
        let workspace = self.open(&target.file)?;
        let context = workspace.context_at(target)?;
        let rule = rule_args.resolve(&workspace.config)?;
        let settings = workspace.config.generation_settings();

        let mut classifier = Classifier::new(&settings);
        if marker || workspace.config.marker.enabled() {
            classifier = classifier.with_path_marker(workspace.config.marker.attribute());
        }
        let classification = classifier.classify(&context, &rule)?;

        let written = if dry_run {
            false
        } else {
            workspace.document.write_edit(&classification.edit)?
        };
        tracing::info!(
            path = %workspace.document.path().display(),
            class = %classification.class_name,
            changed = classification.changed,
            written,
            "applied class"
        );

        if json {
            let report = ApplyReport {
                class: &classification.class_name,
                rule: &classification.rule,
                element: &classification.element,
                ancestors: &classification.ancestors,
                edit: &classification.edit,
                changed: classification.changed,
                written,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if dry_run {
            println!("{}", classification.edit.replacement);
        } else {
            println!("{}", classification.class_name);
        }
        Ok(())
    }

    fn generate(&self, target: &TargetArgs, rule_args: &RuleArgs, copy: bool) -> Result<()> {
        let workspace = self.open(&target.file)?;
        let context = workspace.context_at(target)?;
        let rule = rule_args.resolve(&workspace.config)?;
        let settings = workspace.config.generation_settings();

        let (_, _, class_name) = Classifier::new(&settings).generate(&context, &rule)?;
        println!("{class_name}");

        if copy {
            match ClassClipboard::new().copy_class(&class_name)? {
                CopiedVia::System => eprintln!("copied to clipboard"),
                CopiedVia::Command(program) => eprintln!("copied to clipboard via {program}"),
            }
        }
        Ok(())
    }

    fn ancestors(&self, target: &TargetArgs) -> Result<()> {
        let document = DocumentSnapshot::load(&target.file)?;
        let offset = document.resolve(target.position()?)?;
        let element = locate_element(document.text(), offset)
            .ok_or(DomainError::ElementNotFound { offset })?;
        let chain = compute_ancestor_chain(document.text(), element.start);
        println!("{}", ancestor_chain_to_string(&chain));
        Ok(())
    }

    fn open(&self, file: &Path) -> Result<Workspace> {
        let document = DocumentSnapshot::load(file)?;
        let root = self.workspace_root(document.path())?;
        let config = Config::load(root.as_deref(), self.config.as_deref())?;
        tracing::debug!(
            path = %document.path().display(),
            root = ?root,
            "opened document"
        );
        Ok(Workspace {
            document,
            root,
            config,
        })
    }

    fn load_config(&self, anchor: &Path) -> Result<Config> {
        let root = self.workspace_root(anchor)?;
        Config::load(root.as_deref(), self.config.as_deref())
    }

    fn workspace_root(&self, anchor: &Path) -> Result<Option<PathBuf>> {
        match &self.root {
            Some(root) => fs::canonicalize(root)
                .map(Some)
                .with_context(|| format!("workspace root not found: {}", root.display())),
            None => Ok(git::workspace_root_for(anchor)),
        }
    }
}

/// One line per option: id and description.
pub fn render_options() -> String {
    OptionKind::all()
        .iter()
        .map(|option| format!("{:<24} {}\n", option.id(), option.description()))
        .collect()
}

/// One line per rule: id and placeholder pattern. Custom rules are tagged.
pub fn render_rules(rules: &RuleSet) -> String {
    rules
        .rules()
        .iter()
        .map(|rule| {
            let origin = if rule.preset { "" } else { "  [custom]" };
            format!("{:<12} {}{origin}\n", rule.id, rule.pattern())
        })
        .collect()
}

/// Active release (or the default name) followed by the releases that have expired.
pub fn render_releases(settings: &OptionSettings) -> String {
    let mut lines = Vec::new();
    match active_release(&settings.releases, settings.today) {
        Some(entry) => lines.push(format!("active: {} (expires {})", entry.name, entry.expiry)),
        None => lines.push(format!("active: {} (default)", settings.default_release)),
    }

    let expired = expired_releases(&settings.releases, settings.today);
    if !expired.is_empty() {
        lines.push("expired:".to_owned());
        lines.extend(
            expired
                .iter()
                .map(|entry| format!("  {} ({})", entry.name, entry.expiry)),
        );
    }

    let invalid = settings
        .releases
        .iter()
        .filter(|entry| parse_expiry(&entry.expiry).is_none())
        .count();
    if invalid > 0 {
        lines.push(format!("ignored: {invalid} with invalid expiry"));
    }

    lines.iter().map(|line| format!("{line}\n")).collect()
}
