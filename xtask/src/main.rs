use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite with cargo nextest
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Check formatting and run clippy with warnings denied
    Lint,
    /// Lint, then test
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile.as_deref(), release)?,
        Commands::Lint => run_lint()?,
        Commands::Ci => {
            run_lint()?;
            run_nextest(Some("ci"), false)?;
        }
    }
    Ok(())
}

fn run_nextest(profile: Option<&str>, release: bool) -> Result<()> {
    let mut args = vec!["nextest", "run", "--workspace"];
    if let Some(profile) = profile {
        args.extend(["--profile", profile]);
    }
    if release {
        args.push("--release");
    }
    cargo(&args)
}

fn run_lint() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ])
}

fn cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
