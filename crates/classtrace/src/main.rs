use clap::Parser;

use classtrace::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    classtrace::init(cli.verbose);

    cli.run()
}
