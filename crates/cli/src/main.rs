//! `deckgen`: the deck-authoring command line.

mod commands;
mod logging;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use deckgen_core::CoreError;

use commands::compose::{compose, ComposeArgs};
use commands::content::{content, ContentArgs};
use commands::prepare::{prepare, PrepareArgs};
use commands::run::{run, RunArgs};
use commands::template::{
    layout_validate, tpl_extract, tpl_release, LayoutValidateArgs, TplExtractArgs, TplReleaseArgs,
};

#[derive(Debug, Parser)]
#[command(name = "deckgen", version, about = "Slide deck authoring pipeline")]
struct Cli {
    /// Log at INFO.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Log at DEBUG (overrides --verbose).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Release a template: hash it and write handover metadata.
    TplRelease(TplReleaseArgs),
    /// Normalize an extractor dump into template artifacts.
    TplExtract(TplExtractArgs),
    /// Validate template layouts and write a report.
    LayoutValidate(LayoutValidateArgs),
    /// Import or gate a content approval document.
    Content(ContentArgs),
    /// Turn a brief into a content approval document.
    Prepare(PrepareArgs),
    /// Compose approved content into rendering-ready output.
    Compose(ComposeArgs),
    /// Run the full unattended pipeline.
    Run(RunArgs),
}

/// Validation problems exit 2, missing approvals exit 4, everything
/// else exits 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::SchemaValidation(_)) | Some(CoreError::SpecValidation(_)) => 2,
        Some(CoreError::MissingApproval(_)) => 4,
        _ => 1,
    }
}

async fn dispatch(command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::TplRelease(args) => tpl_release(args),
        Commands::TplExtract(args) => tpl_extract(args),
        Commands::LayoutValidate(args) => layout_validate(args),
        Commands::Content(args) => content(args),
        Commands::Prepare(args) => prepare(args),
        Commands::Compose(args) => compose(args).await,
        Commands::Run(args) => run(args).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let setup = logging::resolve(cli.verbose, cli.debug);
    logging::init(&setup);

    match dispatch(&cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_every_subcommand() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn validation_errors_exit_2() {
        let err = anyhow::Error::from(CoreError::SpecValidation(vec!["bad".into()]));
        assert_eq!(exit_code_for(&err), 2);
        let err = anyhow::Error::from(CoreError::SchemaValidation("bad".into()));
        assert_eq!(exit_code_for(&err), 2);
    }

    #[test]
    fn missing_approval_exits_4() {
        let err = anyhow::Error::from(CoreError::MissingApproval(vec!["s1".into()]));
        assert_eq!(exit_code_for(&err), 4);
    }

    #[test]
    fn other_errors_exit_1() {
        let err = anyhow::Error::from(CoreError::Internal("boom".into()));
        assert_eq!(exit_code_for(&err), 1);
    }
}
