//! Print the OpenAPI document as JSON for client generation.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use helpdesk::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "openapi-dump",
    about = "Write the helpdesk OpenAPI document as pretty JSON",
    version
)]
struct CliArgs {
    /// Destination file; standard output when omitted.
    #[arg(long, short, value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let document = ApiDoc::openapi().to_pretty_json()?;
    match args.output {
        Some(path) => std::fs::write(&path, document)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => writeln!(std::io::stdout().lock(), "{document}")?,
    }
    Ok(())
}
