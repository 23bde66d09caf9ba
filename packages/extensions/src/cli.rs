//! Command-line interface for the reference host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;

use crate::error::Result;
use crate::host::Host;
use crate::namespaces::default_registry;
use crate::xml::parse_document;

/// SCXML extensions - run documents using the env, stdin and agent namespaces.
#[derive(Parser)]
#[command(name = "scxml-ext")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a document and print the resulting data model as JSON.
    Run {
        /// Path to the XML document
        file: PathBuf,

        /// Run without a data model bound
        #[arg(long)]
        no_datamodel: bool,
    },

    /// List the registered namespace URIs.
    Namespaces,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, no_datamodel } => run_command(&file, no_datamodel),
        Commands::Namespaces => namespaces_command(),
    }
}

/// Execute the run command.
fn run_command(file: &Path, no_datamodel: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let document = Arc::new(parse_document(&text)?.with_source(file.display().to_string()));
    let registry = Arc::new(default_registry()?);

    let host = if no_datamodel {
        Host::without_data_model(registry, document)
    } else {
        Host::new(registry, document)
    };

    // Unload and echo logs even when the run fails; the run error wins.
    let outcome = host.run();
    let teardown = host.teardown();

    for record in host.logs() {
        eprintln!("{} {}", style(format!("[{}]", record.label)).dim(), record.message);
    }

    outcome?;
    teardown?;

    let json = serde_json::to_string_pretty(&host.data_model_snapshot())?;
    println!("{json}");
    Ok(())
}

/// Execute the namespaces command.
fn namespaces_command() -> Result<()> {
    let registry = default_registry()?;
    println!("{}", style("Registered namespaces:").bold());
    for uri in registry.uris() {
        println!("  {}", style(uri).cyan());
    }
    Ok(())
}
