//! Vault CLI - edit stored logins from the terminal

mod cli;
mod commands;
mod config;
mod dialogs;
mod error;
mod keystore;


use clap::Parser;

use crate::cli::{Cli, Commands, FolderCommands};
use crate::commands::add::run_add;
use crate::commands::common::VaultPaths;
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::folder::{run_folder_add, run_folder_list};
use crate::commands::generate::run_generate;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::config::CliConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "vault=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        command,
        db_path,
        key_path,
    } = Cli::parse();
    let paths = move || VaultPaths::resolve(db_path, key_path);

    match command {
        Commands::Add {
            fields,
            organization,
        } => {
            run_add(&fields, organization.as_deref(), &paths()?).await?;
        }
        Commands::List { json } => run_list(json, &paths()?).await?,
        Commands::Show { id, reveal, json } => run_show(&id, reveal, json, &paths()?).await?,
        Commands::Edit { id, fields, yes } => {
            let config = CliConfig::load()?;
            run_edit(&id, &fields, yes, &paths()?, &config).await?;
        }
        Commands::Delete { id, yes } => {
            let config = CliConfig::load()?;
            run_delete(&id, yes, &paths()?, &config).await?;
        }
        Commands::Folder { command } => match command {
            FolderCommands::Add { name } => {
                run_folder_add(&name, &paths()?).await?;
            }
            FolderCommands::List { json } => run_folder_list(json, &paths()?).await?,
        },
        Commands::Generate { options } => run_generate(&options)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
