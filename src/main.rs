// src/main.rs
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Serialize, Deserialize};
use std::path::PathBuf;

use generic_save::{Format, LoadOutcome, Role, SaveHandler, SaveOutcome, SeedOutcome, Settings};

/// Sample record used by the command-line tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub name: String,
    pub index: i32,
    pub value: f32,
    pub state: bool,
}

#[derive(Parser, Debug)]
#[command(name = "generic-save", version, about = "Inspect and seed save files")]
struct Cli {
    /// Settings file (defaults to `generic-save.*` in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured serialization format
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the default and external paths for a name
    Paths { name: String },
    /// Create the external file from the default one
    Seed { name: String },
    /// Load a record and print it
    Show {
        name: String,
        #[arg(long, value_enum, default_value = "external")]
        role: RoleArg,
    },
    /// Write a record
    Save {
        name: String,
        #[arg(long, value_enum, default_value = "external")]
        role: RoleArg,
        #[arg(long)]
        record_name: String,
        #[arg(long, default_value_t = 0)]
        index: i32,
        #[arg(long, default_value_t = 0.0)]
        value: f32,
        #[arg(long)]
        state: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Xml,
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xml => Format::Xml,
            FormatArg::Json => Format::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Default,
    External,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Default => Role::Default,
            RoleArg::External => Role::External,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(format) = cli.format {
        settings.format = format.into();
    }
    let policy = settings.into_policy()?;
    let handler = SaveHandler::<LevelRecord>::new(policy);

    match cli.command {
        Command::Paths { name } => {
            let policy = handler.policy();
            println!("default:  {}", policy.full_path(&name, Role::Default, true).display());
            println!("external: {}", policy.full_path(&name, Role::External, true).display());
        }
        Command::Seed { name } => match handler.seed(&name)? {
            SeedOutcome::Seeded(SaveOutcome::Written(path)) => println!("Seeded {}", path.display()),
            SeedOutcome::Seeded(outcome) => println!("Seeded ({:?})", outcome),
            SeedOutcome::SourceMissing => {
                return Err(anyhow!(
                    "No default file for '{}' at {}",
                    name,
                    handler.policy().full_path(&name, Role::Default, true).display()
                ));
            }
        },
        Command::Show { name, role } => {
            let record = match handler.load(&name, role.into())? {
                LoadOutcome::Loaded(record) => record,
                LoadOutcome::NotConfigured => return Err(anyhow!("No loader configured")),
            };
            let content = ron::ser::to_string_pretty(
                &record,
                ron::ser::PrettyConfig::new()
                    .new_line("\n".to_string())
                    .depth_limit(4)
            ).context("Failed to format record")?;
            println!("{}", content);
        }
        Command::Save { name, role, record_name, index, value, state } => {
            let record = LevelRecord { name: record_name, index, value, state };
            if let SaveOutcome::Written(path) = handler.save(&record, &name, role.into())? {
                println!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}
