pub mod countdown;
pub mod id_check;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "formkit")]
#[command(about = "Form validation and send-code countdown toolkit.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a JSON model against a JSON rule set
    #[command(alias = "v")]
    Validate {
        /// Rule set file
        #[arg(long)]
        rules: PathBuf,
        /// Model file (a JSON object of field values)
        #[arg(long)]
        model: PathBuf,
        /// Validate only this field
        #[arg(long)]
        field: Option<String>,
        /// Fail on rule-engine faults instead of ignoring them
        #[arg(long)]
        surface_faults: bool,
    },
    /// Check a resident ID number
    #[command(alias = "id")]
    IdCheck { value: String },
    /// Run a send-code countdown in the terminal
    #[command(alias = "c")]
    Countdown {
        /// Countdown length, overriding FORMKIT_COUNTDOWN_SECS
        #[arg(long)]
        seconds: Option<u32>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
