use bin2uf2_core::{
    config::{mask_address_from_raw, Config, DEFAULT_BASE_ADDRESS, DEFAULT_MASK_ADDRESS},
    Family,
};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::*;

use std::{io::Write, path::PathBuf};

use crate::{convert::convert, info::info};

mod convert;
mod info;
mod reporter;

#[derive(Parser, Debug)]
enum Command {
    /// Convert flat binaries to UF2 files next to them
    #[command(arg_required_else_help = true)]
    Convert {
        /// Input binary files
        #[clap(required = true)]
        files: Vec<PathBuf>,

        /// Flash address of the first image byte
        #[clap(short, long, value_parser = address_parser, default_value_t = DEFAULT_BASE_ADDRESS)]
        base_address: u32,

        /// Flash address of the mask announcement, 0xFFFFFFFF leaves it out
        #[clap(short, long, value_parser = address_parser, default_value_t = DEFAULT_MASK_ADDRESS)]
        mask_address: u32,

        /// UF2 family ID written to every block
        #[clap(value_enum, short, long, default_value_t = Family::default())]
        family: Family,

        /// Write the image size instead of a family ID
        #[clap(long, conflicts_with = "family")]
        no_family_id: bool,
    },
    /// Print a summary of a UF2 file
    #[command(arg_required_else_help = true)]
    Info {
        /// Input UF2 file
        input: PathBuf,
    },
}

fn address_parser(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };

    parsed.map_err(|err| format!("Invalid address '{}': {}", s, err))
}

#[derive(Parser, Debug)]
#[clap(version, about, author, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Set the logging verbosity
    #[clap(short, long, value_enum, global = true, default_value_t = LogLevel::Info)]
    verbose: LogLevel,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default())
        .filter_level(cli.verbose.into())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let level = record.level();
            if level == Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "{}: {}", record.level(), record.args())
            }
        })
        .init();

    let command = match cli.command {
        Some(command) => command,
        None => return Ok(()),
    };

    match command {
        Command::Convert {
            files,
            base_address,
            mask_address,
            family,
            no_family_id,
        } => {
            let config = Config {
                base_address,
                mask_address: mask_address_from_raw(mask_address),
                family: if no_family_id { None } else { Some(family) },
            };

            convert(&files, &config)
        }
        Command::Info { input } => info(&input),
    }
}
