//! Binary entry point for the propfix CLI.
//!
//! ```bash
//! # Preview a conversion (JSON envelope, nothing written)
//! propfix convert --at src/Order.cs:12:16
//!
//! # Convert and write the changed documents
//! propfix convert --at src/Order.cs:12:16 --apply
//!
//! # Convert several methods in one transaction
//! propfix convert --at src/A.cs:3:16 --at src/A.cs:9:16 --apply
//!
//! # Inspect eligibility and call sites without converting
//! propfix analyze --at src/Order.cs:12:16
//! ```
//!
//! Success and "ineligible" envelopes exit 0; errors exit with their
//! numeric output code (2 invalid arguments, 3 resolution, 4 apply,
//! 10 internal).

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use propfix_core::error::{OutputErrorCode, PropfixError};

mod cli;
mod output;

use cli::OutputFormat;
use output::{emit_response, ErrorResponse};

#[derive(Debug, Parser)]
#[command(name = "propfix", version, about = "Convert parameterless C# methods into properties")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
struct GlobalArgs {
    /// Workspace root containing the C# sources.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log verbosity (written to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert the method at a location into a property.
    Convert {
        /// Target location, path:line:col; repeat for a batch.
        #[arg(long, required = true)]
        at: Vec<String>,

        /// Write changed documents back to disk.
        #[arg(long)]
        apply: bool,

        /// Refuse conversions whose call sites cross document boundaries.
        #[arg(long)]
        no_cross_document: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Report eligibility and call sites without converting.
    Analyze {
        /// Target location, path:line:col.
        #[arg(long)]
        at: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = OutputErrorCode::from(&err);
            let response = ErrorResponse::new(&err);
            // Errors are JSON on stdout too; agents read one stream.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(code.code())
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), PropfixError> {
    match cli.command {
        Command::Convert {
            at,
            apply,
            no_cross_document,
            format,
        } => cli::execute_convert(&cli.global.root, &at, apply, !no_cross_document, format),
        Command::Analyze { at } => cli::execute_analyze(&cli.global.root, &at),
    }
}
