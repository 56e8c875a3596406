// effcalc - human vs AI service projection from the terminal
// `project` prints both panels; `tui` edits the inputs live.

mod exit_codes;
mod report;
mod tui;
mod util;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use effcalc_engine::{MetricsController, MetricsField, MetricsInput};

use exit_codes::{EXIT_ERROR, EXIT_NO_TTY, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "effcalc")]
#[command(about = "Operational efficiency calculator: human vs AI customer service")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Project monthly results for both scenarios
    #[command(after_help = "\
Inputs are read the way a browser number field reads them:
blank counts as 0, text that is not a number becomes NaN.

Examples:
  effcalc project
  effcalc project --contacts-per-day 250 --ticket-value 899.90
  effcalc project --conversion-rate 3.5 --json
  effcalc project --contacts-per-day ''")]
    Project {
        /// Contacts received per day
        #[arg(long, default_value = "100", allow_hyphen_values = true)]
        contacts_per_day: String,

        /// Average response time in minutes (shown, not used in the projection)
        #[arg(long, default_value = "180", allow_hyphen_values = true)]
        response_time: String,

        /// Conversion rate in percent
        #[arg(long, default_value = "2", allow_hyphen_values = true)]
        conversion_rate: String,

        /// Average ticket value in BRL
        #[arg(long, default_value = "1200", allow_hyphen_values = true)]
        ticket_value: String,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Interactive calculator (requires a terminal)
    #[command(after_help = "\
Keys:
  Tab / Shift+Tab   Move between inputs
  Ctrl+R            Reset to defaults
  F1                Help
  Esc               Quit")]
    Tui,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  effcalc-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  effcalc-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => Err(CliError::usage("no command given")
            .with_hint("effcalc project | effcalc tui; see effcalc --help")),
        Some(Commands::Project {
            contacts_per_day,
            response_time,
            conversion_rate,
            ticket_value,
            json,
        }) => cmd_project(
            [&contacts_per_day, &response_time, &conversion_rate, &ticket_value],
            json,
        ),
        Some(Commands::Tui) => cmd_tui(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn no_tty() -> Self {
        Self {
            code: EXIT_NO_TTY,
            message: "interactive mode needs a terminal on stdout".to_string(),
            hint: Some("use `effcalc project` for scripted output".to_string()),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// project
// ============================================================================

/// Raw values in `MetricsField::ALL` order.
fn cmd_project(raw: [&str; 4], json: bool) -> Result<(), CliError> {
    let mut controller = MetricsController::new(MetricsInput::default());
    for (field, value) in MetricsField::ALL.into_iter().zip(raw) {
        controller.edit(field, value);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let written = if json {
        report::write_json(&mut handle, controller.input(), controller.comparison())
    } else {
        report::write_text(&mut handle, controller.input(), controller.comparison())
    };
    written
        .and_then(|()| handle.flush())
        .map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// tui
// ============================================================================

fn cmd_tui() -> Result<(), CliError> {
    if !atty::is(atty::Stream::Stdout) || !atty::is(atty::Stream::Stdin) {
        return Err(CliError::no_tty());
    }
    tui::run(MetricsController::default()).map_err(CliError::io)
}
