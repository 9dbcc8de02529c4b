//! Output formatting for the CLI.

use clap::ValueEnum;
use loop_interactions::{Notice, NoticeKind, NoticeSink};
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode output: {}", e),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            print_json(&serde_json::json!({"status": "success", "message": message}));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({"status": "error", "message": message})
            );
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Shows interaction notices on stderr, the CLI's stand-in for toasts.
pub struct TerminalNotices {
    format: OutputFormat,
}

impl TerminalNotices {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl NoticeSink for TerminalNotices {
    fn notify(&self, notice: Notice) {
        match self.format {
            OutputFormat::Text => {
                let marker = match notice.kind {
                    NoticeKind::Info => "*",
                    NoticeKind::Error => "!",
                };
                eprintln!("{} {}: {}", marker, notice.title, notice.description);
            }
            OutputFormat::Json => match serde_json::to_string(&notice) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", notice.title, notice.description),
            },
        }
    }
}
