use clap::{Subcommand, ValueEnum};

#[derive(Debug, Clone, Subcommand)]
pub enum PanelCommand {
    /// Classify a transcript without touching the database
    Classify {
        /// Transcript text; several words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Run the panel: every stdin line is one hold-to-talk utterance
    Listen,
    /// Write one setting to the database
    Set {
        #[arg(value_enum)]
        field: SettingField,
        value: String,
    },
    /// Save the daily schedule slot, e.g. `schedule 06:30 open`
    Schedule {
        at: String,
        #[arg(default_value = "close")]
        action: String,
    },
    /// Print the current database root
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingField {
    Light,
    Temperature,
    ActiveLight,
    ActiveTemperature,
    ActiveDistance,
    Level,
    Led,
}

/// Accepts the usual spellings of a switch position.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" | "open" => Some(true),
        "0" | "off" | "false" | "no" | "close" => Some(false),
        _ => None,
    }
}
