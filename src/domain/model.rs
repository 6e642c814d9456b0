use crate::utils::error::{PanelError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const LIGHT_MAX: u16 = 1200;
pub const TEMPERATURE_MAX: u16 = 100;

/// Which actuator model the panel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Curtain/door with three positions, stored under `MUC`.
    #[default]
    ThreeLevel,
    /// On/off actuator, stored under `LED`.
    Binary,
}

impl Variant {
    /// Command that a boolean on/off action (schedule slot, switch) maps to.
    pub fn command_for_switch(self, on: bool) -> Command {
        match (self, on) {
            (Variant::ThreeLevel, true) => Command::OpenFully,
            (Variant::ThreeLevel, false) => Command::CloseFully,
            (Variant::Binary, true) => Command::Open,
            (Variant::Binary, false) => Command::Close,
        }
    }
}

impl FromStr for Variant {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "three-level" => Ok(Variant::ThreeLevel),
            "binary" => Ok(Variant::Binary),
            other => Err(PanelError::InvalidConfigValueError {
                field: "panel.variant".to_string(),
                value: other.to_string(),
                reason: "Valid variants: three-level, binary".to_string(),
            }),
        }
    }
}

/// Discrete actuator instruction derived from a transcript or a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CloseFully,
    OpenHalf,
    OpenFully,
    Close,
    Open,
}

impl Command {
    /// The single remote write this command translates to.
    pub fn remote_write(self) -> (RemotePath, serde_json::Value) {
        match self {
            Command::CloseFully | Command::OpenHalf | Command::OpenFully => {
                let level = self.level().unwrap_or(ActuatorLevel::Closed);
                (RemotePath::Muc, serde_json::Value::from(level.as_u8()))
            }
            Command::Open => (RemotePath::Led, serde_json::Value::from(led_value(true))),
            Command::Close => (RemotePath::Led, serde_json::Value::from(led_value(false))),
        }
    }

    pub fn level(self) -> Option<ActuatorLevel> {
        match self {
            Command::CloseFully => Some(ActuatorLevel::Closed),
            Command::OpenHalf => Some(ActuatorLevel::Half),
            Command::OpenFully => Some(ActuatorLevel::Full),
            Command::Close | Command::Open => None,
        }
    }

    pub fn led(self) -> Option<bool> {
        match self {
            Command::Open => Some(true),
            Command::Close => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::CloseFully => "close-fully",
            Command::OpenHalf => "open-half",
            Command::OpenFully => "open-fully",
            Command::Close => "close",
            Command::Open => "open",
        };
        f.write_str(name)
    }
}

fn led_value(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorLevel {
    #[default]
    Closed,
    Half,
    Full,
}

impl ActuatorLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            ActuatorLevel::Closed => 0,
            ActuatorLevel::Half => 1,
            ActuatorLevel::Full => 2,
        }
    }

    pub fn command(self) -> Command {
        match self {
            ActuatorLevel::Closed => Command::CloseFully,
            ActuatorLevel::Half => Command::OpenHalf,
            ActuatorLevel::Full => Command::OpenFully,
        }
    }
}

impl TryFrom<i64> for ActuatorLevel {
    type Error = PanelError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(ActuatorLevel::Closed),
            1 => Ok(ActuatorLevel::Half),
            2 => Ok(ActuatorLevel::Full),
            other => Err(PanelError::InvalidConfigValueError {
                field: RemotePath::Muc.key().to_string(),
                value: other.to_string(),
                reason: "Level must be 0, 1 or 2".to_string(),
            }),
        }
    }
}

/// Keys of the realtime database root object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemotePath {
    Light,
    Temperature,
    ActiveLight,
    ActiveTemperature,
    ActiveDistance,
    Led,
    Muc,
}

impl RemotePath {
    pub fn key(self) -> &'static str {
        match self {
            RemotePath::Light => "LIGHT",
            RemotePath::Temperature => "TEMPERATURE",
            RemotePath::ActiveLight => "ACTIVE_LIGHT",
            RemotePath::ActiveTemperature => "ACTIVE_TEMPERATURE",
            RemotePath::ActiveDistance => "ACTIVE_DISTANCE",
            RemotePath::Led => "LED",
            RemotePath::Muc => "MUC",
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Root object as pushed by the realtime database. Every field may be absent.
///
/// Fields are read one by one: a value of an unexpected type becomes `None`
/// without discarding the rest of the root. Fractional numbers are rounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RemoteSnapshot {
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub light: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub active_light: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub active_temperature: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub active_distance: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub led: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub muc: Option<i64>,
}

fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
    }))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "vi-VN")]
    Vietnamese,
    #[serde(rename = "en-US")]
    English,
}

impl Language {
    pub fn tag(self) -> &'static str {
        match self {
            Language::Vietnamese => "vi-VN",
            Language::English => "en-US",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Vietnamese => Language::English,
            Language::English => Language::Vietnamese,
        }
    }
}

impl FromStr for Language {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vi-VN" => Ok(Language::Vietnamese),
            "en-US" => Ok(Language::English),
            other => Err(PanelError::InvalidConfigValueError {
                field: "panel.language".to_string(),
                value: other.to_string(),
                reason: "Valid languages: vi-VN, en-US".to_string(),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Best recognition hypothesis of one recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for keyword matching. Diacritics are kept.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl From<&str> for Transcript {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// What a recognizer reports for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result(Transcript),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
}

/// The single schedule slot: fire `action` every day at `hour:minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    pub hour: u8,
    pub minute: u8,
    pub action: bool,
}

impl Schedule {
    pub fn new(hour: u8, minute: u8, action: bool) -> Result<Self> {
        if hour > 23 {
            return Err(PanelError::ScheduleError {
                message: format!("hour {} is out of range 00..23", hour),
            });
        }
        if minute > 59 {
            return Err(PanelError::ScheduleError {
                message: format!("minute {} is out of range 00..59", minute),
            });
        }
        Ok(Self {
            hour,
            minute,
            action,
        })
    }

    /// Builds a schedule from the three persisted string keys, keeping the
    /// default for each key that is absent.
    pub fn from_stored(
        hour: Option<&str>,
        minute: Option<&str>,
        action: Option<&str>,
    ) -> Result<Self> {
        let defaults = Schedule::default();
        let hour = match hour {
            Some(h) => parse_two_digits("scheduleHour", h)?,
            None => defaults.hour,
        };
        let minute = match minute {
            Some(m) => parse_two_digits("scheduleMinute", m)?,
            None => defaults.minute,
        };
        let action = action.map(|a| a == "true").unwrap_or(defaults.action);
        Schedule::new(hour, minute, action)
    }

    pub fn hour_key(&self) -> String {
        format!("{:02}", self.hour)
    }

    pub fn minute_key(&self) -> String {
        format!("{:02}", self.minute)
    }

    pub fn action_key(&self) -> String {
        self.action.to_string()
    }

    /// `HH:MM`, compared against the start of the `HH:MM:SS` clock string.
    pub fn prefix(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for Schedule {
    type Err = PanelError;

    /// Parses `HH:MM open` / `HH:MM close`; the action defaults to close.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let time = parts.next().unwrap_or_default();
        let (hour, minute) = time.split_once(':').ok_or_else(|| PanelError::ScheduleError {
            message: format!("expected HH:MM, got '{}'", time),
        })?;
        let action = match parts.next() {
            Some("open") | Some("on") | Some("true") => true,
            Some("close") | Some("off") | Some("false") | None => false,
            Some(other) => {
                return Err(PanelError::ScheduleError {
                    message: format!("unknown action '{}'", other),
                })
            }
        };
        Schedule::new(
            parse_two_digits("hour", hour)?,
            parse_two_digits("minute", minute)?,
            action,
        )
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.action { "open" } else { "close" };
        write!(f, "{} {}", self.prefix(), action)
    }
}

fn parse_two_digits(field: &str, raw: &str) -> Result<u8> {
    raw.trim().parse::<u8>().map_err(|e| PanelError::ScheduleError {
        message: format!("{} '{}' is not a number: {}", field, raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_remote_writes() {
        assert_eq!(
            Command::OpenFully.remote_write(),
            (RemotePath::Muc, serde_json::json!(2))
        );
        assert_eq!(
            Command::CloseFully.remote_write(),
            (RemotePath::Muc, serde_json::json!(0))
        );
        assert_eq!(
            Command::Open.remote_write(),
            (RemotePath::Led, serde_json::json!("ON"))
        );
        assert_eq!(
            Command::Close.remote_write(),
            (RemotePath::Led, serde_json::json!("OFF"))
        );
    }

    #[test]
    fn test_variant_switch_mapping() {
        assert_eq!(Variant::ThreeLevel.command_for_switch(true), Command::OpenFully);
        assert_eq!(Variant::ThreeLevel.command_for_switch(false), Command::CloseFully);
        assert_eq!(Variant::Binary.command_for_switch(true), Command::Open);
        assert_eq!(Variant::Binary.command_for_switch(false), Command::Close);
    }

    #[test]
    fn test_snapshot_uses_database_keys() {
        let snapshot: RemoteSnapshot = serde_json::from_value(serde_json::json!({
            "LIGHT": 800,
            "TEMPERATURE": 31,
            "ACTIVE_LIGHT": 1,
            "ACTIVE_DISTANCE": 0,
            "LED": "ON",
            "MUC": 1
        }))
        .unwrap();

        assert_eq!(snapshot.light, Some(800));
        assert_eq!(snapshot.active_light, Some(1));
        assert_eq!(snapshot.active_temperature, None);
        assert_eq!(snapshot.led.as_deref(), Some("ON"));
        assert_eq!(snapshot.muc, Some(1));
    }

    #[test]
    fn test_snapshot_tolerates_mixed_value_types() {
        let snapshot: RemoteSnapshot = serde_json::from_value(serde_json::json!({
            "LIGHT": 512.5,
            "TEMPERATURE": "hot",
            "ACTIVE_LIGHT": true,
            "ACTIVE_DISTANCE": null,
            "LED": 1,
            "MUC": 2
        }))
        .unwrap();

        assert_eq!(snapshot.light, Some(513));
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.active_light, None);
        assert_eq!(snapshot.active_distance, None);
        assert_eq!(snapshot.led, None);
        assert_eq!(snapshot.muc, Some(2));
    }

    #[test]
    fn test_schedule_from_stored_keys_falls_back_per_key() {
        let schedule = Schedule::from_stored(Some("07"), None, Some("true")).unwrap();
        assert_eq!(schedule, Schedule::new(7, 0, true).unwrap());
        assert_eq!(schedule.prefix(), "07:00");

        let empty = Schedule::from_stored(None, None, None).unwrap();
        assert_eq!(empty.prefix(), "00:00");
        assert!(!empty.action);
    }

    #[test]
    fn test_schedule_parse() {
        let schedule: Schedule = "6:05 open".parse().unwrap();
        assert_eq!(schedule.prefix(), "06:05");
        assert!(schedule.action);

        assert!("24:00 open".parse::<Schedule>().is_err());
        assert!("12:60".parse::<Schedule>().is_err());
        assert!("noon".parse::<Schedule>().is_err());
    }

    #[test]
    fn test_transcript_normalization_keeps_diacritics() {
        let transcript = Transcript::new("MỞ Hết Cửa");
        assert_eq!(transcript.normalized(), "mở hết cửa");
    }
}
