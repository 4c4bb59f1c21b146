use crate::error::{BoardError, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed task palette. Serialized as the hex string the board file stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskColor {
    #[default]
    #[serde(rename = "#1e40af")]
    Blue,
    #[serde(rename = "#065f46")]
    Green,
    #[serde(rename = "#92400e")]
    Amber,
    #[serde(rename = "#7f1d1d")]
    Red,
    #[serde(rename = "#4c1d95")]
    Violet,
    #[serde(rename = "#1f2937")]
    Slate,
}

impl TaskColor {
    pub const PALETTE: [TaskColor; 6] = [
        TaskColor::Blue,
        TaskColor::Green,
        TaskColor::Amber,
        TaskColor::Red,
        TaskColor::Violet,
        TaskColor::Slate,
    ];

    pub fn hex(self) -> &'static str {
        match self {
            TaskColor::Blue => "#1e40af",
            TaskColor::Green => "#065f46",
            TaskColor::Amber => "#92400e",
            TaskColor::Red => "#7f1d1d",
            TaskColor::Violet => "#4c1d95",
            TaskColor::Slate => "#1f2937",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TaskColor::Blue => "blue",
            TaskColor::Green => "green",
            TaskColor::Amber => "amber",
            TaskColor::Red => "red",
            TaskColor::Violet => "violet",
            TaskColor::Slate => "slate",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            TaskColor::Blue => (0x1e, 0x40, 0xaf),
            TaskColor::Green => (0x06, 0x5f, 0x46),
            TaskColor::Amber => (0x92, 0x40, 0x0e),
            TaskColor::Red => (0x7f, 0x1d, 0x1d),
            TaskColor::Violet => (0x4c, 0x1d, 0x95),
            TaskColor::Slate => (0x1f, 0x29, 0x37),
        }
    }

    fn index(self) -> usize {
        Self::PALETTE.iter().position(|c| *c == self).unwrap_or(0)
    }

    /// Next palette entry, wrapping around
    pub fn next(self) -> Self {
        Self::PALETTE[(self.index() + 1) % Self::PALETTE.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::PALETTE.len();
        Self::PALETTE[(self.index() + len - 1) % len]
    }
}

impl fmt::Display for TaskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskColor {
    type Err = String;

    /// Accepts a palette name (`green`) or its hex string (`#065f46`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::PALETTE
            .into_iter()
            .find(|c| c.name() == wanted || c.hex() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = Self::PALETTE.iter().map(|c| c.name()).collect();
                format!("unknown color '{}', expected one of {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: TaskColor,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub due: String,
    #[serde(default)]
    pub completed: bool,
}

/// Colors outside the palette (foreign or hand-edited boards) fall back to
/// the first palette entry instead of rejecting the task.
fn lenient_color<'de, D>(deserializer: D) -> std::result::Result<TaskColor, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

impl Task {
    /// Overdue is derived, never stored: the due instant has passed and the
    /// task is still open. A due date that cannot be parsed is never overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && due_instant(&self.due).is_some_and(|due| now > due)
    }
}

/// A bare `YYYY-MM-DD` date means midnight UTC of that day.
fn due_instant(due: &str) -> Option<DateTime<Utc>> {
    let due = due.trim();
    if let Ok(date) = NaiveDate::parse_from_str(due, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight));
    }
    DateTime::parse_from_rfc3339(due)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The `created` stamp shown on a card, e.g. `1/2/2024, 3:04:05 PM`.
pub fn display_timestamp(now: DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Everything the task form collects before a task exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub column_id: String,
    pub title: String,
    pub start: String,
    pub due: String,
    pub color: Option<TaskColor>,
}

impl NewTask {
    pub fn new(
        column_id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        due: impl Into<String>,
    ) -> Self {
        Self {
            column_id: column_id.into(),
            title: title.into(),
            start: start.into(),
            due: due.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: TaskColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Title, start and due are required. Date order is not checked.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("title", &self.title), ("start", &self.start), ("due", &self.due)] {
            if value.trim().is_empty() {
                return Err(BoardError::MissingField { field });
            }
        }
        Ok(())
    }
}
