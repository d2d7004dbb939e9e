use std::fmt;
use std::str::FromStr;

use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UnknownLabel;

/// `created_at` format, e.g. `16.10.2026 09:30`.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Task priority, ordered `Low < Medium < High < Urgent`.
///
/// The label text is both what the user sees and what is written to the
/// data file, so it must never change without migrating existing files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Низкий",
            Priority::Medium => "Средний",
            Priority::High => "Высокий",
            Priority::Urgent => "Срочный",
        }
    }

    /// 1-based menu position.
    pub fn from_ordinal(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Workflow state of a task. Any status may be replaced by any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Todo, Status::InProgress, Status::Done, Status::Cancelled];

    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "К выполнению",
            Status::InProgress => "В процессе",
            Status::Done => "Выполнено",
            Status::Cancelled => "Отменено",
        }
    }

    /// 1-based menu position.
    pub fn from_ordinal(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }
}

// Label decoding goes through `ALL` + `label()` so that the two directions
// cannot drift apart.
macro_rules! label_conversions {
    ($ty:ident, $kind:literal) => {
        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| UnknownLabel {
                        kind: $kind,
                        label: s.to_string(),
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = UnknownLabel;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for &'static str {
            fn from(v: $ty) -> Self {
                v.label()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

label_conversions!(Priority, "priority");
label_conversions!(Status, "status");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

impl Task {
    /// Case-insensitive exact match against any tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Input for [`TaskStore::add`](crate::store::TaskStore::add).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Field-wise update for an existing task. `None` and blank strings keep the
/// current value; nothing here can clear a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = non_blank(self.title) {
            task.title = title;
        }
        if let Some(description) = non_blank(self.description) {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Splits comma-separated tag input, dropping empty entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
