//! Tasks, as the server reports them

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use chrono::NaiveDateTime;

use crate::user::UserRef;

/// The review status of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Approved,
    Rejected,
}

impl TaskStatus {
    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Approved => "APPROVED",
            TaskStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            "APPROVED" => Ok(TaskStatus::Approved),
            "REJECTED" => Ok(TaskStatus::Rejected),
            other => Err(format!("Unknown task status {:?}", other)),
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The urgency rank of a task. Lower numbers are more urgent.
///
/// The server may omit it, or send it either as a number or as a numeric string.
/// A task without a priority ranks after every task that has one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Priority(Option<i32>);

impl Priority {
    pub fn new(rank: i32) -> Self {
        Self(Some(rank))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn rank(&self) -> Option<i32> {
        self.0
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(l), Some(r)) => l.cmp(&r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.0 {
            Some(rank) => write!(f, "{}", rank),
            None => write!(f, "-"),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i32),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Priority(None)),
            Some(Raw::Number(n)) => Ok(Priority(Some(n))),
            Some(Raw::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(Priority(None));
                }
                text.parse::<i32>()
                    .map(|n| Priority(Some(n)))
                    .map_err(|_| serde::de::Error::custom(format!("invalid priority {:?}", text)))
            },
        }
    }
}

/// Timestamps are the server's wall-clock time, without any offset (e.g. `2024-01-02T10:15:30.123`).
/// Offsets, when present, are converted to UTC.
mod server_timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", text)))
    }

    pub fn parse(text: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, FORMAT) {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_utc());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

/// A task record. The server owns it, we only hold a copy of what the last fetch returned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    status: TaskStatus,
    #[serde(with = "server_timestamp")]
    created_date: NaiveDateTime,

    #[serde(default)]
    create_user_id: Option<i64>,
    #[serde(default)]
    assigned_user_id: Option<i64>,
    #[serde(default)]
    create_user: Option<UserRef>,
    #[serde(default)]
    assigned_user: Option<UserRef>,
}

impl Task {
    pub fn new(id: i64, title: String, priority: Priority, status: TaskStatus, created_date: NaiveDateTime) -> Self {
        Self {
            id, title, priority, status, created_date,
            description: None,
            create_user_id: None,
            assigned_user_id: None,
            create_user: None,
            assigned_user: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_creator(mut self, creator: UserRef) -> Self {
        self.create_user_id = Some(creator.id());
        self.create_user = Some(creator);
        self
    }

    pub fn with_assignee(mut self, assignee: Option<UserRef>) -> Self {
        self.assigned_user_id = assignee.as_ref().map(|u| u.id());
        self.assigned_user = assignee;
        self
    }

    pub fn id(&self) -> i64                        { self.id }
    pub fn title(&self) -> &str                    { &self.title }
    pub fn description(&self) -> Option<&str>      { self.description.as_deref() }
    pub fn priority(&self) -> Priority             { self.priority }
    pub fn status(&self) -> TaskStatus             { self.status }
    pub fn created_date(&self) -> &NaiveDateTime   { &self.created_date }
    pub fn create_user(&self) -> Option<&UserRef>  { self.create_user.as_ref() }
    pub fn assigned_user(&self) -> Option<&UserRef> { self.assigned_user.as_ref() }

    pub fn create_user_id(&self) -> Option<i64> {
        self.create_user_id.or_else(|| self.create_user.as_ref().map(|u| u.id()))
    }

    pub fn assigned_user_id(&self) -> Option<i64> {
        self.assigned_user_id.or_else(|| self.assigned_user.as_ref().map(|u| u.id()))
    }

    #[cfg(any(test, feature = "mock_api"))]
    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }
}

/// The body of a "create task" request
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Option<i32>,
    /// `None` means "assign it to myself"
    pub assigned_user_id: Option<i64>,
}
