//! Change event model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use turqa_core::error::AppError;
use turqa_core::result::AppResult;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A record was inserted.
    Created,
    /// A record was modified.
    Updated,
    /// A record was removed.
    Deleted,
}

impl ChangeKind {
    /// Parses the backend's operation name (`INSERT`, `UPDATE`, `DELETE`).
    pub fn from_operation(op: &str) -> Option<Self> {
        match op.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Created),
            "UPDATE" => Some(Self::Updated),
            "DELETE" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Which operations a subscription wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventFilter {
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// `*`
    #[default]
    All,
}

impl EventFilter {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::All => "*",
        }
    }

    /// Whether an event of `kind` passes the filter.
    pub fn matches(&self, kind: ChangeKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Insert, ChangeKind::Created)
                | (Self::Update, ChangeKind::Updated)
                | (Self::Delete, ChangeKind::Deleted)
        )
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "*" | "ALL" => Ok(Self::All),
            other => Err(AppError::validation(format!(
                "Unknown event filter '{other}' (expected INSERT, UPDATE, DELETE or *)"
            ))),
        }
    }
}

/// A change as reported by the backend, before typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    /// Operation name: `INSERT`, `UPDATE` or `DELETE`.
    #[serde(rename = "type")]
    pub operation: String,
    /// Row after the change.
    #[serde(default)]
    pub record: Option<Value>,
    /// Row before the change.
    #[serde(default)]
    pub old_record: Option<Value>,
    /// Commit time reported by the backend.
    #[serde(default)]
    pub commit_timestamp: Option<DateTime<Utc>>,
}

impl RawChange {
    /// An `INSERT` of `record`.
    pub fn insert(record: Value) -> Self {
        Self::new("INSERT", Some(record), None)
    }

    /// An `UPDATE` from `old_record` to `record`.
    pub fn update(old_record: Value, record: Value) -> Self {
        Self::new("UPDATE", Some(record), Some(old_record))
    }

    /// A `DELETE` of `old_record`.
    pub fn delete(old_record: Value) -> Self {
        Self::new("DELETE", None, Some(old_record))
    }

    fn new(operation: &str, record: Option<Value>, old_record: Option<Value>) -> Self {
        Self {
            operation: operation.to_string(),
            record,
            old_record,
            commit_timestamp: Some(Utc::now()),
        }
    }

    /// The operation as a [`ChangeKind`], if recognized.
    pub fn kind(&self) -> Option<ChangeKind> {
        ChangeKind::from_operation(&self.operation)
    }
}

/// A normalized change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent<T> {
    /// What happened.
    pub kind: ChangeKind,
    /// Row before the change (updates and deletes).
    pub previous: Option<T>,
    /// Row after the change (creates and updates).
    pub current: Option<T>,
    /// Commit time reported by the backend.
    pub committed_at: Option<DateTime<Utc>>,
}

impl<T: DeserializeOwned> ChangeEvent<T> {
    /// Types a raw change.
    ///
    /// Missing, `null` and `{}` rows count as absent. A row that is present
    /// but does not decode into `T` is an error.
    pub fn classify(raw: RawChange) -> AppResult<Self> {
        let kind = raw.kind().ok_or_else(|| {
            AppError::validation(format!("Unknown change operation '{}'", raw.operation))
        })?;

        let (previous, current) = match kind {
            ChangeKind::Created => (None, decode_row(raw.record)?),
            ChangeKind::Updated => (decode_row(raw.old_record)?, decode_row(raw.record)?),
            ChangeKind::Deleted => (decode_row(raw.old_record)?, None),
        };

        Ok(Self {
            kind,
            previous,
            current,
            committed_at: raw.commit_timestamp,
        })
    }
}

fn decode_row<T: DeserializeOwned>(row: Option<Value>) -> AppResult<Option<T>> {
    match row {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}
