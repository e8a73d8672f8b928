//! Validation history and derived statistics

use crate::error::QueryError;
use crate::normalize::{normalize, ValidationRecord};
use crate::session::{methods, ContractBackend, ContractSession};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary over a fetched history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Mean score rounded to the nearest integer, 0 when empty
    pub avg_score: u32,
}

pub fn compute_stats(records: &[ValidationRecord]) -> HistoryStats {
    let total = records.len();
    let passed = records.iter().filter(|r| r.passed).count();
    let avg_score = if total > 0 {
        let sum: u64 = records.iter().map(|r| u64::from(r.score)).sum();
        (sum as f64 / total as f64).round() as u32
    } else {
        0
    };

    HistoryStats {
        total,
        passed,
        failed: total - passed,
        avg_score,
    }
}

/// Which records a history view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Passed,
    Failed,
}

impl HistoryFilter {
    pub fn matches(&self, record: &ValidationRecord) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Passed => record.passed,
            HistoryFilter::Failed => !record.passed,
        }
    }

    /// Records passing this filter, in their original order
    pub fn apply<'a>(
        &self,
        records: &'a [ValidationRecord],
    ) -> impl Iterator<Item = &'a ValidationRecord> + 'a {
        let filter = *self;
        records.iter().filter(move |r| filter.matches(r))
    }
}

impl std::str::FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown history filter: {other}")),
        }
    }
}

/// Result of a history fetch. On failure `records` is empty and `error` is set;
/// a partial list is never returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFetch {
    pub records: Vec<ValidationRecord>,
    pub error: Option<QueryError>,
}

impl HistoryFetch {
    pub fn failed(error: QueryError) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetched records with their statistics, filterable without re-fetching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryView {
    records: Vec<ValidationRecord>,
    stats: HistoryStats,
}

impl HistoryView {
    pub fn new(records: Vec<ValidationRecord>) -> Self {
        let stats = compute_stats(&records);
        Self { records, stats }
    }

    pub fn records(&self) -> &[ValidationRecord] {
        &self.records
    }

    pub fn stats(&self) -> HistoryStats {
        self.stats
    }

    pub fn filtered(&self, filter: HistoryFilter) -> impl Iterator<Item = &ValidationRecord> + '_ {
        filter.apply(&self.records)
    }

    /// Number of records a filter would show
    pub fn count(&self, filter: HistoryFilter) -> usize {
        match filter {
            HistoryFilter::All => self.stats.total,
            HistoryFilter::Passed => self.stats.passed,
            HistoryFilter::Failed => self.stats.failed,
        }
    }
}

impl From<HistoryFetch> for HistoryView {
    fn from(fetch: HistoryFetch) -> Self {
        Self::new(fetch.records)
    }
}

/// Decode a `get_user_validations` payload. `null` is an empty history.
pub fn decode_history(raw: &Value) -> Result<Vec<ValidationRecord>, QueryError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.iter().map(normalize).collect()),
        other => Err(QueryError::UnexpectedShape {
            method: methods::GET_USER_VALIDATIONS.to_string(),
            detail: format!("expected a list, got {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Fetch every validation recorded for `address`, in backend order
pub async fn fetch_history<B>(session: &ContractSession<B>, address: &str) -> HistoryFetch
where
    B: ContractBackend + ?Sized,
{
    if address.is_empty() {
        return HistoryFetch::failed(QueryError::MissingArgument("User address"));
    }

    tracing::debug!(address = %address, "Fetching validation history");

    let raw = match session
        .query(methods::GET_USER_VALIDATIONS, vec![Value::String(address.to_string())])
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(address = %address, error = %e, "History fetch error");
            return HistoryFetch::failed(QueryError::Backend {
                method: methods::GET_USER_VALIDATIONS.to_string(),
                reason: e.to_string(),
            });
        }
    };

    match decode_history(&raw) {
        Ok(records) => {
            tracing::debug!(address = %address, count = records.len(), "Validation history loaded");
            HistoryFetch {
                records,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(address = %address, error = %e, "History fetch error");
            HistoryFetch::failed(e)
        }
    }
}
