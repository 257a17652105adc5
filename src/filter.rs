use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{JobtvError, PageSize};
use crate::jobs::{COL_ID, ValueType};

/// A filter value. String fields carry an exact/substring term, number and
/// date fields may carry a bound pair or a relative window ("past 7 days").
/// The controller never interprets the non-exact variants itself, it only
/// forwards them to the data source's query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Exact(String),
    NumericRange {
        min: Option<f64>,
        max: Option<f64>,
    },
    RelativeWindow(Duration),
}

/// One per-column filter condition. At most one exists per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: u16,
    pub value: FilterValue,
    pub value_type: ValueType,
}

/// The complete persisted filter state of one table, stored as a unit and
/// keyed by view id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub conditions: Vec<FilterPredicate>,
    pub jobs_limit: Option<PageSize>,
}

/// Durable storage of filter snapshots, keyed by view id. Concrete backing
/// is chosen by the host application.
pub trait FilterStore {
    fn get(&self, view_id: &str) -> Option<FilterSnapshot>;
    fn put(&mut self, view_id: &str, snapshot: &FilterSnapshot) -> Result<(), JobtvError>;
}

/// JSON file backed store. The file holds a map of view id to snapshot.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        JsonFileStore { path }
    }

    fn read_all(&self) -> Result<HashMap<String, FilterSnapshot>, JobtvError> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl FilterStore for JsonFileStore {
    fn get(&self, view_id: &str) -> Option<FilterSnapshot> {
        match self.read_all() {
            Ok(mut all) => all.remove(view_id),
            Err(e) => {
                debug!("No usable filter store at {:?}: {e}", self.path);
                None
            }
        }
    }

    fn put(&mut self, view_id: &str, snapshot: &FilterSnapshot) -> Result<(), JobtvError> {
        let mut all = self.read_all().unwrap_or_default();
        all.insert(view_id.to_string(), snapshot.clone());
        fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        trace!("Persisted filter snapshot for view {view_id}");
        Ok(())
    }
}

/// In-memory store backing the tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    snapshots: HashMap<String, FilterSnapshot>,
}

#[cfg(test)]
impl FilterStore for MemoryStore {
    fn get(&self, view_id: &str) -> Option<FilterSnapshot> {
        self.snapshots.get(view_id).cloned()
    }

    fn put(&mut self, view_id: &str, snapshot: &FilterSnapshot) -> Result<(), JobtvError> {
        self.snapshots.insert(view_id.to_string(), snapshot.clone());
        Ok(())
    }
}

/// The in-memory authoritative filter state: the active predicates plus the
/// rows-per-page limit. Persistence failures never touch this.
#[derive(Debug, Default)]
pub struct FilterState {
    conditions: Vec<FilterPredicate>,
    jobs_limit: PageSize,
}

impl FilterState {
    pub fn conditions(&self) -> &[FilterPredicate] {
        &self.conditions
    }

    pub fn get(&self, column: u16) -> Option<&FilterPredicate> {
        self.conditions.iter().find(|c| c.column == column)
    }

    pub fn jobs_limit(&self) -> PageSize {
        self.jobs_limit
    }

    pub fn set_jobs_limit(&mut self, limit: PageSize) {
        self.jobs_limit = limit;
    }

    /// Insert or replace the predicate for a column.
    pub fn upsert(&mut self, predicate: FilterPredicate) {
        match self.conditions.iter_mut().find(|c| c.column == predicate.column) {
            Some(existing) => *existing = predicate,
            None => self.conditions.push(predicate),
        }
    }

    pub fn remove(&mut self, column: u16) {
        self.conditions.retain(|c| c.column != column);
    }

    /// Commit a field edit: an empty value drops the column's predicate,
    /// anything else creates or replaces it.
    pub fn set(&mut self, column: u16, value: Option<FilterValue>, value_type: ValueType) {
        match value {
            Some(value) => self.upsert(FilterPredicate {
                column,
                value,
                value_type,
            }),
            None => self.remove(column),
        }
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
    }

    /// True while an exact job id filter is active. While true all other
    /// filters are cleared and their inputs disabled.
    pub fn is_id_filter_applied(&self) -> bool {
        matches!(
            self.get(COL_ID),
            Some(FilterPredicate {
                value: FilterValue::Exact(s),
                ..
            }) if !s.is_empty()
        )
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            conditions: self.conditions.clone(),
            jobs_limit: Some(self.jobs_limit),
        }
    }
}

/// Selector entries for the date window filter, mirroring the choices the
/// jobs page offers.
pub const DATE_WINDOWS: [(&str, Duration); 6] = [
    ("Past 1 hour", Duration::from_secs(3_600)),
    ("Past 1 Day", Duration::from_secs(86_400)),
    ("Past 2 Days", Duration::from_secs(2 * 86_400)),
    ("Past 7 Days", Duration::from_secs(7 * 86_400)),
    ("Past 14 Days", Duration::from_secs(14 * 86_400)),
    ("Past 30 Days", Duration::from_secs(30 * 86_400)),
];

pub const DATE_WINDOW_ANY: &str = "Any";

pub fn window_from_label(label: &str) -> Option<Duration> {
    DATE_WINDOWS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, d)| *d)
}

fn label_for_window(window: Duration) -> Option<&'static str> {
    DATE_WINDOWS
        .iter()
        .find(|(_, d)| *d == window)
        .map(|(name, _)| *name)
}

/// Parse a raw field edit into a filter value. `None` means "no filter".
pub fn parse_filter_value(raw: &str, value_type: ValueType) -> Option<FilterValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match value_type {
        ValueType::String => Some(FilterValue::Exact(raw.to_string())),
        ValueType::Date => {
            if raw == DATE_WINDOW_ANY {
                None
            } else if let Some(window) = window_from_label(raw) {
                Some(FilterValue::RelativeWindow(window))
            } else {
                parse_range(raw)
            }
        }
        ValueType::Number => parse_range(raw).or_else(|| Some(FilterValue::Exact(raw.to_string()))),
    }
}

// "a..b", "a.." and "..b" bound pairs.
fn parse_range(raw: &str) -> Option<FilterValue> {
    let (lo, hi) = raw.split_once("..")?;
    let min = if lo.trim().is_empty() {
        None
    } else {
        Some(lo.trim().parse().ok()?)
    };
    let max = if hi.trim().is_empty() {
        None
    } else {
        Some(hi.trim().parse().ok()?)
    };
    if min.is_none() && max.is_none() {
        return None;
    }
    Some(FilterValue::NumericRange { min, max })
}

/// Text shown in a filter input for a stored value.
pub fn display_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Exact(s) => s.clone(),
        FilterValue::NumericRange { min, max } => format!(
            "{}..{}",
            min.map(|v| v.to_string()).unwrap_or_default(),
            max.map(|v| v.to_string()).unwrap_or_default()
        ),
        FilterValue::RelativeWindow(window) => label_for_window(*window)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Past {}s", window.as_secs())),
    }
}
