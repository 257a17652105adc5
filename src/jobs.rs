use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

// 1-based column indices of the jobs table. Column 1 is the id column the
// exclusivity rule keys on.
pub const COL_ID: u16 = 1;
pub const COL_USER: u16 = 2;
pub const COL_START_TIME: u16 = 3;
pub const COL_END_TIME: u16 = 4;
pub const COL_DURATION: u16 = 5;

/// How values of a column are interpreted when filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Date,
}

/// Static description of one jobs-table column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub column: u16,
    pub name: &'static str,
    pub display_key: &'static str,
    pub value_type: ValueType,
}

/// The jobs table schema. Defined once, never mutated.
pub const JOB_COLUMNS: [ColumnSpec; 5] = [
    ColumnSpec {
        column: COL_ID,
        name: "id",
        display_key: "jobs.column.id",
        value_type: ValueType::String,
    },
    ColumnSpec {
        column: COL_USER,
        name: "user",
        display_key: "jobs.column.user",
        value_type: ValueType::String,
    },
    ColumnSpec {
        column: COL_START_TIME,
        name: "startTime",
        display_key: "jobs.column.start.time",
        value_type: ValueType::Date,
    },
    ColumnSpec {
        column: COL_END_TIME,
        name: "endTime",
        display_key: "jobs.column.end.time",
        value_type: ValueType::Date,
    },
    ColumnSpec {
        column: COL_DURATION,
        name: "duration",
        display_key: "jobs.column.duration",
        value_type: ValueType::Number,
    },
];

pub fn column_spec(column: u16) -> Option<&'static ColumnSpec> {
    JOB_COLUMNS.iter().find(|spec| spec.column == column)
}

/// One job record as supplied by the data source. Times are epoch
/// milliseconds, duration is milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: String,
    pub user: String,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
}

impl JobRecord {
    /// Cell value for a column, formatted for display.
    pub fn cell(&self, column: u16) -> String {
        match column {
            COL_ID => self.id.clone(),
            COL_USER => self.user.clone(),
            COL_START_TIME => format_instant(self.start_time),
            COL_END_TIME => format_instant(self.end_time),
            COL_DURATION => format_duration(self.duration),
            _ => String::new(),
        }
    }
}

pub fn format_instant(epoch_ms: i64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "∅".to_string(),
    }
}

pub fn format_duration(ms: i64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else if ms < 3_600_000 {
        format!("{:.1}m", ms as f64 / 60_000.0)
    } else {
        format!("{:.1}h", ms as f64 / 3_600_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_indices_are_unique_and_resolvable() {
        for spec in JOB_COLUMNS.iter() {
            let found = column_spec(spec.column).unwrap();
            assert_eq!(found.name, spec.name);
        }
        assert!(column_spec(0).is_none());
        assert!(column_spec(6).is_none());
    }

    #[test]
    fn cell_formats_every_column() {
        let record = JobRecord {
            id: "job_0001".into(),
            user: "hdfs".into(),
            start_time: 1_700_000_000_000,
            end_time: 1_700_000_120_000,
            duration: 120_000,
        };
        assert_eq!(record.cell(COL_ID), "job_0001");
        assert_eq!(record.cell(COL_USER), "hdfs");
        assert!(record.cell(COL_START_TIME).starts_with("2023-"));
        assert_eq!(record.cell(COL_DURATION), "2.0m");
        assert_eq!(record.cell(42), "");
    }

    #[test]
    fn durations_scale_with_magnitude() {
        assert_eq!(format_duration(500), "500ms");
        assert_eq!(format_duration(1_500), "1.5s");
        assert_eq!(format_duration(90_000), "1.5m");
        assert_eq!(format_duration(5_400_000), "1.5h");
    }
}
