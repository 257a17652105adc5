use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::JobtvError;
use crate::filter::{FilterPredicate, FilterSnapshot, FilterValue};
use crate::jobs::{COL_DURATION, COL_END_TIME, COL_ID, COL_START_TIME, COL_USER, JobRecord};

/// What a query hands back: the page content, limited to the snapshot's
/// rows-per-page, and the total match count before the limit.
#[derive(Debug)]
pub struct QueryResult {
    pub content: Vec<JobRecord>,
    pub total_of_jobs: u64,
}

/// The external collaborator owning the job records. Filtering happens
/// here, not in the controller.
pub trait JobDataSource {
    fn query(&self, snapshot: &FilterSnapshot) -> QueryResult;
}

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
}

/// Job records loaded once from a CSV or Parquet file. Acts as the query
/// backend for one viewer session.
pub struct FileJobSource {
    records: Vec<JobRecord>,
}

impl FileJobSource {
    pub fn from_records(records: Vec<JobRecord>) -> Self {
        FileJobSource { records }
    }

    pub fn load(path: PathBuf) -> Result<Self, JobtvError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => JobtvError::FileNotFound(path.display().to_string()),
            ErrorKind::PermissionDenied => JobtvError::PermissionDenied(path.display().to_string()),
            _ => JobtvError::Io(e),
        })?;
        if !metadata.is_file() {
            return Err(JobtvError::LoadingFailed("Not a file!".into()));
        }

        let frame = match Self::detect_file_type(&path)? {
            FileType::CSV => Self::load_csv(&path)?,
            FileType::PARQUET => Self::load_parquet(&path)?,
        };

        let start_time = Instant::now();
        let df = frame.collect()?;
        let records = Self::materialize(&df)?;
        info!(
            "Loaded {} job records in {}ms",
            records.len(),
            start_time.elapsed().as_millis()
        );

        Ok(FileJobSource { records })
    }

    fn detect_file_type(path: &Path) -> Result<FileType, JobtvError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            _ => Err(JobtvError::UnknownFileType(path.display().to_string())),
        }
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    // The file schema follows the table's column specs: id, user,
    // startTime, endTime, duration.
    fn materialize(df: &DataFrame) -> Result<Vec<JobRecord>, JobtvError> {
        let ids = Self::string_column(df, schema_name(COL_ID))?;
        let users = Self::string_column(df, schema_name(COL_USER))?;
        let start_times = Self::int_column(df, schema_name(COL_START_TIME))?;
        let end_times = Self::int_column(df, schema_name(COL_END_TIME))?;
        let durations = Self::int_column(df, schema_name(COL_DURATION))?;

        let records = (0..df.height())
            .into_par_iter()
            .map(|row| JobRecord {
                id: ids[row].clone(),
                user: users[row].clone(),
                start_time: start_times[row],
                end_time: end_times[row],
                duration: durations[row],
            })
            .collect();
        Ok(records)
    }

    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>, JobtvError> {
        let col = df.column(name)?.cast(&DataType::String)?;
        let series = col.str()?;
        Ok(series
            .into_iter()
            .map(|v| v.map(str::to_string).unwrap_or_else(|| "∅".to_string()))
            .collect())
    }

    fn int_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, JobtvError> {
        let col = df.column(name)?.cast(&DataType::Int64)?;
        let series = col.i64()?;
        Ok(series.into_iter().map(|v| v.unwrap_or(0)).collect())
    }
}

fn schema_name(column: u16) -> &'static str {
    crate::jobs::column_spec(column)
        .map(|spec| spec.name)
        .unwrap_or_default()
}

impl JobDataSource for FileJobSource {
    fn query(&self, snapshot: &FilterSnapshot) -> QueryResult {
        let now_ms = Utc::now().timestamp_millis();
        let matching: Vec<&JobRecord> = self
            .records
            .iter()
            .filter(|record| {
                snapshot
                    .conditions
                    .iter()
                    .all(|condition| matches_predicate(record, condition, now_ms))
            })
            .collect();

        let total_of_jobs = matching.len() as u64;
        let limit = snapshot
            .jobs_limit
            .map(|l| l.as_usize())
            .unwrap_or(usize::MAX);
        let content: Vec<JobRecord> = matching.into_iter().take(limit).cloned().collect();
        debug!(
            "Query matched {total_of_jobs} of {} records, returning {}",
            self.records.len(),
            content.len()
        );
        QueryResult {
            content,
            total_of_jobs,
        }
    }
}

/// Evaluate one predicate against one record. `now_ms` anchors relative
/// windows. Predicates for unknown columns match everything.
pub fn matches_predicate(record: &JobRecord, predicate: &FilterPredicate, now_ms: i64) -> bool {
    match predicate.column {
        // Exact job id lookup.
        COL_ID => match &predicate.value {
            FilterValue::Exact(term) => term.is_empty() || record.id == *term,
            _ => true,
        },
        // User is a substring match.
        COL_USER => match &predicate.value {
            FilterValue::Exact(term) => record.user.contains(term.as_str()),
            _ => true,
        },
        COL_START_TIME => matches_numeric(record.start_time, &predicate.value, now_ms),
        COL_END_TIME => matches_numeric(record.end_time, &predicate.value, now_ms),
        COL_DURATION => matches_numeric(record.duration, &predicate.value, now_ms),
        _ => true,
    }
}

fn matches_numeric(field_value: i64, value: &FilterValue, now_ms: i64) -> bool {
    match value {
        FilterValue::Exact(term) => match term.parse::<i64>() {
            Ok(n) => field_value == n,
            Err(_) => true,
        },
        FilterValue::NumericRange { min, max } => {
            let v = field_value as f64;
            min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi)
        }
        FilterValue::RelativeWindow(window) => field_value >= now_ms - window.as_millis() as i64,
    }
}
