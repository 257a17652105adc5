use std::cmp::Ordering;

use tracing::error;

use crate::jobs::{COL_DURATION, COL_END_TIME, COL_ID, COL_START_TIME, COL_USER, JobRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The single active sort: one column, one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: u16,
    pub direction: SortDirection,
}

/// Exactly one column is sortable at a time. Setting a new sort replaces
/// the previous one, which also clears its indicator.
#[derive(Debug, Default)]
pub struct SortState {
    active: Option<SortSpec>,
}

impl SortState {
    pub fn active(&self) -> Option<&SortSpec> {
        self.active.as_ref()
    }

    pub fn set_sort(&mut self, column: u16, direction: SortDirection) {
        self.active = Some(SortSpec { column, direction });
    }

    /// Indicator state for one column's sort affordance.
    pub fn indicator(&self, column: u16) -> Option<SortDirection> {
        self.active
            .filter(|spec| spec.column == column)
            .map(|spec| spec.direction)
    }
}

fn compare_by_column(a: &JobRecord, b: &JobRecord, column: u16) -> Ordering {
    match column {
        COL_ID => a.id.cmp(&b.id),
        COL_USER => a.user.cmp(&b.user),
        COL_START_TIME => a.start_time.cmp(&b.start_time),
        COL_END_TIME => a.end_time.cmp(&b.end_time),
        COL_DURATION => a.duration.cmp(&b.duration),
        unknown => {
            error!("Trying to sort by unknown column {unknown}!");
            Ordering::Equal
        }
    }
}

/// Order records by the active sort column. Stable, so equal keys keep the
/// order the data source supplied.
pub fn sort_records(records: &mut [JobRecord], spec: &SortSpec) {
    records.sort_by(|a, b| {
        let ordering = compare_by_column(a, b, spec.column);
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, user: &str, start: i64) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            user: user.to_string(),
            start_time: start,
            end_time: start + 100,
            duration: 100,
        }
    }

    #[test]
    fn setting_a_sort_replaces_the_previous_one() {
        let mut state = SortState::default();
        state.set_sort(COL_USER, SortDirection::Asc);
        state.set_sort(COL_START_TIME, SortDirection::Desc);

        assert_eq!(state.indicator(COL_USER), None);
        assert_eq!(state.indicator(COL_START_TIME), Some(SortDirection::Desc));
        assert_eq!(
            state.active(),
            Some(&SortSpec {
                column: COL_START_TIME,
                direction: SortDirection::Desc
            })
        );
    }

    #[test]
    fn start_time_desc_surfaces_most_recent_first() {
        let mut records = vec![
            record("a", "x", 100),
            record("b", "x", 300),
            record("c", "x", 200),
        ];
        sort_records(
            &mut records,
            &SortSpec {
                column: COL_START_TIME,
                direction: SortDirection::Desc,
            },
        );
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn string_columns_sort_lexicographically() {
        let mut records = vec![
            record("j2", "carol", 1),
            record("j1", "alice", 2),
            record("j3", "bob", 3),
        ];
        sort_records(
            &mut records,
            &SortSpec {
                column: COL_USER,
                direction: SortDirection::Asc,
            },
        );
        let users: Vec<&str> = records.iter().map(|r| r.user.as_str()).collect();
        assert_eq!(users, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn equal_keys_keep_source_order() {
        let mut records = vec![
            record("first", "same", 10),
            record("second", "same", 10),
            record("third", "same", 10),
        ];
        sort_records(
            &mut records,
            &SortSpec {
                column: COL_START_TIME,
                direction: SortDirection::Desc,
            },
        );
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn unknown_sort_column_leaves_order_unchanged() {
        let mut records = vec![record("a", "x", 2), record("b", "x", 1)];
        sort_records(
            &mut records,
            &SortSpec {
                column: 42,
                direction: SortDirection::Asc,
            },
        );
        assert_eq!(records[0].id, "a");
    }
}
