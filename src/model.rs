use std::cmp;
use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::datasource::JobDataSource;
use crate::deferred::{DeferredQueue, DeferredTask};
use crate::domain::{CMDMode, JobtvConfig, JobtvError, Message};
use crate::filter::{
    DATE_WINDOW_ANY, DATE_WINDOWS, FilterState, FilterStore, display_value, parse_filter_value,
};
use crate::i18n::Localizer;
use crate::inputter::{InputResult, Inputter};
use crate::jobs::{
    COL_END_TIME, COL_ID, COL_START_TIME, COL_USER, JOB_COLUMNS, JobRecord, ValueType,
    column_spec, format_duration,
};
use crate::sort::{SortDirection, SortState, sort_records};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    CMDINPUT,
    POPUP,
}

/// One filter input of the table, addressed by its column index. The
/// analogue of a filter field in the rendered header row.
#[derive(Debug)]
pub struct FilterInput {
    pub column: u16,
    pub value_type: ValueType,
    /// Raw text as shown in the UI.
    pub value: String,
    /// Whether binding a persisted value commits the predicate immediately.
    pub apply_on_set: bool,
    pub disabled: bool,
    pub show_clear: bool,
}

impl FilterInput {
    fn new(column: u16, value_type: ValueType, apply_on_set: bool) -> Self {
        FilterInput {
            column,
            value_type,
            value: String::new(),
            apply_on_set,
            disabled: false,
            show_clear: false,
        }
    }
}

/// Header cell state handed to the UI.
#[derive(Debug, Clone)]
pub struct ColumnHeader {
    pub title: String,
    pub sort: Option<SortDirection>,
    pub selected: bool,
}

/// Filter input state handed to the UI.
#[derive(Debug, Clone)]
pub struct FilterInputView {
    pub label: String,
    pub value: String,
    pub disabled: bool,
    pub show_clear: bool,
}

/// Read-only snapshot of everything the UI renders.
pub struct UIData {
    pub name: String,
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<Vec<String>>,
    pub row_hints: Vec<String>,
    pub selected_row: usize,
    pub no_data_to_show: bool,
    pub empty_message: String,
    pub filtered_jobs_message: String,
    pub job_fail_message: String,
    pub filters: Vec<FilterInputView>,
    pub jobs_limit: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_hints: Vec::new(),
            selected_row: 0,
            no_data_to_show: true,
            empty_message: String::new(),
            filtered_jobs_message: String::new(),
            job_fail_message: String::new(),
            filters: Vec::new(),
            jobs_limit: 0,
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

/// The jobs table model: reconciles content, filters and sort, and owns all
/// state transitions. Collaborators (store, data source) are injected.
pub struct Model {
    config: JobtvConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    view_id: String,
    store: Box<dyn FilterStore>,
    source: Box<dyn JobDataSource>,
    l10n: Localizer,
    filters: FilterState,
    filter_inputs: Vec<FilterInput>,
    sorting: SortState,
    content: Vec<JobRecord>,
    total_of_jobs: u64,
    curser_row: usize,
    curser_column: usize,
    no_data_to_show: bool,
    filtered_jobs_message: String,
    row_hints: Vec<String>,
    deferred: DeferredQueue,
    table_filtering_complete: bool,
    destroyed: bool,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    show_popup: bool,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
    uidata: UIData,
}

impl Model {
    pub fn init(
        config: &JobtvConfig,
        store: Box<dyn FilterStore>,
        source: Box<dyn JobDataSource>,
        view_id: impl Into<String>,
    ) -> Self {
        let filter_inputs = vec![
            FilterInput::new(COL_ID, ValueType::String, true),
            FilterInput::new(COL_USER, ValueType::String, true),
            FilterInput::new(COL_END_TIME, ValueType::Date, true),
        ];
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            view_id: view_id.into(),
            store,
            source,
            l10n: Localizer::default(),
            filters: FilterState::default(),
            filter_inputs,
            sorting: SortState::default(),
            content: Vec::new(),
            total_of_jobs: 0,
            curser_row: 0,
            curser_column: 0,
            no_data_to_show: true,
            filtered_jobs_message: String::new(),
            row_hints: Vec::new(),
            deferred: DeferredQueue::default(),
            table_filtering_complete: false,
            destroyed: false,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            show_popup: false,
            popup_message: String::new(),
            status_message: "Started jobtv!".to_string(),
            last_status_message_update: Instant::now(),
            uidata: UIData::empty(),
        };
        model.update_uidata();
        model
    }

    /// Bind the persisted filter snapshot for this view, then load content
    /// and establish the default sort. Run once before the first frame.
    pub fn initialize(&mut self) {
        match self.store.get(&self.view_id) {
            Some(snapshot) => {
                if let Some(limit) = snapshot.jobs_limit {
                    self.filters.set_jobs_limit(limit);
                }
                for condition in snapshot.conditions {
                    let Some(input) = self
                        .filter_inputs
                        .iter_mut()
                        .find(|i| i.column == condition.column)
                    else {
                        // Schema drift: the stored column no longer has an
                        // input. Skip the entry, keep the rest.
                        debug!(
                            "Skipping persisted filter for unknown column {}",
                            condition.column
                        );
                        continue;
                    };
                    input.value = display_value(&condition.value);
                    if input.apply_on_set {
                        self.filters.upsert(condition.clone());
                    }
                    // The clear affordance is revealed after the field values
                    // are applied, not before.
                    self.deferred.next_tick(DeferredTask::RevealClearFilter {
                        column: condition.column,
                    });
                }
            }
            None => self.reset_filter_inputs(),
        }
        self.on_apply_id_filter();
        // From here on field changes are user edits and get written back.
        self.table_filtering_complete = true;

        self.refresh_content();
        self.set_default_sort();
    }

    /// If no sort is active at first render, most-recent jobs surface first.
    fn set_default_sort(&mut self) {
        if self.sorting.active().is_none() {
            self.sorting.set_sort(COL_START_TIME, SortDirection::Desc);
            self.apply_sort();
            self.update_uidata();
        }
    }

    /// A filter field edit was committed. Ignored until initialization is
    /// complete so that binding a snapshot does not write itself back.
    pub fn on_filter_field_changed(&mut self, column: u16, raw: &str) {
        if !self.table_filtering_complete {
            trace!("Ignoring filter change for column {column} before initialization");
            return;
        }
        let Some(value_type) = self
            .filter_inputs
            .iter()
            .find(|i| i.column == column)
            .map(|i| i.value_type)
        else {
            debug!("Filter change for column {column} without a filter input");
            return;
        };
        let value = parse_filter_value(raw, value_type);
        self.filters.set(column, value, value_type);

        if let Some(input) = self.filter_inputs.iter_mut().find(|i| i.column == column) {
            input.value = raw.trim().to_string();
            input.show_clear = !input.value.is_empty() && input.value != DATE_WINDOW_ANY;
        }

        self.on_apply_id_filter();
        self.persist_filters();
        self.refresh_content();
    }

    /// Id-filter exclusivity: an exact id lookup supersedes all other
    /// predicates. Other inputs are cleared at once, their controls are
    /// disabled (or re-enabled) on the next tick.
    fn on_apply_id_filter(&mut self) {
        let applied = self.filters.is_id_filter_applied();
        if applied {
            for input in self.filter_inputs.iter_mut() {
                if input.column == COL_ID {
                    continue;
                }
                input.value.clear();
                input.show_clear = false;
                self.filters.remove(input.column);
            }
        }
        self.deferred
            .next_tick(DeferredTask::SetOtherFiltersDisabled { disabled: applied });
    }

    fn persist_filters(&mut self) {
        if let Err(e) = self.store.put(&self.view_id, &self.filters.snapshot()) {
            // Non-fatal: the in-memory state stays authoritative.
            warn!("Persisting filter snapshot for view {} failed: {e}", self.view_id);
        }
    }

    /// Re-query the data source and reconcile sort, derived state and the
    /// page affordances.
    fn refresh_content(&mut self) {
        let result = self.source.query(&self.filters.snapshot());
        self.content = result.content;
        self.total_of_jobs = result.total_of_jobs;
        self.apply_sort();
        self.curser_row = if self.content.is_empty() {
            0
        } else {
            cmp::min(self.curser_row, self.content.len() - 1)
        };
        self.on_content_changed();
        self.on_page_content_changed();
        self.update_uidata();
    }

    fn apply_sort(&mut self) {
        if let Some(spec) = self.sorting.active() {
            sort_records(&mut self.content, spec);
        }
    }

    /// Derived view state follows the content length in the same step, so
    /// the empty flag never reads stale.
    fn on_content_changed(&mut self) {
        self.no_data_to_show = self.content.is_empty();
        self.filtered_jobs_message = self.l10n.format(
            "jobs.filtered.jobs",
            &[
                &self.content.len().to_string(),
                &self.total_of_jobs.to_string(),
            ],
        );
    }

    /// The visible page changed. Hover hints are re-attached after a settle
    /// delay, never synchronously with the content mutation.
    fn on_page_content_changed(&mut self) {
        if self.destroyed {
            return;
        }
        self.row_hints.clear();
        self.deferred
            .after(DeferredTask::AttachRowHints, self.config.hint_attach_delay);
    }

    // Replaces any previously attached hints, so repeated triggering never
    // duplicates them.
    fn attach_row_hints(&mut self) {
        if self.destroyed {
            return;
        }
        self.row_hints = self
            .content
            .iter()
            .map(|r| format!("{} by {} took {}", r.id, r.user, format_duration(r.duration)))
            .collect();
        trace!("Attached {} row hints", self.row_hints.len());
    }

    /// Synchronous, unconditional teardown. Pending deferred work is
    /// cancelled, attached affordances are dropped.
    pub fn destroy(&mut self) {
        self.deferred.cancel_all();
        self.row_hints.clear();
        self.destroyed = true;
    }

    /// Drain deferred work that has come due. Called once per frame, before
    /// events are handled.
    pub fn tick(&mut self, now: Instant) {
        if self.deferred.is_empty() {
            return;
        }
        let due = self.deferred.drain_due(now);
        if due.is_empty() {
            return;
        }
        for task in due {
            trace!("Running deferred task {task:?}");
            match task {
                DeferredTask::RevealClearFilter { column } => {
                    if let Some(input) =
                        self.filter_inputs.iter_mut().find(|i| i.column == column)
                    {
                        input.show_clear = true;
                    }
                }
                DeferredTask::SetOtherFiltersDisabled { disabled } => {
                    for input in self.filter_inputs.iter_mut() {
                        if input.column != COL_ID {
                            input.disabled = disabled;
                        }
                    }
                }
                DeferredTask::AttachRowHints => self.attach_row_hints(),
            }
        }
        self.update_uidata();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), JobtvError> {
        self.tick(Instant::now());

        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MoveLeft => self.move_column_left(),
                    Message::MoveRight => self.move_column_right(),
                    Message::MoveBeginning => self.move_selection_beginning(),
                    Message::MoveEnd => self.move_selection_end(),
                    Message::EditIdFilter => self.enter_cmd_mode(CMDMode::IdFilter),
                    Message::EditUserFilter => self.enter_cmd_mode(CMDMode::UserFilter),
                    Message::CycleDateFilter => self.cycle_date_filter(),
                    Message::ClearFilters => self.clear_all_filters(),
                    Message::SortAscending => self.sort_selected_column(SortDirection::Asc),
                    Message::SortDescending => self.sort_selected_column(SortDirection::Desc),
                    Message::CyclePageSize => self.cycle_page_size(),
                    Message::Help => self.show_help(),
                    _ => (),
                },
                Modus::CMDINPUT => {
                    if let Message::RawKey(key) = msg {
                        self.raw_input(key);
                    }
                }
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Help => self.close_popup(),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// True while the cmd input line consumes raw key events.
    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    // -------------------- Control handling functions ---------------------- //

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        let column = match mode {
            CMDMode::IdFilter => COL_ID,
            CMDMode::UserFilter => COL_USER,
        };
        if self.input_disabled(column) {
            self.set_status_message("Other filters are disabled while an id filter is applied");
            return;
        }
        trace!("Entering filter input mode {mode:?}");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        if let Some(input) = self.filter_inputs.iter().find(|i| i.column == column) {
            self.input.set(&input.value);
        }
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
        self.update_uidata();
    }

    fn handle_cmd_input(&mut self) {
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let result = self.last_input.clone();
        let mode = self.cmd_mode.take();
        if result.canceled {
            return;
        }
        match mode {
            Some(CMDMode::IdFilter) => {
                self.on_filter_field_changed(COL_ID, &result.input);
                self.set_status_message(format!("Applied id filter \"{}\"", result.input.trim()));
            }
            Some(CMDMode::UserFilter) => {
                self.on_filter_field_changed(COL_USER, &result.input);
                self.set_status_message(format!(
                    "Applied user filter \"{}\"",
                    result.input.trim()
                ));
            }
            None => info!("Cmd mode is none!"),
        }
    }

    fn input_disabled(&self, column: u16) -> bool {
        self.filter_inputs
            .iter()
            .find(|i| i.column == column)
            .is_some_and(|i| i.disabled)
    }

    fn cycle_date_filter(&mut self) {
        if self.input_disabled(COL_END_TIME) {
            self.set_status_message("Other filters are disabled while an id filter is applied");
            return;
        }
        let current = self
            .filter_inputs
            .iter()
            .find(|i| i.column == COL_END_TIME)
            .map(|i| i.value.clone())
            .unwrap_or_default();
        let next = next_window_label(&current);
        self.on_filter_field_changed(COL_END_TIME, next);
        self.set_status_message(format!("Date window: {next}"));
    }

    fn clear_all_filters(&mut self) {
        self.reset_filter_inputs();
        self.on_apply_id_filter();
        self.persist_filters();
        self.refresh_content();
        self.set_status_message("Cleared all filters");
    }

    // Used both by initialization without a snapshot and by the explicit
    // clear command; does not persist by itself.
    fn reset_filter_inputs(&mut self) {
        for input in self.filter_inputs.iter_mut() {
            input.value.clear();
            input.show_clear = false;
        }
        self.filters.clear();
    }

    fn sort_selected_column(&mut self, direction: SortDirection) {
        let spec = JOB_COLUMNS[self.curser_column];
        self.sorting.set_sort(spec.column, direction);
        self.apply_sort();
        self.update_uidata();
        self.set_status_message(format!(
            "Sorted by {} {}",
            self.l10n.t(spec.display_key),
            match direction {
                SortDirection::Asc => "ascending",
                SortDirection::Desc => "descending",
            }
        ));
    }

    fn cycle_page_size(&mut self) {
        let next = self.filters.jobs_limit().next();
        self.filters.set_jobs_limit(next);
        self.persist_filters();
        self.refresh_content();
        self.set_status_message(format!("Showing up to {} jobs per page", next.as_usize()));
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.show_popup = true;
        self.popup_message = crate::domain::HELP_TEXT.to_string();
        self.update_uidata();
    }

    fn close_popup(&mut self) {
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.show_popup = false;
        self.update_uidata();
    }

    fn move_selection_down(&mut self, size: usize) {
        if !self.content.is_empty() {
            self.curser_row = cmp::min(self.curser_row + size, self.content.len() - 1);
            self.update_uidata();
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.curser_row = self.curser_row.saturating_sub(size);
        self.update_uidata();
    }

    fn move_selection_beginning(&mut self) {
        self.curser_row = 0;
        self.update_uidata();
    }

    fn move_selection_end(&mut self) {
        if !self.content.is_empty() {
            self.curser_row = self.content.len() - 1;
            self.update_uidata();
        }
    }

    fn move_column_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
        self.update_uidata();
    }

    fn move_column_right(&mut self) {
        self.curser_column = cmp::min(self.curser_column + 1, JOB_COLUMNS.len() - 1);
        self.update_uidata();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    fn update_uidata(&mut self) {
        let columns = JOB_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, spec)| ColumnHeader {
                title: self.l10n.t(spec.display_key),
                sort: self.sorting.indicator(spec.column),
                selected: idx == self.curser_column,
            })
            .collect();
        let rows = self
            .content
            .iter()
            .map(|record| {
                JOB_COLUMNS
                    .iter()
                    .map(|spec| record.cell(spec.column))
                    .collect()
            })
            .collect();
        let filters = self
            .filter_inputs
            .iter()
            .map(|input| FilterInputView {
                label: column_spec(input.column)
                    .map(|spec| self.l10n.t(spec.display_key))
                    .unwrap_or_default(),
                value: input.value.clone(),
                disabled: input.disabled,
                show_clear: input.show_clear,
            })
            .collect();

        self.uidata = UIData {
            name: self.view_id.clone(),
            columns,
            rows,
            row_hints: self.row_hints.clone(),
            selected_row: self.curser_row,
            no_data_to_show: self.no_data_to_show,
            empty_message: self.l10n.t("jobs.nothing.to.show"),
            filtered_jobs_message: self.filtered_jobs_message.clone(),
            job_fail_message: self.l10n.t("jobs.table.job.fail"),
            filters,
            jobs_limit: self.filters.jobs_limit().as_usize(),
            show_popup: self.show_popup,
            popup_message: self.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }
}

fn next_window_label(current: &str) -> &'static str {
    let position = DATE_WINDOWS
        .iter()
        .position(|(label, _)| *label == current);
    match position {
        // After the last window, wrap back to "Any".
        Some(idx) if idx + 1 == DATE_WINDOWS.len() => DATE_WINDOW_ANY,
        Some(idx) => DATE_WINDOWS[idx + 1].0,
        None => DATE_WINDOWS[0].0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::{FileJobSource, QueryResult};
    use crate::domain::PageSize;
    use crate::filter::{FilterPredicate, FilterSnapshot, FilterValue, MemoryStore};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// MemoryStore that stays inspectable after being moved into the model.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl FilterStore for SharedStore {
        fn get(&self, view_id: &str) -> Option<FilterSnapshot> {
            self.0.borrow().get(view_id)
        }

        fn put(&mut self, view_id: &str, snapshot: &FilterSnapshot) -> Result<(), JobtvError> {
            self.0.borrow_mut().put(view_id, snapshot)
        }
    }

    struct FailingStore;

    impl FilterStore for FailingStore {
        fn get(&self, _view_id: &str) -> Option<FilterSnapshot> {
            None
        }

        fn put(&mut self, _view_id: &str, _s: &FilterSnapshot) -> Result<(), JobtvError> {
            Err(JobtvError::LoadingFailed("store unavailable".into()))
        }
    }

    /// Canned query results, independent of any filtering.
    struct StubSource {
        content: Vec<JobRecord>,
        total: u64,
    }

    impl JobDataSource for StubSource {
        fn query(&self, _snapshot: &FilterSnapshot) -> QueryResult {
            QueryResult {
                content: self.content.clone(),
                total_of_jobs: self.total,
            }
        }
    }

    fn record(id: &str, user: &str, start: i64) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            user: user.to_string(),
            start_time: start,
            end_time: start + 500,
            duration: 500,
        }
    }

    fn sample_records() -> Vec<JobRecord> {
        vec![
            record("job_1", "alice", 1_000),
            record("job_2", "bob", 3_000),
            record("job_3", "alice", 2_000),
        ]
    }

    fn fast_config() -> JobtvConfig {
        JobtvConfig::default().hint_attach_delay(Duration::ZERO)
    }

    fn model_with(store: SharedStore) -> Model {
        Model::init(
            &fast_config(),
            Box::new(store),
            Box::new(FileJobSource::from_records(sample_records())),
            "jobs",
        )
    }

    fn user_predicate(term: &str) -> FilterPredicate {
        FilterPredicate {
            column: COL_USER,
            value: FilterValue::Exact(term.to_string()),
            value_type: ValueType::String,
        }
    }

    fn input<'a>(model: &'a Model, column: u16) -> &'a FilterInput {
        model
            .filter_inputs
            .iter()
            .find(|i| i.column == column)
            .unwrap()
    }

    #[test]
    fn initialize_applies_persisted_snapshot() {
        let store = SharedStore::default();
        store
            .0
            .borrow_mut()
            .put(
                "jobs",
                &FilterSnapshot {
                    conditions: vec![user_predicate("alice")],
                    jobs_limit: Some(PageSize::TwentyFive),
                },
            )
            .unwrap();

        let mut model = model_with(store.clone());
        model.initialize();

        assert_eq!(input(&model, COL_USER).value, "alice");
        assert!(model.filters.get(COL_USER).is_some());
        assert_eq!(model.filters.jobs_limit(), PageSize::TwentyFive);
        // Content was filtered by the data source.
        assert_eq!(model.content.len(), 2);
        // The clear affordance is revealed on the next tick, not inline.
        assert!(!input(&model, COL_USER).show_clear);
        model.tick(Instant::now());
        assert!(input(&model, COL_USER).show_clear);
        // Binding the snapshot must not have written it back: still one put.
        let stored = store.0.borrow().get("jobs").unwrap();
        assert_eq!(stored.conditions, vec![user_predicate("alice")]);
    }

    #[test]
    fn initialize_skips_predicates_for_unknown_columns() {
        let store = SharedStore::default();
        store
            .0
            .borrow_mut()
            .put(
                "jobs",
                &FilterSnapshot {
                    conditions: vec![
                        FilterPredicate {
                            column: 99,
                            value: FilterValue::Exact("stale".into()),
                            value_type: ValueType::String,
                        },
                        user_predicate("bob"),
                    ],
                    jobs_limit: None,
                },
            )
            .unwrap();

        let mut model = model_with(store);
        model.initialize();

        // The stale entry is skipped without affecting the others.
        assert_eq!(model.filters.conditions().len(), 1);
        assert_eq!(input(&model, COL_USER).value, "bob");
        assert_eq!(model.content.len(), 1);
    }

    #[test]
    fn initialize_without_snapshot_resets_inputs() {
        let mut model = model_with(SharedStore::default());
        model.initialize();

        for input in model.filter_inputs.iter() {
            assert!(input.value.is_empty());
            assert!(!input.show_clear);
        }
        assert!(model.filters.conditions().is_empty());
        assert_eq!(model.content.len(), 3);
    }

    #[test]
    fn snapshot_values_are_not_committed_without_apply_on_set() {
        let store = SharedStore::default();
        store
            .0
            .borrow_mut()
            .put(
                "jobs",
                &FilterSnapshot {
                    conditions: vec![user_predicate("alice")],
                    jobs_limit: None,
                },
            )
            .unwrap();

        let mut model = model_with(store);
        for input in model.filter_inputs.iter_mut() {
            input.apply_on_set = false;
        }
        model.initialize();

        // The value is bound to the input but no predicate became active.
        assert_eq!(input(&model, COL_USER).value, "alice");
        assert!(model.filters.conditions().is_empty());
    }

    #[test]
    fn filter_changes_before_initialization_are_ignored() {
        let store = SharedStore::default();
        let mut model = model_with(store.clone());

        model.on_filter_field_changed(COL_USER, "alice");

        assert!(model.filters.conditions().is_empty());
        assert!(store.0.borrow().get("jobs").is_none());
    }

    #[test]
    fn filter_change_persists_the_snapshot_idempotently() {
        let store = SharedStore::default();
        let mut model = model_with(store.clone());
        model.initialize();

        model.on_filter_field_changed(COL_USER, "alice");
        let once = store.0.borrow().get("jobs").unwrap();

        model.on_filter_field_changed(COL_USER, "alice");
        let twice = store.0.borrow().get("jobs").unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.conditions, vec![user_predicate("alice")]);
        assert_eq!(model.content.len(), 2);
    }

    #[test]
    fn persistence_failure_keeps_in_memory_state_authoritative() {
        let mut model = Model::init(
            &fast_config(),
            Box::new(FailingStore),
            Box::new(FileJobSource::from_records(sample_records())),
            "jobs",
        );
        model.initialize();

        model.on_filter_field_changed(COL_USER, "bob");

        assert!(model.filters.get(COL_USER).is_some());
        assert_eq!(model.content.len(), 1);
    }

    #[test]
    fn id_filter_clears_and_disables_other_inputs() {
        let mut model = model_with(SharedStore::default());
        model.initialize();
        model.tick(Instant::now());

        model.on_filter_field_changed(COL_USER, "alice");
        assert_eq!(input(&model, COL_USER).value, "alice");

        model.on_filter_field_changed(COL_ID, "job_2");
        // Other values are cleared at once, the controls disable next tick.
        assert_eq!(input(&model, COL_USER).value, "");
        assert!(model.filters.get(COL_USER).is_none());
        assert!(!input(&model, COL_USER).disabled);
        model.tick(Instant::now());
        assert!(input(&model, COL_USER).disabled);
        assert!(input(&model, COL_END_TIME).disabled);
        assert_eq!(model.content.len(), 1);

        // Clearing the id filter re-enables the other inputs; their old
        // values are not restored.
        model.on_filter_field_changed(COL_ID, "");
        model.tick(Instant::now());
        assert!(!input(&model, COL_USER).disabled);
        assert_eq!(input(&model, COL_USER).value, "");
        assert!(model.filters.conditions().is_empty());

        // And the rule holds again on the next transition to applied.
        model.on_filter_field_changed(COL_ID, "job_1");
        model.tick(Instant::now());
        assert!(input(&model, COL_USER).disabled);
    }

    #[test]
    fn empty_state_follows_content_length() {
        let mut model = Model::init(
            &fast_config(),
            Box::new(SharedStore::default()),
            Box::new(StubSource {
                content: Vec::new(),
                total: 0,
            }),
            "jobs",
        );
        model.initialize();
        assert!(model.no_data_to_show);
        assert_eq!(model.filtered_jobs_message, "0 of 0 jobs showing");

        model.source = Box::new(StubSource {
            content: sample_records(),
            total: 30,
        });
        model.refresh_content();
        assert!(!model.no_data_to_show);
        assert_eq!(model.filtered_jobs_message, "3 of 30 jobs showing");
        assert!(!model.get_uidata().no_data_to_show);
    }

    #[test]
    fn default_sort_is_start_time_descending() {
        let mut model = model_with(SharedStore::default());
        model.initialize();

        assert_eq!(
            model.sorting.indicator(COL_START_TIME),
            Some(SortDirection::Desc)
        );
        let ids: Vec<&str> = model.content.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["job_2", "job_3", "job_1"]);
    }

    #[test]
    fn default_sort_does_not_override_an_active_sort() {
        let mut model = model_with(SharedStore::default());
        model.sorting.set_sort(COL_USER, SortDirection::Asc);
        model.initialize();
        assert_eq!(model.sorting.indicator(COL_USER), Some(SortDirection::Asc));
        assert_eq!(model.sorting.indicator(COL_START_TIME), None);
    }

    #[test]
    fn row_hints_attach_after_the_settle_delay_without_duplicates() {
        let config = JobtvConfig::default().hint_attach_delay(Duration::from_millis(50));
        let mut model = Model::init(
            &config,
            Box::new(SharedStore::default()),
            Box::new(FileJobSource::from_records(sample_records())),
            "jobs",
        );
        model.initialize();

        // Not attached synchronously with the content change.
        assert!(model.row_hints.is_empty());
        model.tick(Instant::now());
        assert!(model.row_hints.is_empty());

        // Rapid repeated page changes collapse into a single attachment.
        model.refresh_content();
        model.refresh_content();
        model.tick(Instant::now() + Duration::from_millis(100));
        assert_eq!(model.row_hints.len(), model.content.len());

        model.tick(Instant::now() + Duration::from_millis(200));
        assert_eq!(model.row_hints.len(), model.content.len());
    }

    #[test]
    fn destroy_detaches_hints_and_cancels_pending_work() {
        let mut model = model_with(SharedStore::default());
        model.initialize();
        model.tick(Instant::now());
        assert_eq!(model.row_hints.len(), model.content.len());

        model.refresh_content();
        model.destroy();

        assert!(model.row_hints.is_empty());
        // A pending attachment cancelled by teardown stays cancelled.
        model.tick(Instant::now() + Duration::from_secs(5));
        assert!(model.row_hints.is_empty());
    }

    #[test]
    fn cycling_the_date_window_walks_the_selector() {
        let mut model = model_with(SharedStore::default());
        model.initialize();

        model.cycle_date_filter();
        assert_eq!(input(&model, COL_END_TIME).value, "Past 1 hour");
        assert!(model.filters.get(COL_END_TIME).is_some());

        for _ in 0..6 {
            model.cycle_date_filter();
        }
        assert_eq!(input(&model, COL_END_TIME).value, "Any");
        assert!(model.filters.get(COL_END_TIME).is_none());
    }

    #[test]
    fn page_size_change_persists_and_requeries() {
        let store = SharedStore::default();
        let mut model = model_with(store.clone());
        model.initialize();

        model.cycle_page_size();

        assert_eq!(model.filters.jobs_limit(), PageSize::TwentyFive);
        let stored = store.0.borrow().get("jobs").unwrap();
        assert_eq!(stored.jobs_limit, Some(PageSize::TwentyFive));
    }

    #[test]
    fn uidata_reflects_filters_sort_and_counts() {
        let mut model = model_with(SharedStore::default());
        model.initialize();
        model.on_filter_field_changed(COL_USER, "alice");

        let uidata = model.get_uidata();
        assert_eq!(uidata.rows.len(), 2);
        assert_eq!(uidata.filtered_jobs_message, "2 of 2 jobs showing");
        assert_eq!(uidata.columns.len(), JOB_COLUMNS.len());
        assert_eq!(uidata.columns[2].sort, Some(SortDirection::Desc));
        assert_eq!(uidata.filters[1].value, "alice");
        assert_eq!(uidata.job_fail_message, "Job failed to run");
    }
}
