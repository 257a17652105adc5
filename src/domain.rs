use std::time::Duration;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobtvError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("loading job data failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("filter store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unknown file type: {0}")]
    UnknownFileType(String),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
}

/// Runtime configuration, set once at startup.
#[derive(Debug, Clone, Setters)]
pub struct JobtvConfig {
    /// How long the controller blocks waiting for terminal events.
    pub event_poll_time: u64,
    /// Settle time before row hover hints are (re)attached to a page.
    pub hint_attach_delay: Duration,
}

impl Default for JobtvConfig {
    fn default() -> Self {
        JobtvConfig {
            event_poll_time: 100,
            hint_attach_delay: Duration::from_millis(1000),
        }
    }
}

/// Messages produced by the controller and consumed by the model.
#[derive(Debug)]
pub enum Message {
    Quit,
    Exit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveBeginning,
    MoveEnd,
    EditIdFilter,
    EditUserFilter,
    CycleDateFilter,
    ClearFilters,
    SortAscending,
    SortDescending,
    CyclePageSize,
    Help,
    RawKey(KeyEvent),
}

/// Which filter field the command input line is currently editing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    IdFilter,
    UserFilter,
}

/// The fixed set of rows-per-page choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
    TwoFifty,
    FiveHundred,
}

impl PageSize {
    pub fn as_usize(&self) -> usize {
        u16::from(*self) as usize
    }

    /// Next choice in the selector, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            PageSize::Ten => PageSize::TwentyFive,
            PageSize::TwentyFive => PageSize::Fifty,
            PageSize::Fifty => PageSize::Hundred,
            PageSize::Hundred => PageSize::TwoFifty,
            PageSize::TwoFifty => PageSize::FiveHundred,
            PageSize::FiveHundred => PageSize::Ten,
        }
    }
}

impl From<PageSize> for u16 {
    fn from(size: PageSize) -> u16 {
        match size {
            PageSize::Ten => 10,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
            PageSize::TwoFifty => 250,
            PageSize::FiveHundred => 500,
        }
    }
}

impl TryFrom<u16> for PageSize {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(PageSize::Ten),
            25 => Ok(PageSize::TwentyFive),
            50 => Ok(PageSize::Fifty),
            100 => Ok(PageSize::Hundred),
            250 => Ok(PageSize::TwoFifty),
            500 => Ok(PageSize::FiveHundred),
            other => Err(format!("{other} is not a valid page size")),
        }
    }
}

pub const HELP_TEXT: &str = "\
jobtv - job table viewer

  q          quit
  Esc        close popup / leave input
  j/k ↓/↑    move row selection
  h/l ←/→    move column selection
  g/G        first / last row
  i          edit id filter (Enter applies, Esc cancels)
  u          edit user filter
  d          cycle date window filter
  c          clear all filters
  s/S        sort selected column ascending / descending
  p          cycle rows per page
  ?          this help
";
