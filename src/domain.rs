use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::record::SortKey;

/// Number of records shown on a single page.
pub const PAGE_SIZE: usize = 3;

pub const DEFAULT_EVENT_POLL_TIME: u64 = 100;
pub const DEFAULT_LOG_FILE: &str = "datatable.log";

pub const HELP_TEXT: &str = "\
Search
  / or s        focus the search box
  Enter         keep the search and leave the box
  Esc           clear the search and leave the box

Filter
  r / R         next / previous role

Sort
  1 2 3 4       sort by ID, Name, Age, Role
                (ascending, descending, original order)

Pages
  → n l         next page
  ← p h         previous page
  g / G         first / last page

Other
  y             copy the visible page as CSV
  ?             this help, Esc closes it
  q             quit

Headers, the role selector, the search box and
Prev / Next can also be clicked.";

#[derive(Debug)]
pub enum DTError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidRecord { row: usize, reason: String },
}

impl fmt::Display for DTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DTError::IoError(e) => write!(f, "io error: {e}"),
            DTError::PolarsError(e) => write!(f, "could not read data: {e}"),
            DTError::LoadingFailed(reason) => write!(f, "loading failed: {reason}"),
            DTError::FileNotFound => write!(f, "file not found"),
            DTError::PermissionDenied => write!(f, "permission denied"),
            DTError::UnknownFileType => write!(f, "unknown file type"),
            DTError::InvalidRecord { row, reason } => {
                write!(f, "invalid record in row {}: {reason}", row + 1)
            }
        }
    }
}

impl std::error::Error for DTError {}

impl From<Error> for DTError {
    fn from(err: Error) -> Self {
        DTError::IoError(err)
    }
}

impl From<PolarsError> for DTError {
    fn from(err: PolarsError) -> Self {
        DTError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DTConfig {
    /// Milliseconds the controller waits for a terminal event per loop.
    pub event_poll_time: u64,
    /// Data file to load, the built-in sample records are used if absent.
    #[setters(strip_option)]
    pub data_file: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl Default for DTConfig {
    fn default() -> Self {
        Self {
            event_poll_time: DEFAULT_EVENT_POLL_TIME,
            data_file: None,
            log_file: std::env::temp_dir().join(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    EnterSearch,
    RawKey(KeyEvent),
    NextRole,
    PreviousRole,
    Sort(SortKey),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    CopyPage,
    Resize(u16, u16),
    Click(u16, u16),
}
