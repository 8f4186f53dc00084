use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use tracing::{debug, error, info, instrument};
use tracing_error::SpanTrace;

use crate::domain::DTError;
use crate::record::{Record, Role};

/// Supplies the initial ordered records when the table starts.
pub trait RecordSource {
    fn load(&self) -> Result<Vec<Record>, DTError>;
    fn name(&self) -> String;
}

/// The seed records shipped with the binary.
#[derive(Debug, Default)]
pub struct SampleRecords;

impl RecordSource for SampleRecords {
    fn load(&self) -> Result<Vec<Record>, DTError> {
        Ok(vec![
            Record::new(1, "John Doe", 25, Role::Admin),
            Record::new(2, "Jane Smith", 30, Role::User),
            Record::new(3, "Charlie", 28, Role::Supervisor),
            Record::new(4, "David", 35, Role::User),
            Record::new(5, "Eve", 22, Role::Admin),
            Record::new(6, "Frank", 29, Role::Supervisor),
            Record::new(7, "Grace", 27, Role::User),
        ])
    }

    fn name(&self) -> String {
        "sample".to_string()
    }
}

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

/// Records stored in a csv, parquet or arrow file with the columns
/// `id`, `name`, `age` and `role`.
#[derive(Debug)]
pub struct FileRecords {
    path: PathBuf,
}

impl FileRecords {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn detect_file_type(path: &Path) -> Result<FileType, DTError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(DTError::UnknownFileType),
        }
    }

    fn check_file(path: &Path) -> Result<FileType, DTError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DTError::FileNotFound,
            ErrorKind::PermissionDenied => DTError::PermissionDenied,
            _ => DTError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(DTError::LoadingFailed("Not a file!".into()));
        }
        debug!("Data file has {} bytes", metadata.len());
        Self::detect_file_type(path)
    }

    fn scan(path: &Path, file_type: &FileType) -> Result<LazyFrame, PolarsError> {
        match file_type {
            FileType::CSV => LazyCsvReader::new(PlPath::Local(path.into()))
                .with_has_header(true)
                .finish(),
            FileType::PARQUET => {
                LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
            }
            FileType::ARROW => LazyFrame::scan_ipc(
                PlPath::Local(path.into()),
                polars::io::ipc::IpcScanOptions,
                UnifiedScanArgs::default(),
            ),
        }
    }

    fn typed_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Column, DTError> {
        let column = df
            .column(name)
            .map_err(|_| DTError::LoadingFailed(format!("missing column \"{name}\"")))?;
        Ok(column.cast(dtype)?)
    }

    fn invalid(row: usize, reason: impl Into<String>) -> DTError {
        DTError::InvalidRecord {
            row,
            reason: reason.into(),
        }
    }

    fn records_from_frame(df: &DataFrame) -> Result<Vec<Record>, DTError> {
        let ids = Self::typed_column(df, "id", &DataType::Int64)?;
        let names = Self::typed_column(df, "name", &DataType::String)?;
        let ages = Self::typed_column(df, "age", &DataType::Int64)?;
        let roles = Self::typed_column(df, "role", &DataType::String)?;
        let (ids, names, ages, roles) = (ids.i64()?, names.str()?, ages.i64()?, roles.str()?);

        let mut records = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            let id = ids.get(row).ok_or_else(|| Self::invalid(row, "missing id"))?;
            let name = names
                .get(row)
                .ok_or_else(|| Self::invalid(row, "missing name"))?;
            let age = ages
                .get(row)
                .ok_or_else(|| Self::invalid(row, "missing age"))?;
            let role = roles
                .get(row)
                .ok_or_else(|| Self::invalid(row, "missing role"))?
                .parse::<Role>()
                .map_err(|reason| Self::invalid(row, reason))?;
            records.push(Record::new(id, name, age, role));
        }
        Ok(records)
    }

    fn load_records(&self) -> Result<Vec<Record>, DTError> {
        let file_type = Self::check_file(&self.path)?;
        let start_time = Instant::now();
        let df = Self::scan(&self.path, &file_type)?.collect()?;
        let records = Self::records_from_frame(&df)?;
        info!(
            "Loaded {} records from {:?} in {}ms",
            records.len(),
            file_type,
            start_time.elapsed().as_millis()
        );
        Ok(records)
    }
}

impl RecordSource for FileRecords {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Vec<Record>, DTError> {
        self.load_records().inspect_err(|err| {
            error!(%err, span_trace = %SpanTrace::capture(), "Could not load records");
        })
    }

    fn name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string()
    }
}
