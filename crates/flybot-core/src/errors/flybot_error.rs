use std::path::PathBuf;

/// Coarse error classes surfaced to the tool layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Io,
    Schema,
    Timezone,
    Config,
}

/// Errors produced while acquiring, restoring or rebasing the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum FlybotError {
    // Acquisition
    #[error("fetch from {url} failed with HTTP status {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("fetch from {url} failed: {message}")]
    Fetch { url: String, message: String },

    // Filesystem
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error on {}: {message}", .path.display())]
    Storage { path: PathBuf, message: String },

    // Schema
    #[error("catalog query failed on {}: {message}", .path.display())]
    CatalogQuery { path: PathBuf, message: String },

    #[error("snapshot {} contains no tables", .path.display())]
    EmptyCatalog { path: PathBuf },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    #[error("anchor column {table}.{column} holds no non-null values")]
    AnchorAllNull { table: String, column: String },

    #[error("invalid timestamp in {table}.{column}: {value}")]
    InvalidTimestamp {
        table: String,
        column: String,
        value: String,
    },

    // Time zones
    #[error("time zone error: {0}")]
    Timezone(String),

    // Config
    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl FlybotError {
    /// Wrap a `std::io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an SQLite open/read/write failure with the database path.
    pub fn storage(path: impl Into<PathBuf>, e: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: e.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FetchStatus { .. } | Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Io { .. } | Self::Storage { .. } => ErrorKind::Io,
            Self::CatalogQuery { .. }
            | Self::EmptyCatalog { .. }
            | Self::TableNotFound { .. }
            | Self::ColumnNotFound { .. }
            | Self::AnchorAllNull { .. }
            | Self::InvalidTimestamp { .. } => ErrorKind::Schema,
            Self::Timezone(_) => ErrorKind::Timezone,
            Self::Config(_) | Self::TomlParse(_) => ErrorKind::Config,
        }
    }

    /// Stable code for callers that cannot match on the enum.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FetchStatus { .. } => "FETCH_STATUS",
            Self::Fetch { .. } => "FETCH_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::CatalogQuery { .. } => "CATALOG_QUERY_FAILED",
            Self::EmptyCatalog { .. } => "EMPTY_CATALOG",
            Self::TableNotFound { .. } => "TABLE_NOT_FOUND",
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::AnchorAllNull { .. } => "ANCHOR_ALL_NULL",
            Self::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            Self::Timezone(_) => "TIMEZONE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::TomlParse(_) => "CONFIG_PARSE_ERROR",
        }
    }
}

pub type FlybotResult<T> = Result<T, FlybotError>;
