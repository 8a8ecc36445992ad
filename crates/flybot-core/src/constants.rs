//! Fixed names for the travel snapshot.

/// Public location of the pristine travel snapshot.
pub const DEFAULT_SNAPSHOT_URL: &str =
    "https://storage.googleapis.com/benchmarks-artifacts/travel-db/travel2.sqlite";

pub const DEFAULT_DB_PATH: &str = "travel2.sqlite";
pub const DEFAULT_BACKUP_PATH: &str = "travel2.backup.sqlite";

/// Download deadline in seconds. 0 disables the deadline.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 300;

pub const FLIGHTS_TABLE: &str = "flights";
pub const BOOKINGS_TABLE: &str = "bookings";

/// Column whose maximum defines "the present" of the frozen dataset.
pub const ANCHOR_COLUMN: (&str, &str) = (FLIGHTS_TABLE, "actual_departure");

/// Columns shifted by the rebase offset. Includes the anchor itself.
pub const DEPENDENT_COLUMNS: [(&str, &str); 5] = [
    (FLIGHTS_TABLE, "scheduled_departure"),
    (FLIGHTS_TABLE, "scheduled_arrival"),
    (FLIGHTS_TABLE, "actual_departure"),
    (FLIGHTS_TABLE, "actual_arrival"),
    (BOOKINGS_TABLE, "book_date"),
];

