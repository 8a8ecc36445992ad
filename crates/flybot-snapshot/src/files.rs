//! File primitives: temp-then-rename writes, SQLite side-file cleanup,
//! payload verification.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flybot_core::{FlybotError, FlybotResult};
use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;
use tracing::debug;

/// Suffixes SQLite appends for rollback journals and WAL mode.
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Write `target` through a temp file in the same directory, renamed into
/// place only after `fill` succeeds. Readers see the old or the new file, never
/// a partial one.
pub fn write_atomically<T>(
    target: &Path,
    fill: impl FnOnce(&mut NamedTempFile) -> FlybotResult<T>,
) -> FlybotResult<T> {
    let dir = parent_dir(target);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| FlybotError::io(&dir, e))?;

    let out = fill(&mut tmp)?;

    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| FlybotError::io(tmp.path(), e))?;
    tmp.persist(target)
        .map_err(|e| FlybotError::io(target, e.error))?;
    Ok(out)
}

/// Byte-for-byte copy of `src` over `dst`, atomically.
pub fn copy_atomically(src: &Path, dst: &Path) -> FlybotResult<u64> {
    let mut reader = File::open(src).map_err(|e| FlybotError::io(src, e))?;
    write_atomically(dst, |tmp| {
        let bytes = io::copy(&mut reader, tmp).map_err(|e| FlybotError::io(src, e))?;
        tmp.flush().map_err(|e| FlybotError::io(tmp.path(), e))?;
        Ok(bytes)
    })
}

/// Remove `-journal`, `-wal` and `-shm` files next to `db_path`.
///
/// A hot journal left by an interrupted commit would otherwise be rolled
/// back onto whatever file is later placed at `db_path`.
pub fn remove_sidecars(db_path: &Path) -> FlybotResult<()> {
    for suffix in SIDECAR_SUFFIXES {
        let side = sidecar_path(db_path, suffix);
        match std::fs::remove_file(&side) {
            Ok(()) => debug!(path = %side.display(), "removed stale SQLite side file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(FlybotError::io(side, e)),
        }
    }
    Ok(())
}

/// `PRAGMA quick_check` on a database file. `Err` carries the check output.
pub fn verify_sqlite(path: &Path) -> Result<(), String> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| e.to_string())?;
    let result: String = conn
        .pragma_query_value(None, "quick_check", |row| row.get(0))
        .map_err(|e| e.to_string())?;
    if result == "ok" {
        Ok(())
    } else {
        Err(result)
    }
}

fn sidecar_path(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(db_path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
