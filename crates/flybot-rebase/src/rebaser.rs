//! Temporal rebasing: one offset derived from the anchor column, applied to
//! every dependent timestamp column.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone};
use flybot_core::{ColumnRef, FlybotError, FlybotResult, RebaseOffset, Timestamp};
use rusqlite::types::Value;
use tracing::debug;

use crate::catalog::{Table, TableSet};

/// Derive the rebase offset: `now` (normalised into the anchor's zone) minus
/// the maximum non-null value of the anchor column.
///
/// Reads only; callers that also shift the anchor column must call this
/// before [`apply_offset`].
pub fn compute_offset(
    tables: &TableSet,
    anchor: &ColumnRef,
    now: Timestamp,
) -> FlybotResult<RebaseOffset> {
    let (table, idx) = resolve(tables, anchor)?;

    let mut max_zoned: Option<DateTime<FixedOffset>> = None;
    let mut max_naive: Option<NaiveDateTime> = None;
    for row in &table.rows {
        match parse_cell(anchor, &row[idx])? {
            None => {}
            Some((Timestamp::Zoned(dt), _)) => {
                if max_zoned.map_or(true, |cur| dt > cur) {
                    max_zoned = Some(dt);
                }
            }
            Some((Timestamp::Naive(n), _)) => {
                if max_naive.map_or(true, |cur| n > cur) {
                    max_naive = Some(n);
                }
            }
        }
    }

    let anchor_value = match (max_zoned, max_naive) {
        (Some(dt), None) => Timestamp::Zoned(dt),
        (None, Some(n)) => Timestamp::Naive(n),
        (None, None) => {
            return Err(FlybotError::AnchorAllNull {
                table: anchor.table.clone(),
                column: anchor.column.clone(),
            })
        }
        (Some(_), Some(_)) => {
            return Err(FlybotError::Timezone(format!(
                "anchor column {anchor} mixes zoned and naive timestamps"
            )))
        }
    };

    let now = normalize_now(&anchor_value, now)?;
    let delta = match (now, anchor_value) {
        (Timestamp::Zoned(n), Timestamp::Zoned(a)) => n.signed_duration_since(a),
        (Timestamp::Naive(n), Timestamp::Naive(a)) => n.signed_duration_since(a),
        _ => {
            return Err(FlybotError::Timezone(format!(
                "cannot reconcile {now} with anchor {anchor_value}"
            )))
        }
    };

    debug!(
        anchor = %anchor_value,
        now = %now,
        offset_secs = delta.num_seconds(),
        "rebase offset computed"
    );
    Ok(RebaseOffset {
        anchor: anchor_value,
        now,
        delta,
    })
}

/// Shift every non-null value of each dependent column by `delta`, in place.
/// Returns the number of cells rewritten.
///
/// Every cell is parsed and shifted before any is written, so on error the
/// tables are left exactly as they were. A column listed twice is shifted once.
pub fn apply_offset(
    tables: &mut TableSet,
    delta: TimeDelta,
    dependents: &[ColumnRef],
) -> FlybotResult<usize> {
    let mut seen = HashSet::new();
    let mut staged: Vec<(&ColumnRef, usize, Vec<(usize, String)>)> = Vec::new();

    for dep in dependents {
        if !seen.insert(dep) {
            continue;
        }
        let (table, idx) = resolve(tables, dep)?;
        let mut updates = Vec::new();
        for (row_no, row) in table.rows.iter().enumerate() {
            let Some((value, layout)) = parse_cell(dep, &row[idx])? else {
                continue;
            };
            let shifted = value.checked_add(delta).ok_or_else(|| {
                FlybotError::Timezone(format!(
                    "shifting {dep} value {value} by {}s leaves the representable range",
                    delta.num_seconds()
                ))
            })?;
            updates.push((row_no, shifted.render(&layout)));
        }
        staged.push((dep, idx, updates));
    }

    let mut shifted = 0;
    for (dep, idx, updates) in staged {
        let Some(table) = tables.get_mut(&dep.table) else {
            continue;
        };
        shifted += updates.len();
        for (row_no, text) in updates {
            table.rows[row_no][idx] = Value::Text(text);
        }
        debug!(column = %dep, "dependent column shifted");
    }
    Ok(shifted)
}

/// Bring `now` into the anchor's zone.
///
/// A zoned `now` is converted; a naive `now` gets the anchor's offset attached
/// to its wall clock. Against a naive anchor only wall clocks are compared.
fn normalize_now(anchor: &Timestamp, now: Timestamp) -> FlybotResult<Timestamp> {
    match (anchor, now) {
        (Timestamp::Zoned(a), Timestamp::Zoned(n)) => {
            Ok(Timestamp::Zoned(n.with_timezone(a.offset())))
        }
        (Timestamp::Zoned(a), Timestamp::Naive(n)) => a
            .offset()
            .from_local_datetime(&n)
            .single()
            .map(Timestamp::Zoned)
            .ok_or_else(|| {
                FlybotError::Timezone(format!(
                    "cannot attach offset {} to {n}",
                    a.offset()
                ))
            }),
        (Timestamp::Naive(_), n) => Ok(Timestamp::Naive(n.wall_clock())),
    }
}

fn resolve<'a>(tables: &'a TableSet, col: &ColumnRef) -> FlybotResult<(&'a Table, usize)> {
    let table = tables
        .get(&col.table)
        .ok_or_else(|| FlybotError::TableNotFound {
            table: col.table.clone(),
        })?;
    let idx = table
        .column_index(&col.column)
        .ok_or_else(|| FlybotError::ColumnNotFound {
            table: col.table.clone(),
            column: col.column.clone(),
        })?;
    Ok((table, idx))
}

fn parse_cell(
    col: &ColumnRef,
    cell: &Value,
) -> FlybotResult<Option<(Timestamp, flybot_core::TimestampLayout)>> {
    let invalid = |value: String| FlybotError::InvalidTimestamp {
        table: col.table.clone(),
        column: col.column.clone(),
        value,
    };
    match cell {
        Value::Null => Ok(None),
        Value::Text(s) => Timestamp::parse(s)
            .map(Some)
            .ok_or_else(|| invalid(s.clone())),
        other => Err(invalid(format!("{other:?}"))),
    }
}
