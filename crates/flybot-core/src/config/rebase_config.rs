//! Temporal rebase configuration.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::{FlybotError, FlybotResult};
use crate::models::ColumnRef;

/// The anchor column and the columns shifted by the derived offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebaseConfig {
    pub anchor: ColumnRef,
    pub dependents: Vec<ColumnRef>,
}

impl Default for RebaseConfig {
    fn default() -> Self {
        let (table, column) = constants::ANCHOR_COLUMN;
        Self {
            anchor: ColumnRef::new(table, column),
            dependents: constants::DEPENDENT_COLUMNS
                .iter()
                .map(|(t, c)| ColumnRef::new(*t, *c))
                .collect(),
        }
    }
}

impl RebaseConfig {
    pub fn validate(&self) -> FlybotResult<()> {
        if self.dependents.is_empty() {
            return Err(FlybotError::Config(
                "rebase.dependents must name at least one column".to_string(),
            ));
        }
        for col in std::iter::once(&self.anchor).chain(&self.dependents) {
            if col.table.is_empty() || col.column.is_empty() {
                return Err(FlybotError::Config(format!(
                    "empty identifier in column reference '{col}'"
                )));
            }
        }
        Ok(())
    }

    /// Whether the anchor column is also shifted.
    pub fn shifts_anchor(&self) -> bool {
        self.dependents.contains(&self.anchor)
    }
}
