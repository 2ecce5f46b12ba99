//! SQL Fragment Builder.
//!
//! An immutable value type: each method consumes `self` and returns a new
//! builder, never a mutable builder with a separate execute step. Terminal
//! `to_sql` renders the statement; callers bind parameters themselves in
//! table/column order.
//!
//! Table and column identifiers are checked against a fixed allow-list
//! before they are spliced into the SQL text, since they can never be
//! parameter-bound. Values never are interpolated: only `$1`, `$2`, ...
//! placeholders appear in the rendered text.

use crate::error::ImportError;

const ALLOWED_TABLES: &[&str] = &["coding", "code_system_property", "coding_property"];

const ALLOWED_COLUMNS: &[&str] = &[
    "id",
    "system",
    "code",
    "display",
    "type",
    "uri",
    "description",
    "coding",
    "property",
    "value",
    "target",
];

fn check_identifier(name: &str, allowed: &[&str]) -> Result<(), ImportError> {
    if allowed.contains(&name) {
        Ok(())
    } else {
        Err(ImportError::storage_failure(format!(
            "identifier '{name}' is not on the allow-list"
        )))
    }
}

/// The conflict-handling policy for an `INSERT`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConflictPolicy {
    /// No `ON CONFLICT` clause.
    None,
    /// `ON CONFLICT (keys) DO UPDATE SET ...` over the non-key columns.
    Merge { keys: Vec<String> },
    /// `ON CONFLICT DO NOTHING`.
    Ignore,
}

/// An immutable builder for a single parameterized `INSERT` statement.
///
/// Columns are bound in the order passed to [`InsertBuilder::new`]; the
/// caller is responsible for binding parameters `$1..$n` in that same order.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    conflict: ConflictPolicy,
    returning: Option<String>,
}

impl InsertBuilder {
    /// Starts a builder for an `INSERT INTO table (columns...)`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::StorageFailure`] if `table` or any column is
    /// not on the fixed allow-list.
    pub fn new(table: &str, columns: &[&str]) -> Result<Self, ImportError> {
        check_identifier(table, ALLOWED_TABLES)?;
        for col in columns {
            check_identifier(col, ALLOWED_COLUMNS)?;
        }

        Ok(Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            conflict: ConflictPolicy::None,
            returning: None,
        })
    }

    /// Upsert: insert, or update the non-key columns on conflict over `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::StorageFailure`] if any key is not on the
    /// allow-list or is not one of this builder's columns.
    pub fn on_conflict_merge(mut self, keys: &[&str]) -> Result<Self, ImportError> {
        for key in keys {
            check_identifier(key, ALLOWED_COLUMNS)?;
            if !self.columns.iter().any(|c| c == key) {
                return Err(ImportError::storage_failure(format!(
                    "conflict key '{key}' is not among this insert's columns"
                )));
            }
        }
        self.conflict = ConflictPolicy::Merge {
            keys: keys.iter().map(|k| k.to_string()).collect(),
        };
        Ok(self)
    }

    /// Insert, or discard silently on any unique-constraint violation.
    #[must_use]
    pub fn on_conflict_ignore(mut self) -> Self {
        self.conflict = ConflictPolicy::Ignore;
        self
    }

    /// Have the statement return the given column of the affected row.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::StorageFailure`] if `column` is not on the
    /// allow-list.
    pub fn returning(mut self, column: &str) -> Result<Self, ImportError> {
        check_identifier(column, ALLOWED_COLUMNS)?;
        self.returning = Some(column.to_string());
        Ok(self)
    }

    /// Renders the final parameterized SQL text.
    ///
    /// Parameter placeholders are `$1..$n` in column order; binding them in
    /// that order is the caller's responsibility.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let columns_sql = self.columns.join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "INSERT INTO {} ({columns_sql}) VALUES ({placeholders})",
            self.table
        );

        match &self.conflict {
            ConflictPolicy::None => {}
            ConflictPolicy::Ignore => {
                sql.push_str(" ON CONFLICT DO NOTHING");
            }
            ConflictPolicy::Merge { keys } => {
                let key_cols = keys.join(", ");
                // `id` is server-generated and never reassigned on conflict,
                // even when it isn't part of the conflict key itself.
                let update_cols: Vec<&String> =
                    self.columns
                        .iter()
                        .filter(|c| !keys.contains(c) && c.as_str() != "id")
                        .collect();

                if update_cols.is_empty() {
                    sql.push_str(&format!(" ON CONFLICT ({key_cols}) DO NOTHING"));
                } else {
                    let assignments = update_cols
                        .iter()
                        .map(|c| format!("{c} = EXCLUDED.{c}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    sql.push_str(&format!(" ON CONFLICT ({key_cols}) DO UPDATE SET {assignments}"));
                }
            }
        }

        if let Some(col) = &self.returning {
            sql.push_str(&format!(" RETURNING {col}"));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_table() {
        let err = InsertBuilder::new("drop_me; --", &["id"]).unwrap_err();
        assert!(matches!(err, ImportError::StorageFailure { .. }));
    }

    #[test]
    fn test_rejects_unknown_column() {
        let err = InsertBuilder::new("coding", &["id", "evil"]).unwrap_err();
        assert!(matches!(err, ImportError::StorageFailure { .. }));
    }

    #[test]
    fn test_plain_insert_sql() {
        let sql = InsertBuilder::new("coding", &["id", "system", "code", "display"])
            .unwrap()
            .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO coding (id, system, code, display) VALUES ($1, $2, $3, $4)"
        );
    }

    #[test]
    fn test_merge_on_conflict_sql() {
        let sql = InsertBuilder::new("coding", &["id", "system", "code", "display"])
            .unwrap()
            .on_conflict_merge(&["system", "code"])
            .unwrap()
            .to_sql();
        assert!(sql.contains("ON CONFLICT (system, code) DO UPDATE SET"));
        assert!(sql.contains("display = EXCLUDED.display"));
        assert!(!sql.contains("system = EXCLUDED.system"));
    }

    #[test]
    fn test_ignore_on_conflict_sql() {
        let sql = InsertBuilder::new("coding_property", &["coding", "property", "value"])
            .unwrap()
            .on_conflict_ignore()
            .to_sql();
        assert!(sql.ends_with("ON CONFLICT DO NOTHING"));
    }

    #[test]
    fn test_returning_clause() {
        let sql = InsertBuilder::new("code_system_property", &["id", "system", "code", "type", "uri"])
            .unwrap()
            .on_conflict_ignore()
            .returning("id")
            .unwrap()
            .to_sql();
        assert!(sql.ends_with("RETURNING id"));
    }

    #[test]
    fn test_builder_is_immutable_and_reusable() {
        let base = InsertBuilder::new("coding", &["id", "system", "code"]).unwrap();
        let a = base.clone().on_conflict_ignore();
        let b = base.clone().on_conflict_merge(&["system", "code"]).unwrap();
        assert_ne!(a.to_sql(), b.to_sql());
    }

    #[test]
    fn test_merge_on_conflict_never_reassigns_id() {
        let sql = InsertBuilder::new("coding", &["id", "system", "code", "display"])
            .unwrap()
            .on_conflict_merge(&["system", "code"])
            .unwrap()
            .to_sql();
        assert!(!sql.contains("id = EXCLUDED.id"));
    }

    #[test]
    fn test_conflict_key_must_be_a_selected_column() {
        let err = InsertBuilder::new("coding", &["id", "code"])
            .unwrap()
            .on_conflict_merge(&["system"])
            .unwrap_err();
        assert!(matches!(err, ImportError::StorageFailure { .. }));
    }
}
