use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;
use indexmap::map::Entry;
use thiserror::Error;

use crate::merge::duplicates::{DuplicateReport, IgnoreList, find_duplicates};
use crate::table::{Row, Table, cell};

/// Column identifying an issue across exports.
pub const KEY_FIELD: &str = "issue_number";

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no data found in source table {}", .0.display())]
    EmptySource(PathBuf),
    #[error("source table {} has no \"issue_number\" column", .0.display())]
    MissingKeyField(PathBuf),
}

/// Index key for persistent rows. Rows without an issue number are kept in
/// place but can never be matched by an incoming row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Issue(String),
    Unkeyed(usize),
}

/// Persistent fields in their order, then export fields not yet present.
pub fn union_fields(db_fields: &[String], src_fields: &[String]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::with_capacity(db_fields.len() + src_fields.len());
    for field in db_fields.iter().chain(src_fields) {
        if !fields.contains(field) {
            fields.push(field.clone());
        }
    }
    fields
}

/// Merge an export into the persistent table.
///
/// New issue numbers are appended; existing rows only get their empty cells
/// filled, so manual edits in the persistent table survive. The result has a
/// value for every field of the union, in column order.
pub fn merge_tables(db: Table, src: &Table) -> Table {
    let fields = union_fields(&db.fields, &src.fields);

    let mut index: IndexMap<RowKey, Row> = IndexMap::with_capacity(db.rows.len());
    for (i, row) in db.rows.into_iter().enumerate() {
        let key = cell(&row, KEY_FIELD);
        let key = if key.is_empty() {
            RowKey::Unkeyed(i)
        } else {
            RowKey::Issue(key.to_owned())
        };
        // First occurrence of a duplicated key wins.
        index.entry(key).or_insert(row);
    }

    for src_row in &src.rows {
        let key = cell(src_row, KEY_FIELD);
        if key.is_empty() {
            continue;
        }
        match index.entry(RowKey::Issue(key.to_owned())) {
            Entry::Vacant(slot) => {
                slot.insert(src_row.clone());
            }
            Entry::Occupied(mut slot) => fill_empty_cells(slot.get_mut(), src_row, &src.fields),
        }
    }

    let rows = index
        .into_values()
        .map(|row| conform(row, &fields))
        .collect();
    Table::new(fields, rows)
}

fn fill_empty_cells(db_row: &mut Row, src_row: &Row, src_fields: &[String]) {
    for field in src_fields {
        let incoming = cell(src_row, field);
        if !incoming.is_empty() && cell(db_row, field).is_empty() {
            db_row.insert(field.clone(), incoming.to_owned());
        }
    }
}

/// Reorder `row` to `fields`, filling absent cells with `""`.
fn conform(mut row: Row, fields: &[String]) -> Row {
    fields
        .iter()
        .map(|f| (f.clone(), row.swap_remove(f).unwrap_or_default()))
        .collect()
}

// ---------------------------------------------------------------------------
// File-level merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The persistent table was missing or empty and is now a copy of the export.
    Created,
    Updated,
}

#[derive(Debug)]
pub struct MergeSummary {
    pub outcome: MergeOutcome,
    /// Rows in the persistent table after the merge.
    pub total_rows: usize,
    pub report: DuplicateReport,
}

/// Merge the export at `source` into the persistent table at `db`.
///
/// The persistent table is only written once the source has been validated.
/// Duplicate findings are returned in the summary and never fail the merge.
pub fn merge_files(db: &Path, source: &Path, ignore: &IgnoreList) -> Result<MergeSummary> {
    let src = Table::load(source)?;
    if src.is_empty() {
        return Err(MergeError::EmptySource(source.to_owned()).into());
    }
    if !src.has_field(KEY_FIELD) {
        return Err(MergeError::MissingKeyField(source.to_owned()).into());
    }

    let existing = Table::load(db)?;
    if existing.is_empty() {
        src.save(db)?;
        tracing::debug!("new db created from {}: {}", source.display(), db.display());
        return Ok(MergeSummary {
            outcome: MergeOutcome::Created,
            total_rows: src.rows.len(),
            report: find_duplicates(&src, ignore),
        });
    }

    let merged = merge_tables(existing, &src);
    merged.save(db)?;
    tracing::debug!(
        "db updated: {} ({} rows, source {})",
        db.display(),
        merged.rows.len(),
        source.display()
    );

    Ok(MergeSummary {
        outcome: MergeOutcome::Updated,
        total_rows: merged.rows.len(),
        report: find_duplicates(&merged, ignore),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(fields: &[&str], rows: &[&[&str]]) -> Table {
        let fields: Vec<String> = fields.iter().map(|f| (*f).to_owned()).collect();
        let rows = rows
            .iter()
            .map(|values| {
                fields
                    .iter()
                    .cloned()
                    .zip(values.iter().map(|v| (*v).to_owned()))
                    .collect()
            })
            .collect();
        Table::new(fields, rows)
    }

    fn value<'a>(table: &'a Table, row: usize, field: &str) -> &'a str {
        table.rows[row].get(field).map_or("<absent>", String::as_str)
    }

    #[test]
    fn fills_empty_cells_without_overwriting() {
        let db = table(
            &["issue_number", "domain", "author"],
            &[&["5", "old.com", ""]],
        );
        let src = table(
            &["issue_number", "domain", "author"],
            &[&["5", "new.com", "alice"]],
        );
        let merged = merge_tables(db, &src);
        assert_eq!(merged.rows.len(), 1);
        assert_eq!(value(&merged, 0, "issue_number"), "5");
        assert_eq!(value(&merged, 0, "domain"), "old.com");
        assert_eq!(value(&merged, 0, "author"), "alice");
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let db = table(&["issue_number", "domain"], &[&["5", "   "]]);
        let src = table(&["issue_number", "domain"], &[&["5", " new.com "]]);
        let merged = merge_tables(db, &src);
        assert_eq!(value(&merged, 0, "domain"), "new.com");
    }

    #[test]
    fn appends_new_keys_in_export_order() {
        let db = table(&["issue_number", "note"], &[&["2", "manual"]]);
        let src = table(
            &["issue_number", "domain"],
            &[&["3", "c.com"], &["2", "b.com"], &["1", "a.com"]],
        );
        let merged = merge_tables(db, &src);
        let keys: Vec<&str> = (0..merged.rows.len())
            .map(|i| value(&merged, i, "issue_number"))
            .collect();
        assert_eq!(keys, vec!["2", "3", "1"]);
        assert_eq!(merged.fields, vec!["issue_number", "note", "domain"]);
        assert_eq!(value(&merged, 0, "domain"), "b.com");
        assert_eq!(value(&merged, 1, "note"), "");
    }

    #[test]
    fn keyless_rows_are_kept_and_never_matched() {
        let db = table(
            &["issue_number", "domain"],
            &[&["", "orphan.com"], &["", ""], &["7", ""]],
        );
        let src = table(
            &["issue_number", "domain"],
            &[&["", "dropped.com"], &["7", "seven.com"]],
        );
        let merged = merge_tables(db, &src);
        assert_eq!(merged.rows.len(), 3);
        assert_eq!(value(&merged, 0, "domain"), "orphan.com");
        assert_eq!(value(&merged, 1, "domain"), "");
        assert_eq!(value(&merged, 2, "domain"), "seven.com");
    }

    #[test]
    fn duplicate_db_keys_keep_first_occurrence() {
        let db = table(
            &["issue_number", "domain"],
            &[&["4", "first.com"], &["4", "second.com"]],
        );
        let src = table(&["issue_number", "domain"], &[&["9", "x.com"]]);
        let merged = merge_tables(db, &src);
        assert_eq!(merged.rows.len(), 2);
        assert_eq!(value(&merged, 0, "domain"), "first.com");
    }

    #[test]
    fn every_row_has_every_field() {
        let db = table(&["issue_number", "a"], &[&["1", "x"]]);
        let src = table(&["issue_number", "b"], &[&["2", "y"]]);
        let merged = merge_tables(db, &src);
        for row in &merged.rows {
            let keys: Vec<&String> = row.keys().collect();
            assert_eq!(keys, merged.fields.iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn union_fields_preserves_first_seen_order() {
        let db = vec!["a".to_owned(), "b".to_owned()];
        let src = vec!["c".to_owned(), "a".to_owned(), "d".to_owned()];
        assert_eq!(union_fields(&db, &src), vec!["a", "b", "c", "d"]);
    }
}
