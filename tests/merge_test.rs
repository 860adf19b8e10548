use std::fs::File;
use std::path::Path;

use issue_domains::export::EXPORT_FIELDS;
use issue_domains::merge::{IgnoreList, MergeError, MergeOutcome, merge_files};
use issue_domains::table::{Table, TableWriter, cell};

const REPO: &str = "svemailproject/TheySoldMyEmail";

fn write_export(path: &Path, rows: &[[&str; 9]]) {
    let file = File::create(path).unwrap();
    let mut writer = TableWriter::new(file, &EXPORT_FIELDS, true).unwrap();
    for row in rows {
        writer.write_values(row).unwrap();
    }
    writer.finish().unwrap();
}

fn export_row<'a>(number: &'a str, title: &'a str, domain: &'a str, author: &'a str) -> [&'a str; 9] {
    [
        number,
        "https://github.com/svemailproject/TheySoldMyEmail/issues/0",
        title,
        domain,
        if domain.is_empty() { "none" } else { "title" },
        author,
        "2024-01-01T00:00:00Z",
        REPO,
        number,
    ]
}

fn ignore(keys: &[&str]) -> IgnoreList {
    keys.iter().map(|k| (*k).to_owned()).collect()
}

#[test]
fn missing_db_is_created_from_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    write_export(
        &source,
        &[
            export_row("1", "a.com", "a.com", "alice"),
            export_row("2", "b.com", "b.com", "bob"),
        ],
    );

    let summary = merge_files(&db, &source, &ignore(&["98"])).unwrap();
    assert_eq!(summary.outcome, MergeOutcome::Created);
    assert_eq!(summary.total_rows, 2);
    assert!(summary.report.is_clean());
    assert_eq!(Table::load(&db).unwrap(), Table::load(&source).unwrap());
}

#[test]
fn header_only_db_counts_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    write_export(&source, &[export_row("1", "a.com", "a.com", "alice")]);
    write_export(&db, &[]);

    let summary = merge_files(&db, &source, &IgnoreList::new()).unwrap();
    assert_eq!(summary.outcome, MergeOutcome::Created);
    assert_eq!(Table::load(&db).unwrap().rows.len(), 1);
}

#[test]
fn empty_source_is_an_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    write_export(&source, &[]);

    let err = merge_files(&db, &source, &IgnoreList::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MergeError>(),
        Some(MergeError::EmptySource(_))
    ));
    assert!(!db.exists());
}

#[test]
fn missing_source_file_is_an_empty_source() {
    let dir = tempfile::tempdir().unwrap();
    let err = merge_files(
        &dir.path().join("db.csv"),
        &dir.path().join("nope.csv"),
        &IgnoreList::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("no data found"), "{err}");
}

#[test]
fn source_without_key_column_leaves_db_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    std::fs::write(&source, "title;domain\r\nhello;a.com\r\n").unwrap();
    std::fs::copy("tests/fixtures/legacy_db.csv", &db).unwrap();
    let before = std::fs::read(&db).unwrap();

    let err = merge_files(&db, &source, &IgnoreList::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MergeError>(),
        Some(MergeError::MissingKeyField(_))
    ));
    assert_eq!(std::fs::read(&db).unwrap(), before);
}

#[test]
fn legacy_db_keeps_edits_and_gains_new_columns() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    std::fs::copy("tests/fixtures/legacy_db.csv", &db).unwrap();
    write_export(
        &source,
        &[
            export_row("1", "other.com", "other.com", "mallory"),
            export_row("2", "spam.net", "spam.net", "bob"),
            export_row("3", "www.shop.example.com", "shop.example.com", "carol"),
        ],
    );

    let summary = merge_files(&db, &source, &IgnoreList::new()).unwrap();
    assert_eq!(summary.outcome, MergeOutcome::Updated);
    assert_eq!(summary.total_rows, 3);

    let merged = Table::load(&db).unwrap();
    assert_eq!(
        merged.fields,
        vec![
            "issue_number",
            "issue_url",
            "author",
            "domain",
            "root_domain",
            "title",
            "labels",
            "created_at",
            "domain_source",
            "repo",
            "gh_issue_number",
        ]
    );

    let first = &merged.rows[0];
    assert_eq!(cell(first, "domain"), "shop.example.com");
    assert_eq!(cell(first, "author"), "alice");
    assert_eq!(cell(first, "created_at"), "2023-05-01T08:00:00Z");
    assert_eq!(cell(first, "domain_source"), "title");
    assert_eq!(cell(first, "repo"), REPO);

    let second = &merged.rows[1];
    assert_eq!(cell(second, "domain"), "spam.net");
    assert_eq!(cell(second, "labels"), "spam");

    let third = &merged.rows[2];
    assert_eq!(cell(third, "issue_number"), "3");
    assert_eq!(cell(third, "author"), "carol");
    assert_eq!(cell(third, "root_domain"), "");

    let report = summary.report.to_string();
    assert!(report.contains("[OK] no duplicate issue_number found."), "{report}");
    assert!(
        report.contains(&format!("  [{REPO}] shop.example.com  -> issues: 1, 3")),
        "{report}"
    );
}

#[test]
fn ignore_list_hides_domain_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    write_export(
        &source,
        &[
            export_row("1", "a.com", "a.com", "alice"),
            export_row("98", "a.com", "www.a.com", "bob"),
        ],
    );

    let summary = merge_files(&db, &source, &ignore(&["98"])).unwrap();
    assert!(summary.report.is_clean());

    let summary = merge_files(&db, &source, &IgnoreList::new()).unwrap();
    assert!(!summary.report.is_clean());
}

#[test]
fn merging_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    std::fs::copy("tests/fixtures/legacy_db.csv", &db).unwrap();
    write_export(
        &source,
        &[
            export_row("2", "spam.net", "spam.net", "bob"),
            export_row("4", "d.com", "d.com", "dave"),
        ],
    );

    merge_files(&db, &source, &IgnoreList::new()).unwrap();
    let once = std::fs::read(&db).unwrap();
    let summary = merge_files(&db, &source, &IgnoreList::new()).unwrap();
    let twice = std::fs::read(&db).unwrap();

    assert_eq!(once, twice);
    assert_eq!(summary.total_rows, 3);
}

#[test]
fn each_issue_number_appears_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("issues-latest.csv");
    let db = dir.path().join("issues-db.csv");
    std::fs::copy("tests/fixtures/legacy_db.csv", &db).unwrap();
    write_export(
        &source,
        &[
            export_row("1", "x.com", "x.com", "alice"),
            export_row("5", "e.com", "e.com", "erin"),
            export_row("6", "f.com", "f.com", "frank"),
        ],
    );

    merge_files(&db, &source, &IgnoreList::new()).unwrap();
    let merged = Table::load(&db).unwrap();
    let keys: Vec<&str> = merged
        .rows
        .iter()
        .map(|r| cell(r, "issue_number"))
        .collect();
    assert_eq!(keys, vec!["1", "2", "5", "6"]);
}
