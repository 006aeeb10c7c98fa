// エクスポート → 編集 → 取り込みの往復で、変更されたフィールドだけが修正として出ることを確認する。
use std::collections::BTreeMap;
use std::fs::{self, File};

use recipe_analyzer::domain::CategorizationResult;
use recipe_analyzer::review::{
    CorrectionsReport, ExportFilter, ReviewSummary, TableRow, export_review_table,
    import_corrections,
};

fn result(index: usize) -> CategorizationResult {
    CategorizationResult {
        recipe_index: index,
        record_id: format!("rec-{index}"),
        original_title: format!("Recipe {index}"),
        existing_tags: vec!["Family".to_string(), "Sunday".to_string()],
        is_recipe: true,
        primary_category: Some("Chicken".to_string()),
        cuisine_type: Some("Italian".to_string()),
        dietary_tags: vec!["Gluten-Free".to_string()],
        usage_tags: vec!["Weeknight".to_string(), "Meal Prep".to_string()],
        quality_score: 4,
        title_needs_improvement: false,
        proposed_title: None,
        confidence: 5,
        reasoning: "chicken, \"quoted\" reasoning".to_string(),
        content_summary: Some("Weeknight chicken".to_string()),
        extra: BTreeMap::new(),
    }
}

fn results() -> Vec<CategorizationResult> {
    (0..5).map(result).collect()
}

fn export(results: &[CategorizationResult], filter: ExportFilter) -> (usize, Vec<u8>) {
    let mut buffer = Vec::new();
    let rows = export_review_table(&mut buffer, results, filter).expect("export");
    (rows, buffer)
}

/// エクスポートした表の1行を書き換える。
fn edit(table: &[u8], index: usize, change: impl Fn(&mut TableRow)) -> Vec<u8> {
    let mut reader = csv::Reader::from_reader(table);
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in reader.deserialize::<TableRow>() {
        let mut row = row.expect("exported row");
        if row.recipe_index == index.to_string() {
            change(&mut row);
        }
        writer.serialize(row).expect("write row");
    }
    writer.into_inner().expect("flush")
}

fn import(table: &[u8], baseline: Option<&[CategorizationResult]>) -> CorrectionsReport {
    import_corrections(table, baseline).expect("import")
}

#[test]
fn unedited_export_has_no_corrections() {
    let results = results();
    let (rows, table) = export(&results, ExportFilter::All);

    assert_eq!(rows, 5);
    let without_baseline = import(&table, None);
    let with_baseline = import(&table, Some(results.as_slice()));

    for report in [without_baseline, with_baseline] {
        assert_eq!(report.total_corrections, 0);
        assert!(report.corrections.is_empty());
        assert!(report.import_issues.is_empty());
    }
}

#[test]
fn title_only_edit_yields_exactly_one_title_correction() {
    let results = results();
    let (_, table) = export(&results, ExportFilter::All);
    let edited = edit(&table, 2, |row| row.corrected_title = "Lemon Chicken Piccata".to_string());

    let report = import(&edited, Some(results.as_slice()));

    assert_eq!(report.total_corrections, 1);
    let correction = &report.corrections[0];
    assert_eq!(correction.recipe_index, 2);
    assert_eq!(correction.record_id, "rec-2");
    assert_eq!(correction.original_title, "Recipe 2");
    assert_eq!(
        serde_json::to_value(&correction.corrections).expect("json"),
        serde_json::json!({"title": "Lemon Chicken Piccata"})
    );
}

#[test]
fn unchanged_values_in_corrected_columns_are_ignored() {
    let results = results();
    let (_, table) = export(&results, ExportFilter::All);
    let edited = edit(&table, 1, |row| {
        row.corrected_title = "Recipe 1".to_string();
        row.corrected_category = "Chicken".to_string();
        row.corrected_is_recipe = "True".to_string();
        row.approved = "yes".to_string();
    });

    assert_eq!(import(&edited, Some(results.as_slice())).total_corrections, 0);
}

#[test]
fn issues_only_export_keeps_the_single_non_recipe() {
    let mut results = results();
    results[3].is_recipe = false;

    let (rows, table) = export(&results, ExportFilter::IssuesOnly);

    assert_eq!(rows, 1);
    let mut reader = csv::Reader::from_reader(table.as_slice());
    let exported: Vec<TableRow> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .expect("rows");
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].recipe_index, "3");
    assert_eq!(exported[0].is_recipe, "false");
    assert_eq!(exported[0].usage_tags, "Weeknight; Meal Prep");
}

#[test]
fn malformed_rows_are_reported_with_row_numbers() {
    let results = results();
    let (_, table) = export(&results, ExportFilter::All);
    let edited = edit(&table, 0, |row| row.recipe_index = "zero".to_string());
    let edited = edit(&edited, 4, |row| {
        row.corrected_is_recipe = "false".to_string();
        row.review_notes = "a shopping list".to_string();
    });

    let report = import(&edited, Some(results.as_slice()));

    assert_eq!(report.import_issues.len(), 1);
    assert_eq!(report.import_issues[0].row, 2);
    assert_eq!(report.total_corrections, 1);
    assert_eq!(report.corrections[0].corrections.is_recipe, Some(false));
    assert_eq!(
        report.corrections[0].corrections.review_notes.as_deref(),
        Some("a shopping list")
    );
}

#[test]
fn file_round_trip_and_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("review.csv");
    let mut results = results();
    results[0].title_needs_improvement = true;
    results[0].proposed_title = Some("Crispy Chicken Thighs".to_string());
    results[1].quality_score = 1;

    let file = File::create(&path).expect("create");
    let rows = export_review_table(file, &results, ExportFilter::IssuesOnly).expect("export");
    assert_eq!(rows, 2);

    let exported = fs::read(&path).expect("read");
    let edited = edit(&exported, 0, |row| {
        row.corrected_title = row.proposed_title.clone();
    });
    fs::write(&path, edited).expect("write");

    let report = import_corrections(File::open(&path).expect("open"), Some(results.as_slice()))
        .expect("import");
    assert_eq!(report.total_corrections, 1);
    assert_eq!(
        report.corrections[0].corrections.title.as_deref(),
        Some("Crispy Chicken Thighs")
    );

    let summary = ReviewSummary::build(&results, chrono::Utc::now());
    assert_eq!(summary.review_priorities.title_improvements, 1);
    assert_eq!(summary.review_priorities.low_quality, 1);
    assert_eq!(summary.potential_issues.len(), 2);
}
