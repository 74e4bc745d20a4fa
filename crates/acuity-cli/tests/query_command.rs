//! Integration tests for the query command.

use std::path::Path;

use acuity_cli::cli::QueryArgs;
use acuity_cli::commands::{load_config, run_query};
use acuity_cli::summary::counts_line;
use acuity_filter::Domain;
use tempfile::TempDir;

fn write(dir: &Path, file: &str, contents: &str) {
    std::fs::write(dir.join(file), contents).unwrap();
}

fn dataset() -> TempDir {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("STUDY1");
    std::fs::create_dir(&dir).unwrap();
    write(
        &dir,
        "population.csv",
        "subject_id,sex,first_treatment_date\nS1,Male,2021-01-10\nS2,Female,2021-01-11\n",
    );
    write(
        &dir,
        "ae.csv",
        "event_id,subject_id,severity,start_date\n\
         AE1,S1,Mild,2021-01-15\n\
         AE2,S1,Severe,2021-02-01\n\
         AE3,S2,Mild,2021-01-20\n",
    );
    write(root.path(), "males.json", r#"{"sex":{"values":["Male"]}}"#);
    write(root.path(), "severe.json", r#"{"severity":{"values":["Severe"]}}"#);
    root
}

fn args(root: &Path, domain: Domain) -> QueryArgs {
    QueryArgs {
        dataset: root.join("STUDY1"),
        domain,
        filters: None,
        population: None,
        limit: 25,
    }
}

#[test]
fn test_population_filter_counts() {
    let root = dataset();
    let args = QueryArgs {
        population: Some(root.path().join("males.json")),
        ..args(root.path(), Domain::Ae)
    };

    let outcome = run_query(&args, &load_config(None).unwrap()).unwrap();

    insta::assert_snapshot!(
        counts_line(&outcome),
        @"ae [STUDY1]: 2 of 3 events match (2 after population filter, 1 subjects)"
    );
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.columns[0], "subject_id");
    assert_eq!(outcome.rows[0][0], "S1");
}

#[test]
fn test_available_filters_follow_event_filter() {
    let root = dataset();
    let args = QueryArgs {
        filters: Some(root.path().join("severe.json")),
        ..args(root.path(), Domain::Ae)
    };

    let outcome = run_query(&args, &load_config(None).unwrap()).unwrap();

    assert_eq!(outcome.filtered, 1);
    assert_eq!(
        outcome.available["severity"]["values"],
        serde_json::json!(["Severe"])
    );
    assert_eq!(outcome.available["matched_item_count"], 1);
}

#[test]
fn test_population_domain_lists_subjects() {
    let root = dataset();
    let outcome = run_query(&args(root.path(), Domain::Population), &load_config(None).unwrap())
        .unwrap();

    assert_eq!(outcome.total, 2);
    assert_eq!(outcome.filtered, 2);
    assert_eq!(outcome.subjects, 2);
}

#[test]
fn test_missing_dataset_is_reported() {
    let root = TempDir::new().unwrap();
    let error = run_query(&args(root.path(), Domain::Ae), &load_config(None).unwrap())
        .unwrap_err();
    assert!(format!("{error:#}").contains("open dataset"));
}
