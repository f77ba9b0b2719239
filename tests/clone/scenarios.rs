//! Full clone runs: generate scripts, then tidy the data files.

use crate::fixture::Fixture;
use script_cloner::RunSummary;

const COLORS: &str = "name\nred\ngreen\n";

#[test]
fn test_round_robin_substitution() {
    let fx = Fixture::new("Pick XX now\n")
        .definitions("1|XX|colors|name|F\n")
        .data("colors", COLORS);

    let (summary, printed) = fx.run(&fx.config(1, 2));
    assert!(printed.is_empty());
    let RunSummary::Cloned { assembly, metrics, tidy } = summary else {
        panic!("expected a clone run");
    };
    assert_eq!(assembly.substitutions, 1);
    assert!(assembly.errors.is_empty());
    assert_eq!(metrics.files_written, 1);
    assert_eq!(metrics.transactions, 2);
    assert_eq!(tidy.rows_spent, 2);

    assert_eq!(fx.read_output(0), "Pick red now\nPick green now\n");
    assert_eq!(fx.read_data("colors"), "name\n");
    assert_eq!(fx.read_spent("colors").as_deref(), Some("red\ngreen\n"));
}

#[test]
fn test_longest_match_at_same_position_wins() {
    let fx = Fixture::new("AAAABBBB\n")
        .definitions("1|AAAA|colors|name|F\n1|AAAABBBB|colors|name|F\n")
        .data("colors", COLORS);

    let (summary, _) = fx.run(&fx.config(1, 1));
    let RunSummary::Cloned { assembly, .. } = summary else {
        panic!("expected a clone run");
    };
    assert_eq!(assembly.substitutions, 1);
    assert_eq!(fx.read_output(0), "red\n");
}

#[test]
fn test_unused_rows_stay_without_reuse() {
    let fx = Fixture::new("id=XX\n")
        .definitions("1|XX|items|id|F\n")
        .data("items", "id\n1\n2\n3\n4\n5\n");

    fx.run(&fx.config(1, 3));
    assert_eq!(fx.read_output(0), "id=1\nid=2\nid=3\n");
    assert_eq!(fx.read_data("items"), "id\n4\n5\n");
    assert_eq!(fx.read_spent("items").as_deref(), Some("1\n2\n3\n"));
}

#[test]
fn test_repeated_fresh_file_spends_full_requirement() {
    let fx = Fixture::new("A=XX\nB=YY\n")
        .definitions("1|XX|items|id|F\n2|YY|items|id|F\n")
        .data("items", "id\n1\n2\n3\n4\n5\n");

    let (summary, _) = fx.run(&fx.config(1, 2));
    let RunSummary::Cloned { tidy, .. } = summary else {
        panic!("expected a clone run");
    };

    // Both lines of a transaction share the row; the cursor moves once per transaction.
    assert_eq!(fx.read_output(0), "A=1\nB=1\nA=2\nB=2\n");
    // Every loaded row is spent, used or not.
    assert_eq!(tidy.rows_spent, 4);
    assert_eq!(fx.read_spent("items").as_deref(), Some("1\n2\n3\n4\n"));
    assert_eq!(fx.read_data("items"), "id\n5\n");
}

#[test]
fn test_spent_rows_return_with_reuse() {
    let fx = Fixture::new("id=XX\n")
        .definitions("1|XX|items|id|F\n")
        .data("items", "id\n1\n2\n3\n4\n5\n");

    let mut config = fx.config(3, 1);
    config.reuse = true;
    fx.run(&config);

    assert_eq!(fx.read_output(0), "id=1\n");
    assert_eq!(fx.read_output(1), "id=2\n");
    assert_eq!(fx.read_output(2), "id=3\n");
    assert_eq!(fx.read_data("items"), "id\n4\n5\n1\n2\n3\n");
}

#[test]
fn test_think_time_and_multiple_files() {
    let fx = Fixture::new("GET /login\n\\W5\\\nPOST user=UU size=SS\n")
        .definitions("3|UU|users|login|F\n3|SS|sizes|size|F\n")
        .data("users", "login|password\nann|pw1\nbob|pw2\n")
        .data("sizes", "size\nS\nM\nL\n");

    fx.run(&fx.config(1, 3));
    assert_eq!(
        fx.read_output(0),
        "GET /login\n\\W30\\\nPOST user=ann size=S\n\
         GET /login\n\\W30\\\nPOST user=bob size=M\n\
         GET /login\n\\W30\\\nPOST user=ann size=L\n"
    );
}

#[test]
fn test_missing_definition_file_clones_script() {
    let fx = Fixture::new("GET /\n\\W1\\\n");

    let (summary, _) = fx.run(&fx.config(2, 1));
    let RunSummary::Cloned { metrics, tidy, .. } = summary else {
        panic!("expected a clone run");
    };
    assert_eq!(metrics.files_written, 2);
    assert_eq!(tidy.files_rewritten, 0);
    assert_eq!(fx.read_output(1), "GET /\n\\W30\\\n");
}

#[test]
fn test_user_errors_leave_text_unchanged() {
    let fx = Fixture::new("Pick XX now\nand YY\n")
        .definitions("1|XX|colors|shade|F\n2|YY|absent|name|F\n")
        .data("colors", COLORS);

    let (summary, _) = fx.run(&fx.config(1, 1));
    let RunSummary::Cloned { assembly, .. } = summary else {
        panic!("expected a clone run");
    };
    assert_eq!(assembly.errors.len(), 2);
    assert_eq!(fx.read_output(0), "Pick XX now\nand YY\n");
}

#[test]
fn test_missing_script_is_fatal() {
    let fx = Fixture::new("unused\n");
    let mut config = fx.config(1, 1);
    config.script = "other".to_string();

    let err = script_cloner::run(&config, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("other"));
    assert_eq!(fx.output_files(), 0);
}
