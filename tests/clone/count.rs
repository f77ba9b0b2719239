//! Count-only mode.

use crate::fixture::Fixture;
use script_cloner::RunSummary;

#[test]
fn test_count_reports_required_rows() {
    let fx = Fixture::new("Pick XX now\n")
        .definitions("1|XX|colors|name|F\n")
        .data("colors", "name\nred\ngreen\n");
    let mut config = fx.config(4, 3);
    config.count_only = true;

    let (summary, printed) = fx.run(&config);
    assert!(matches!(summary, RunSummary::Counted { files: 1 }));
    assert_eq!(
        printed,
        format!("{}|12\n", fx.data_path("colors").display())
    );

    // Nothing generated, nothing consumed.
    assert_eq!(fx.output_files(), 0);
    assert_eq!(fx.read_data("colors"), "name\nred\ngreen\n");
    assert!(fx.read_spent("colors").is_none());
}

#[test]
fn test_count_merges_repeated_files_in_discovery_order() {
    let fx = Fixture::new("a XX YY\nb XX\n").definitions(
        "2|XX|colors|name|F\n\
         1|XX|colors|name|F\n\
         1|YY|sizes|size|N\n\
         1|ZZ|colors|name|N\n",
    );
    let mut config = fx.config(2, 5);
    config.count_only = true;

    let (_, printed) = fx.run(&config);
    assert_eq!(
        printed,
        format!(
            "{}|20\n{}|10\n",
            fx.data_path("colors").display(),
            fx.data_path("sizes").display()
        )
    );
}
