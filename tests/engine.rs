mod common;

use common::{TestWorkspace, write_bakery_csv};
use sni_gap::{
    cli::CountMode,
    dataset::Dataset,
    gap,
    industries::rank_industries,
    products::{product_adoption, top_set},
};

#[test]
fn load_normalizes_headers_and_trims_values() {
    let workspace = TestWorkspace::new();
    let path = write_bakery_csv(&workspace);

    let dataset = Dataset::load(&path, None, None).expect("load dataset");
    assert_eq!(dataset.len(), 5);
    assert_eq!(
        dataset.distinct_descriptions(),
        vec!["Bagerier".to_string(), "Livsmedelshandel".to_string()]
    );
    let first = &dataset.records()[0];
    assert_eq!(first.account_id, "A1");
    assert_eq!(first.secondary_code, None);
    let second = &dataset.records()[1];
    assert_eq!(second.secondary_code.as_deref(), Some("47110"));
}

#[test]
fn load_rejects_missing_required_columns() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("partial.csv", "Account Id,Product Name\nA1,X\n");

    let err = Dataset::load(&path, None, None).expect_err("missing columns");
    let chain = format!("{err:#}");
    assert!(
        chain.contains(
            "missing required columns: Account Name, Primary Sni Code, Primary Sni Description"
        ),
        "unexpected error: {chain}"
    );
}

#[test]
fn full_pipeline_over_a_csv_file_matches_hand_computed_values() {
    let workspace = TestWorkspace::new();
    let path = write_bakery_csv(&workspace);
    let dataset = Dataset::load(&path, None, None).expect("load dataset");

    let ranked = rank_industries(&dataset, CountMode::UniqueAccounts, 10);
    assert_eq!(ranked[0].description.as_deref(), Some("Bagerier"));
    assert_eq!(ranked[0].code.as_deref(), Some("10710"));
    assert_eq!(ranked[0].count, 3);

    let segment = dataset.segment("Bagerier");
    assert_eq!(segment.unique_accounts(), 3);

    let adoption = product_adoption(&segment);
    assert_eq!(top_set(&adoption, 1), vec!["X".to_string()]);

    let report = gap::analyze(&segment, &adoption, 1);
    assert_eq!(report.share_without_any_top, 33.33);
    let missing = report.missing.as_ref().expect("missing segment");
    assert_eq!(missing.accounts.len(), 1);
    assert_eq!(missing.accounts[0].account_id, "A3");
    assert_eq!(missing.alternatives[0].product, "Z");
    let lift = missing.alternatives[0].lift.expect("lift defined");
    assert!((lift - 3.0).abs() < 0.01, "lift {lift}");
}

#[test]
fn recomputing_all_tables_yields_identical_output() {
    let workspace = TestWorkspace::new();
    let path = write_bakery_csv(&workspace);
    let dataset = Dataset::load(&path, None, None).expect("load dataset");

    let first_ranking = rank_industries(&dataset, CountMode::Rows, 10);
    let second_ranking = rank_industries(&dataset, CountMode::Rows, 10);
    assert_eq!(first_ranking, second_ranking);

    let segment = dataset.segment("Bagerier");
    let adoption = product_adoption(&segment);
    let first = gap::analyze(&segment, &adoption, 2);
    let second = gap::analyze(&segment, &adoption, 2);
    assert_eq!(first, second);
}

#[test]
fn tsv_extension_switches_the_delimiter() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "accounts.tsv",
        "Account Id\tAccount Name\tPrimary Sni Code\tPrimary Sni Description\tProduct Name\n\
         A1\tAlfa\t10710\tBagerier\tX\n",
    );
    let dataset = Dataset::load(&path, None, None).expect("load dataset");
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.records()[0].product, "X");
}
