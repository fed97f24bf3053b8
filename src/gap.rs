//! Missing-top-set analysis: which accounts lack every leading product in
//! their industry segment, and what they buy instead.
//!
//! The pipeline is pure over an immutable segment: compute the top set,
//! split the segment's accounts into "holds at least one top product" and
//! "missing", then profile the missing accounts' purchases against the whole
//! segment. Lift compares a product's adoption share among missing accounts
//! to its share in the whole segment; a lift above one means the product is
//! over-represented among accounts lacking the top set.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    cli::GapArgs,
    dataset::{Dataset, Segment},
    io_utils,
    products::{self, ProductAdoption, round2},
    table,
};

const ALTERNATIVES_DISPLAY_LIMIT: usize = 10;

pub const EXPORT_ALTERNATIVES_HEADERS: [&str; 5] = [
    "Product Name",
    "Antal konton (saknar-top)",
    "Andel av 'saknar'-kunder (%)",
    "Andel i hela SNI (%)",
    "Lift (saknar / total)",
];

pub const EXPORT_MISSING_HEADERS: [&str; 2] = ["Account Id", "Account Name"];

/// One product held by missing-segment accounts, joined against the
/// whole-segment share table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeProduct {
    pub product: String,
    /// Distinct missing-segment accounts holding the product.
    pub accounts: usize,
    /// Percent of missing-segment accounts, rounded to two decimals.
    pub share_missing: f64,
    /// Percent of all segment accounts; 0 when the product never appears in
    /// the whole-segment table.
    pub share_whole: f64,
    /// `share_missing / share_whole`, undefined when the whole-segment share
    /// is zero.
    pub lift: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingAccount {
    pub account_id: String,
    pub account_name: String,
}

/// Histogram bucket: `accounts` missing-segment accounts hold exactly
/// `products` distinct products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCountBucket {
    pub products: usize,
    pub accounts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSegmentReport {
    /// Distinct (id, name) pairs in first-appearance order.
    pub accounts: Vec<MissingAccount>,
    pub alternatives: Vec<AlternativeProduct>,
    /// Buckets sorted ascending by distinct product count.
    pub distribution: Vec<ProductCountBucket>,
    /// Mean distinct products per missing-segment account.
    pub mean_products: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub description: String,
    pub unique_accounts: usize,
    pub top_products: Vec<ProductAdoption>,
    pub accounts_with_top: usize,
    pub accounts_without_any_top: usize,
    pub share_without_any_top: f64,
    /// `None` when every segment account holds at least one top product.
    pub missing: Option<MissingSegmentReport>,
}

/// Runs the missing-top-set pipeline over one segment. `adoption` is the
/// whole-segment adoption table from [`products::product_adoption`]; its
/// first `top` entries define the top set.
pub fn analyze(segment: &Segment<'_>, adoption: &[ProductAdoption], top: usize) -> GapReport {
    let unique_accounts = segment.unique_accounts();
    let top_products = adoption.iter().take(top).cloned().collect::<Vec<_>>();
    let top_set = top_products
        .iter()
        .map(|entry| entry.product.as_str())
        .collect::<HashSet<_>>();

    let accounts_with_top = segment
        .records
        .iter()
        .filter(|record| top_set.contains(record.product.as_str()))
        .map(|record| record.account_id.as_str())
        .collect::<HashSet<_>>();
    let accounts_without_any_top = unique_accounts - accounts_with_top.len();
    let share_without_any_top = if unique_accounts > 0 {
        round2(accounts_without_any_top as f64 / unique_accounts as f64 * 100.0)
    } else {
        0.0
    };

    let missing_records = segment
        .records
        .iter()
        .filter(|record| !accounts_with_top.contains(record.account_id.as_str()))
        .copied()
        .collect::<Vec<_>>();
    let missing_accounts = missing_records
        .iter()
        .map(|record| (record.account_id.as_str(), record.account_name.as_str()))
        .unique()
        .map(|(account_id, account_name)| MissingAccount {
            account_id: account_id.to_string(),
            account_name: account_name.to_string(),
        })
        .collect::<Vec<_>>();
    let missing_ids = missing_records
        .iter()
        .map(|record| record.account_id.as_str())
        .collect::<HashSet<_>>();
    let missing_n = missing_ids.len();

    let missing = (missing_n > 0).then(|| {
        let whole_shares = adoption
            .iter()
            .map(|entry| (entry.product.as_str(), entry.share))
            .collect::<HashMap<_, _>>();

        let mut per_product: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut per_account: HashMap<&str, HashSet<&str>> = HashMap::new();
        for record in &missing_records {
            per_product
                .entry(record.product.as_str())
                .or_default()
                .insert(record.account_id.as_str());
            per_account
                .entry(record.account_id.as_str())
                .or_default()
                .insert(record.product.as_str());
        }

        let mut alternatives = per_product
            .into_iter()
            .map(|(product, accounts)| {
                let share_missing = round2(accounts.len() as f64 / missing_n as f64 * 100.0);
                // Outer-safe join: a product absent from the whole-segment
                // table contributes a zero share and an undefined lift.
                let share_whole = whole_shares.get(product).copied().unwrap_or(0.0);
                let lift = (share_whole > 0.0).then(|| share_missing / share_whole);
                AlternativeProduct {
                    product: product.to_string(),
                    accounts: accounts.len(),
                    share_missing,
                    share_whole,
                    lift,
                }
            })
            .collect::<Vec<_>>();
        alternatives.sort_by(|a, b| {
            b.accounts
                .cmp(&a.accounts)
                .then_with(|| a.product.cmp(&b.product))
        });

        let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
        let mut total_products = 0usize;
        for held in per_account.values() {
            *histogram.entry(held.len()).or_insert(0) += 1;
            total_products += held.len();
        }
        let distribution = histogram
            .into_iter()
            .map(|(products, accounts)| ProductCountBucket { products, accounts })
            .collect::<Vec<_>>();
        let mean_products = total_products as f64 / missing_n as f64;

        MissingSegmentReport {
            accounts: missing_accounts,
            alternatives,
            distribution,
            mean_products,
        }
    });

    GapReport {
        description: segment.description.clone(),
        unique_accounts,
        top_products,
        accounts_with_top: accounts_with_top.len(),
        accounts_without_any_top,
        share_without_any_top,
        missing,
    }
}

pub fn execute(args: &GapArgs) -> Result<()> {
    let dataset = Dataset::load(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let description = dataset.resolve_description(&args.industry)?;
    let segment = dataset.segment(&description);
    if segment.unique_accounts() == 0 {
        info!("No accounts match industry '{description}'");
        return Ok(());
    }

    let adoption = products::product_adoption(&segment);
    if adoption.is_empty() {
        info!("No products found for industry '{description}'");
        return Ok(());
    }

    let report = analyze(&segment, &adoption, args.top);

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)
            .context("Serializing gap report to JSON")?;
        println!();
    } else {
        render_report(&report, args.all);
    }

    if let Some(path) = &args.export_alternatives {
        export_alternatives(&report, path)?;
    }
    if let Some(path) = &args.export_missing {
        export_missing(&report, path)?;
    }
    Ok(())
}

fn render_report(report: &GapReport, show_all: bool) {
    let mut summary = vec![
        vec![
            "accounts in segment".to_string(),
            report.unique_accounts.to_string(),
        ],
        vec![
            "top products".to_string(),
            report
                .top_products
                .iter()
                .map(|entry| entry.product.as_str())
                .join(", "),
        ],
        vec![
            "share missing all top products".to_string(),
            format!("{share:.2}%", share = report.share_without_any_top),
        ],
    ];
    if let Some(missing) = &report.missing {
        summary.push(vec![
            "accounts missing all top products".to_string(),
            missing.accounts.len().to_string(),
        ]);
        summary.push(vec![
            "mean products per missing account".to_string(),
            format!("{mean:.2}", mean = missing.mean_products),
        ]);
    }
    let summary_headers = vec!["metric".to_string(), "value".to_string()];
    table::print_table(&summary_headers, &summary);
    println!();

    let adoption_headers = vec![
        "product".to_string(),
        "accounts".to_string(),
        "share".to_string(),
    ];
    let adoption_rows = report
        .top_products
        .iter()
        .map(|entry| {
            vec![
                entry.product.clone(),
                entry.accounts.to_string(),
                format!("{share:.2}%", share = entry.share),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&adoption_headers, &adoption_rows);

    let Some(missing) = &report.missing else {
        info!("All accounts hold at least one top product; there is no missing segment");
        return;
    };

    println!();
    let alternative_headers = vec![
        "product".to_string(),
        "accounts".to_string(),
        "share missing".to_string(),
        "share segment".to_string(),
        "lift".to_string(),
    ];
    let shown = if show_all {
        missing.alternatives.len()
    } else {
        missing.alternatives.len().min(ALTERNATIVES_DISPLAY_LIMIT)
    };
    let alternative_rows = missing.alternatives[..shown]
        .iter()
        .map(|entry| {
            vec![
                entry.product.clone(),
                entry.accounts.to_string(),
                format!("{share:.2}%", share = entry.share_missing),
                format!("{share:.2}%", share = entry.share_whole),
                entry.lift.map(format_number).unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&alternative_headers, &alternative_rows);
    if shown < missing.alternatives.len() {
        info!(
            "Showing {shown} of {} alternative product(s); pass --all for the full table",
            missing.alternatives.len()
        );
    }

    println!();
    let distribution_headers = vec!["products".to_string(), "accounts".to_string()];
    let distribution_rows = missing
        .distribution
        .iter()
        .map(|bucket| vec![bucket.products.to_string(), bucket.accounts.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&distribution_headers, &distribution_rows);
}

fn export_alternatives(report: &GapReport, path: &Path) -> Result<()> {
    let Some(missing) = &report.missing else {
        info!("No missing segment; skipping alternatives export to {path:?}");
        return Ok(());
    };
    let mut writer = io_utils::open_export_writer(path)?;
    writer
        .write_record(EXPORT_ALTERNATIVES_HEADERS)
        .context("Writing alternatives export header")?;
    for entry in &missing.alternatives {
        let row = vec![
            entry.product.clone(),
            entry.accounts.to_string(),
            format!("{share:.2}", share = entry.share_missing),
            format!("{share:.2}", share = entry.share_whole),
            entry.lift.map(format_number).unwrap_or_default(),
        ];
        writer
            .write_record(&row)
            .context("Writing alternatives export row")?;
    }
    writer.flush().context("Flushing alternatives export")?;
    info!(
        "Exported {} alternative product(s) to {path:?}",
        missing.alternatives.len()
    );
    Ok(())
}

fn export_missing(report: &GapReport, path: &Path) -> Result<()> {
    let Some(missing) = &report.missing else {
        info!("No missing segment; skipping account export to {path:?}");
        return Ok(());
    };
    let mut writer = io_utils::open_export_writer(path)?;
    writer
        .write_record(EXPORT_MISSING_HEADERS)
        .context("Writing account export header")?;
    for account in &missing.accounts {
        writer
            .write_record([
                account.account_id.as_str(),
                account.account_name.as_str(),
            ])
            .context("Writing account export row")?;
    }
    writer.flush().context("Flushing account export")?;
    info!(
        "Exported {} missing account(s) to {path:?}",
        missing.accounts.len()
    );
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}
