//! Product adoption within a selected industry segment.
//!
//! Adoption is measured in distinct accounts, not rows: an account that
//! bought the same product twice still counts once. The top N products by
//! adoption form the "top set" that the gap analysis is built around.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::ProductsArgs,
    dataset::{Dataset, Segment},
    table,
};

/// Adoption of one product within a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAdoption {
    pub product: String,
    pub accounts: usize,
    /// Percent of the segment's distinct accounts holding the product,
    /// rounded to two decimals.
    pub share: f64,
}

#[derive(Debug, Serialize)]
pub struct ProductsReport {
    pub description: String,
    pub unique_accounts: usize,
    pub products: Vec<ProductAdoption>,
}

/// Distinct-account adoption per product, sorted by account count descending
/// (ties ascending by product name). Empty segments yield an empty vec; the
/// caller treats that as the "no products" terminal state before any share
/// arithmetic happens.
pub fn product_adoption(segment: &Segment<'_>) -> Vec<ProductAdoption> {
    let unique_accounts = segment.unique_accounts();
    if unique_accounts == 0 {
        return Vec::new();
    }

    let mut per_product: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in &segment.records {
        per_product
            .entry(record.product.as_str())
            .or_default()
            .insert(record.account_id.as_str());
    }

    let mut adoption = per_product
        .into_iter()
        .map(|(product, accounts)| ProductAdoption {
            product: product.to_string(),
            accounts: accounts.len(),
            share: round2(accounts.len() as f64 / unique_accounts as f64 * 100.0),
        })
        .collect::<Vec<_>>();
    adoption.sort_by(|a, b| {
        b.accounts
            .cmp(&a.accounts)
            .then_with(|| a.product.cmp(&b.product))
    });
    adoption
}

/// The product names of the `top` most-adopted products.
pub fn top_set(adoption: &[ProductAdoption], top: usize) -> Vec<String> {
    adoption
        .iter()
        .take(top)
        .map(|entry| entry.product.clone())
        .collect()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn execute(args: &ProductsArgs) -> Result<()> {
    let dataset = Dataset::load(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let description = dataset.resolve_description(&args.industry)?;
    let segment = dataset.segment(&description);
    let unique_accounts = segment.unique_accounts();
    if unique_accounts == 0 {
        info!("No accounts match industry '{description}'");
        return Ok(());
    }

    let adoption = product_adoption(&segment);
    if adoption.is_empty() {
        info!("No products found for industry '{description}'");
        return Ok(());
    }

    let shown = if args.all {
        adoption.clone()
    } else {
        adoption.iter().take(args.top).cloned().collect()
    };

    if args.json {
        let report = ProductsReport {
            description: description.clone(),
            unique_accounts,
            products: shown,
        };
        serde_json::to_writer_pretty(std::io::stdout().lock(), &report)
            .context("Serializing product report to JSON")?;
        println!();
        return Ok(());
    }

    let headers = vec![
        "product".to_string(),
        "accounts".to_string(),
        "share".to_string(),
    ];
    let rows = shown
        .iter()
        .map(|entry| {
            vec![
                entry.product.clone(),
                entry.accounts.to_string(),
                format!("{share:.2}%", share = entry.share),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    info!(
        "Segment '{description}' has {unique_accounts} account(s) across {} product(s)",
        adoption.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> Dataset {
        let headers = [
            "Account Id",
            "Account Name",
            "Primary Sni Code",
            "Primary Sni Description",
            "Product Name",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();
        let rows = [
            ["A1", "Alfa", "10710", "Bagerier", "X"],
            ["A2", "Beta", "10710", "Bagerier", "X"],
            ["A2", "Beta", "10710", "Bagerier", "Y"],
            ["A3", "Gamma", "10710", "Bagerier", "Z"],
            // Duplicate purchase: still one adopting account.
            ["A3", "Gamma", "10710", "Bagerier", "Z"],
        ]
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>())
        .collect::<Vec<_>>();
        Dataset::from_rows(&headers, rows).expect("build dataset")
    }

    #[test]
    fn adoption_counts_distinct_accounts_and_rounds_shares() {
        let dataset = sample_dataset();
        let adoption = product_adoption(&dataset.segment("Bagerier"));
        assert_eq!(adoption.len(), 3);
        assert_eq!(adoption[0].product, "X");
        assert_eq!(adoption[0].accounts, 2);
        assert_eq!(adoption[0].share, 66.67);
        assert_eq!(adoption[1].share, 33.33);
    }

    #[test]
    fn adoption_sorts_ties_by_product_name() {
        let dataset = sample_dataset();
        let adoption = product_adoption(&dataset.segment("Bagerier"));
        // Y and Z both have one account; Y sorts first.
        assert_eq!(adoption[1].product, "Y");
        assert_eq!(adoption[2].product, "Z");
    }

    #[test]
    fn top_set_takes_the_leading_product_names() {
        let dataset = sample_dataset();
        let adoption = product_adoption(&dataset.segment("Bagerier"));
        assert_eq!(top_set(&adoption, 1), vec!["X".to_string()]);
        assert_eq!(top_set(&adoption, 5).len(), 3);
    }

    #[test]
    fn empty_segment_yields_no_adoption() {
        let dataset = sample_dataset();
        assert!(product_adoption(&dataset.segment("Bryggerier")).is_empty());
    }

    #[test]
    fn shares_stay_within_percent_bounds() {
        let dataset = sample_dataset();
        for entry in product_adoption(&dataset.segment("Bagerier")) {
            assert!((0.0..=100.0).contains(&entry.share), "share {}", entry.share);
        }
    }
}
