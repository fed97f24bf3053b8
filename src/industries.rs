//! Industry ranking: which SNI groups dominate the dataset.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::{CountMode, IndustriesArgs},
    dataset::Dataset,
    table,
};

/// One ranked `(code, description)` industry group. Records with empty
/// industry cells form their own group with `None` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndustryCount {
    pub code: Option<String>,
    pub description: Option<String>,
    pub count: usize,
}

#[derive(Default)]
struct GroupCount<'a> {
    rows: usize,
    accounts: HashSet<&'a str>,
}

/// Groups records by the `(primary_code, primary_description)` pair, counts
/// per `mode`, and returns the `top` groups by count descending. Ties break
/// ascending on the group key so the ranking is deterministic.
pub fn rank_industries(dataset: &Dataset, mode: CountMode, top: usize) -> Vec<IndustryCount> {
    let mut groups: HashMap<(Option<&str>, Option<&str>), GroupCount<'_>> = HashMap::new();
    for record in dataset.records() {
        let key = (
            record.primary_code.as_deref(),
            record.primary_description.as_deref(),
        );
        let group = groups.entry(key).or_default();
        group.rows += 1;
        group.accounts.insert(record.account_id.as_str());
    }

    let mut ranked = groups
        .into_iter()
        .map(|((code, description), group)| IndustryCount {
            code: code.map(str::to_string),
            description: description.map(str::to_string),
            count: match mode {
                CountMode::Rows => group.rows,
                CountMode::UniqueAccounts => group.accounts.len(),
            },
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.count.cmp(&a.count).then_with(|| {
            (a.description.as_deref(), a.code.as_deref())
                .cmp(&(b.description.as_deref(), b.code.as_deref()))
        })
    });
    ranked.truncate(top);
    ranked
}

pub fn execute(args: &IndustriesArgs) -> Result<()> {
    let dataset = Dataset::load(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let ranked = rank_industries(&dataset, args.mode, args.top);

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &ranked)
            .context("Serializing industry ranking to JSON")?;
        println!();
        return Ok(());
    }

    let count_label = match args.mode {
        CountMode::Rows => "rows",
        CountMode::UniqueAccounts => "accounts",
    };
    let headers = vec![
        "code".to_string(),
        "description".to_string(),
        count_label.to_string(),
    ];
    let rows = ranked
        .iter()
        .map(|group| {
            vec![
                display_key(group.code.as_deref()),
                display_key(group.description.as_deref()),
                group.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    info!(
        "Ranked {} industry group(s) from {} record(s) by {count_label}",
        ranked.len(),
        dataset.len()
    );
    Ok(())
}

fn display_key(value: Option<&str>) -> String {
    value.unwrap_or("<empty>").to_string()
}
