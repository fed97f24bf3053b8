//! Header normalization and required-column validation.
//!
//! Source systems export the account/product table with headers in whatever
//! shape their admins configured: stray whitespace, underscores, shouting
//! case. Every header is normalized (trim, underscores to spaces, collapsed
//! whitespace, title-cased words) before being matched against the required
//! column set, so `PRIMARY_SNI_CODE` and ` primary sni  code ` both resolve
//! to `Primary Sni Code`.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const ACCOUNT_ID: &str = "Account Id";
pub const ACCOUNT_NAME: &str = "Account Name";
pub const PRIMARY_SNI_CODE: &str = "Primary Sni Code";
pub const PRIMARY_SNI_DESCRIPTION: &str = "Primary Sni Description";
pub const PRODUCT_NAME: &str = "Product Name";
pub const SECONDARY_SNI_CODE: &str = "Secondary Sni Code";
pub const SECONDARY_SNI_DESCRIPTION: &str = "Secondary Sni Description";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    ACCOUNT_ID,
    ACCOUNT_NAME,
    PRIMARY_SNI_CODE,
    PRIMARY_SNI_DESCRIPTION,
    PRODUCT_NAME,
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Column positions resolved from a normalized header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    pub account_id: usize,
    pub account_name: usize,
    pub primary_code: usize,
    pub primary_description: usize,
    pub product: usize,
    pub secondary_code: Option<usize>,
    pub secondary_description: Option<usize>,
}

impl HeaderMap {
    /// Normalizes `headers` and resolves required and optional column
    /// positions. The first occurrence wins when a normalized name repeats.
    pub fn resolve(headers: &[String]) -> Result<Self, SchemaError> {
        let normalized = headers
            .iter()
            .map(|header| normalize_header(header))
            .collect::<Vec<_>>();
        let position = |name: &str| normalized.iter().position(|header| header == name);

        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        Ok(Self {
            account_id: position(ACCOUNT_ID).expect("required column resolved"),
            account_name: position(ACCOUNT_NAME).expect("required column resolved"),
            primary_code: position(PRIMARY_SNI_CODE).expect("required column resolved"),
            primary_description: position(PRIMARY_SNI_DESCRIPTION)
                .expect("required column resolved"),
            product: position(PRODUCT_NAME).expect("required column resolved"),
            secondary_code: position(SECONDARY_SNI_CODE),
            secondary_description: position(SECONDARY_SNI_DESCRIPTION),
        })
    }
}

/// Trims, replaces underscores with spaces, collapses whitespace runs to a
/// single space, and title-cases each word.
pub fn normalize_header(raw: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid pattern"));
    let spaced = raw.trim().replace('_', " ");
    let collapsed = whitespace.replace_all(spaced.trim(), " ");
    collapsed
        .split(' ')
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
