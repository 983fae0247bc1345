use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// 解析數字前先剔除的字元,NSE 的字串欄位可能帶千分位與貨幣符號
const NUMBER_ESCAPE_CHAR: &[char] = &['₹', '%', ',', ' ', '"', '\n'];

/// Parses a decimal value from a given string.
///
/// The string may contain commas as thousands separators, a currency
/// sign, or surrounding whitespace; these are removed before parsing.
///
/// # Arguments
///
/// * `s`: A string slice containing the representation of a decimal number.
/// * `escape_chars`: Optional additional characters to be removed from the
///   input string before parsing.
///
/// # Returns
///
/// * `Result<Decimal>`: The parsed `Decimal` value if successful, or an error
///   if the conversion fails.
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Removes a set of escape characters from a given string.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}
