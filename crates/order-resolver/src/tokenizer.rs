//! Shorthand tokenizer.
//!
//! Splits raw operator input into a customer token and an ordered sequence
//! of quantity + product-code item tokens. A double line-break separates
//! customer blocks; only the first block is processed by this core. Within
//! a block the first line carries the customer token, optionally followed
//! by item tokens on the same line; subsequent lines carry further items.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Leading run of letters followed by optional digits, e.g. "g18".
static CUSTOMER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+\d*").unwrap());

/// Repeating quantity + code pairs, e.g. "1t2sm4rb".
static ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)([A-Za-z]+)").unwrap());

/// Blank-line separator between customer blocks.
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());

/// A raw quantity + product-code token, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
	pub quantity: Decimal,
	/// Product code portion, original casing preserved.
	pub code: String,
	/// The token as typed, e.g. "2sm".
	pub raw: String,
}

/// Result of tokenizing one customer block.
#[derive(Debug, Clone, Default)]
pub struct TokenizedOrder {
	/// The customer token, if the first line starts with one.
	pub customer_token: Option<String>,
	/// Item tokens in left-to-right textual order.
	pub items: Vec<RawItem>,
	/// Non-fatal diagnostics accumulated while tokenizing.
	pub diagnostics: Vec<String>,
}

/// Returns the first customer block of the input.
pub fn first_block(input: &str) -> &str {
	let trimmed = input.trim();
	match BLOCK_RE.find(trimmed) {
		Some(m) => trimmed[..m.start()].trim(),
		None => trimmed,
	}
}

/// Extracts the customer token from a line, returning the token and the
/// remainder of the line.
pub fn customer_token(line: &str) -> Option<(String, &str)> {
	let line = line.trim();
	CUSTOMER_RE
		.find(line)
		.map(|m| (m.as_str().to_string(), &line[m.end()..]))
}

/// Extracts every item token from a piece of text.
///
/// A non-empty text with no matches yields one "no products found"
/// diagnostic. A quantity that cannot be represented, or is zero, yields
/// an "invalid quantity" diagnostic; that token is skipped and scanning
/// continues.
pub fn item_tokens(text: &str) -> (Vec<RawItem>, Vec<String>) {
	let mut items = Vec::new();
	let mut diagnostics = Vec::new();

	let mut matched = false;
	for caps in ITEM_RE.captures_iter(text) {
		matched = true;
		let quantity_str = &caps[1];
		let code = &caps[2];

		match Decimal::from_str(quantity_str) {
			Ok(quantity) if quantity > Decimal::ZERO => items.push(RawItem {
				quantity,
				code: code.to_string(),
				raw: format!("{}{}", quantity_str, code),
			}),
			_ => diagnostics.push(format!("invalid quantity: {}", quantity_str)),
		}
	}

	if !matched {
		diagnostics.push(format!("no products found in: {}", text));
	}

	(items, diagnostics)
}

/// Tokenizes the first customer block of the raw input.
pub fn tokenize(input: &str) -> TokenizedOrder {
	let block = first_block(input);
	if block.is_empty() {
		return TokenizedOrder::default();
	}

	let mut lines = block.lines();
	let first_line = lines.next().unwrap_or_default().trim();

	let mut tokenized = TokenizedOrder::default();

	let remainder = match customer_token(first_line) {
		Some((token, rest)) => {
			tokenized.customer_token = Some(token);
			rest
		},
		None => first_line,
	};

	if !remainder.trim().is_empty() {
		let (items, diagnostics) = item_tokens(remainder);
		tokenized.items.extend(items);
		tokenized.diagnostics.extend(diagnostics);
	}

	for line in lines {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}
		let (items, diagnostics) = item_tokens(line);
		tokenized.items.extend(items);
		tokenized.diagnostics.extend(diagnostics);
	}

	tokenized
}

/// Re-extracts the (quantity, code) pair from a previously parsed item's
/// raw token. Used by reparse-with-customer; the token must start with the
/// quantity digits.
pub fn reparse_item_token(raw: &str) -> Option<RawItem> {
	let caps = ITEM_RE.captures(raw)?;
	if caps.get(0)?.start() != 0 {
		return None;
	}
	let quantity = Decimal::from_str(&caps[1]).ok()?;
	if quantity <= Decimal::ZERO {
		return None;
	}
	Some(RawItem {
		quantity,
		code: caps[2].to_string(),
		raw: raw.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal_macros::dec;

	#[test]
	fn splits_customer_and_items_across_lines() {
		let tokenized = tokenize("g18\n1t2sm4rb");

		assert_eq!(tokenized.customer_token.as_deref(), Some("g18"));
		assert_eq!(tokenized.items.len(), 3);
		assert_eq!(tokenized.items[0].quantity, dec!(1));
		assert_eq!(tokenized.items[0].code, "t");
		assert_eq!(tokenized.items[1].raw, "2sm");
		assert_eq!(tokenized.items[2].code, "rb");
		assert!(tokenized.diagnostics.is_empty());
	}

	#[test]
	fn items_on_customer_line_are_parsed() {
		let tokenized = tokenize("ms 3h1ch");

		assert_eq!(tokenized.customer_token.as_deref(), Some("ms"));
		let codes: Vec<&str> = tokenized.items.iter().map(|i| i.code.as_str()).collect();
		assert_eq!(codes, vec!["h", "ch"]);
	}

	#[test]
	fn only_first_block_is_tokenized() {
		let tokenized = tokenize("g18\n1t\n\nms\n2h");

		assert_eq!(tokenized.customer_token.as_deref(), Some("g18"));
		assert_eq!(tokenized.items.len(), 1);
		assert_eq!(tokenized.items[0].code, "t");
	}

	#[test]
	fn line_without_items_yields_diagnostic() {
		let tokenized = tokenize("g18\n???");

		assert!(tokenized.items.is_empty());
		assert_eq!(
			tokenized.diagnostics,
			vec!["no products found in: ???".to_string()]
		);
	}

	#[test]
	fn zero_quantity_is_rejected() {
		let tokenized = tokenize("g18\n0t2sm");

		assert_eq!(tokenized.items.len(), 1);
		assert_eq!(tokenized.items[0].code, "sm");
		assert_eq!(
			tokenized.diagnostics,
			vec!["invalid quantity: 0".to_string()]
		);
	}

	#[test]
	fn oversized_quantity_is_rejected_and_scanning_continues() {
		let tokenized = tokenize("g18\n99999999999999999999999999999999t1sm");

		assert_eq!(tokenized.items.len(), 1);
		assert_eq!(tokenized.items[0].code, "sm");
		assert!(tokenized.diagnostics[0].starts_with("invalid quantity:"));
	}

	#[test]
	fn empty_input_tokenizes_to_nothing() {
		let tokenized = tokenize("   \n  ");
		assert!(tokenized.customer_token.is_none());
		assert!(tokenized.items.is_empty());
	}

	#[test]
	fn reparse_extracts_leading_token() {
		let item = reparse_item_token("2sm").unwrap();
		assert_eq!(item.quantity, dec!(2));
		assert_eq!(item.code, "sm");

		assert!(reparse_item_token("sm").is_none());
	}
}
