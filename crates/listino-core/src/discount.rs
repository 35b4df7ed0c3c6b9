//! Discounted-price column
//!
//! Finds the price and discount-percentage columns by name and appends one
//! computed column holding `price × (1 − discount / 100)`.

use crate::number::{format_amount, parse_amount, DecimalStyle};
use crate::table::{find_header, HeaderMatch, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PRICE_COLUMN: &str = "LIPREZZO";
pub const DISCOUNT_COLUMN: &str = "LISCONT1";
pub const DISCOUNTED_COLUMN: &str = "PREZZO_SCONTATO";

/// Header names involved in the computation, matched ignoring case and
/// surrounding whitespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountColumns {
    pub price: String,
    pub discount: String,
    /// Name of the appended column
    pub target: String,
}

impl Default for DiscountColumns {
    fn default() -> Self {
        Self {
            price: PRICE_COLUMN.to_string(),
            discount: DISCOUNT_COLUMN.to_string(),
            target: DISCOUNTED_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentOptions {
    pub columns: DiscountColumns,
    /// Decimal mark of the computed values
    pub style: DecimalStyle,
}

/// What [`augment`] did to the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Augmentation {
    /// Column appended; `computed` rows received a value, `blank` an empty cell
    Applied { computed: usize, blank: usize },
    /// A source column is missing; the table was left untouched
    MissingColumns { missing: Vec<String> },
    /// The target column already exists; the table was left untouched
    AlreadyPresent { column: String },
}

impl Augmentation {
    /// Rows that received a computed value
    pub fn computed(&self) -> usize {
        match self {
            Augmentation::Applied { computed, .. } => *computed,
            _ => 0,
        }
    }
}

/// Append the discounted-price column to `table`.
///
/// Per row:
/// - too short to hold both source cells: one empty cell is appended;
/// - unparseable price: the row keeps an empty computed cell;
/// - otherwise the row is padded to the header width and the formatted
///   discounted price is appended.
pub fn augment(table: &mut Table, options: &AugmentOptions) -> Augmentation {
    let columns = &options.columns;
    let price_index = find_header(&table.headers, &columns.price, HeaderMatch::Loose);
    let discount_index = find_header(&table.headers, &columns.discount, HeaderMatch::Loose);

    let (Some(price_index), Some(discount_index)) = (price_index, discount_index) else {
        let mut missing = Vec::new();
        if price_index.is_none() {
            missing.push(columns.price.clone());
        }
        if discount_index.is_none() {
            missing.push(columns.discount.clone());
        }
        return Augmentation::MissingColumns { missing };
    };

    if find_header(&table.headers, &columns.target, HeaderMatch::Loose).is_some() {
        return Augmentation::AlreadyPresent {
            column: columns.target.clone(),
        };
    }

    let width = table.headers.len();
    let last_needed = price_index.max(discount_index);
    table.headers.push(columns.target.clone());

    let (mut computed, mut blank) = (0, 0);
    for row in &mut table.rows {
        if row.len() <= last_needed {
            row.push("");
            blank += 1;
            continue;
        }

        let value = discounted_price(row.cell(price_index), row.cell(discount_index));
        if row.len() < width {
            row.cells.resize(width, String::new());
        }
        match value {
            Some(value) => {
                row.push(format_amount(value, options.style));
                computed += 1;
            }
            None => {
                row.push("");
                blank += 1;
            }
        }
    }

    Augmentation::Applied { computed, blank }
}

/// `price × (1 − discount / 100)` from raw cell text.
///
/// `None` when the price does not parse. A missing, unparseable or zero
/// discount leaves the price unchanged; otherwise its absolute value is
/// used, capped at 100.
pub fn discounted_price(price: &str, discount: &str) -> Option<Decimal> {
    let price = parse_amount(price)?;
    let rate = parse_amount(discount)
        .map(|d| d.abs().min(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);

    if rate.is_zero() {
        return Some(price);
    }
    price.checked_mul(Decimal::ONE - rate / Decimal::ONE_HUNDRED)
}
