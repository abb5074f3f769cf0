//! GST totals for invoices.
//!
//! Every amount here is derived from a line's taxable value and its two
//! percentages. Nothing computed in this module is persisted; callers
//! recompute on each read so stored inputs and displayed totals cannot drift.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::LineItem;

/// Decimal places shown to users.
pub const DISPLAY_SCALE: u32 = 2;

/// Derived amounts for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub cgst_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub sgst_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub line_total: Decimal,
}

impl LineTotals {
    pub fn rounded(&self) -> Self {
        Self {
            cgst_amount: round_for_display(self.cgst_amount),
            sgst_amount: round_for_display(self.sgst_amount),
            line_total: round_for_display(self.line_total),
        }
    }
}

/// Aggregate amounts for a whole invoice, with the per-line breakdown in
/// item order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub taxable_total: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub cgst_total: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub sgst_total: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub grand_total: Decimal,
    pub lines: Vec<LineTotals>,
}

impl InvoiceTotals {
    /// Copy rounded to [`DISPLAY_SCALE`]. Aggregates are summed at full
    /// precision first and rounded once.
    pub fn rounded(&self) -> Self {
        Self {
            taxable_total: round_for_display(self.taxable_total),
            cgst_total: round_for_display(self.cgst_total),
            sgst_total: round_for_display(self.sgst_total),
            grand_total: round_for_display(self.grand_total),
            lines: self.lines.iter().map(LineTotals::rounded).collect(),
        }
    }
}

/// `value * percent / 100`, scaled first so a percentage up to 100 can never
/// push the product past the input.
fn percent_of(value: Decimal, percent: Decimal) -> Option<Decimal> {
    value.checked_mul(percent.checked_div(Decimal::ONE_HUNDRED)?)
}

/// Line amounts, or `None` when they do not fit in a [`Decimal`].
pub fn checked_line_totals(item: &LineItem) -> Option<LineTotals> {
    let cgst_amount = percent_of(item.taxable_value, item.cgst_percent)?;
    let sgst_amount = percent_of(item.taxable_value, item.sgst_percent)?;
    let line_total = item
        .taxable_value
        .checked_add(cgst_amount)?
        .checked_add(sgst_amount)?;

    Some(LineTotals {
        cgst_amount,
        sgst_amount,
        line_total,
    })
}

/// Invoice amounts, or `None` when any line or sum overflows.
pub fn checked_invoice_totals(items: &[LineItem]) -> Option<InvoiceTotals> {
    let mut totals = InvoiceTotals {
        lines: Vec::with_capacity(items.len()),
        ..Default::default()
    };

    for item in items {
        let line = checked_line_totals(item)?;
        totals.taxable_total = totals.taxable_total.checked_add(item.taxable_value)?;
        totals.cgst_total = totals.cgst_total.checked_add(line.cgst_amount)?;
        totals.sgst_total = totals.sgst_total.checked_add(line.sgst_amount)?;
        totals.grand_total = totals.grand_total.checked_add(line.line_total)?;
        totals.lines.push(line);
    }

    Some(totals)
}

/// Amounts for a stored line. Stored invoices passed
/// [`checked_invoice_totals`] on write, so this only falls back to zeros for
/// input that skipped validation.
pub fn line_totals(item: &LineItem) -> LineTotals {
    checked_line_totals(item).unwrap_or_else(|| {
        tracing::warn!("Line amounts overflow; reporting zero");
        LineTotals::default()
    })
}

pub fn invoice_totals(items: &[LineItem]) -> InvoiceTotals {
    checked_invoice_totals(items).unwrap_or_else(|| {
        tracing::warn!(items = items.len(), "Invoice amounts overflow; reporting zero");
        InvoiceTotals {
            lines: items.iter().map(line_totals).collect(),
            ..Default::default()
        }
    })
}

/// Half-up to exactly two places, matching what the editor shows.
pub fn round_for_display(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn nine_plus_nine_on_a_thousand() {
        let line = line_totals(&LineItem::new("Consulting", dec("1000")));

        assert_eq!(line.cgst_amount, dec("90"));
        assert_eq!(line.sgst_amount, dec("90"));
        assert_eq!(line.line_total, dec("1180"));
        assert_eq!(line.rounded().line_total.to_string(), "1180.00");
    }

    #[test]
    fn rates_are_applied_independently() {
        let item = LineItem::new("Freight", dec("250")).with_rates(dec("2.5"), dec("6"));
        let line = line_totals(&item);

        assert_eq!(line.cgst_amount, dec("6.25"));
        assert_eq!(line.sgst_amount, dec("15"));
        assert_eq!(line.line_total, dec("271.25"));
    }

    #[test]
    fn empty_invoice_totals_zero() {
        let totals = invoice_totals(&[]);

        assert_eq!(totals.grand_total, Decimal::ZERO);
        assert_eq!(totals.taxable_total, Decimal::ZERO);
        assert!(totals.lines.is_empty());
    }

    #[test]
    fn grand_total_is_sum_of_line_totals() {
        let items = vec![
            LineItem::new("A", dec("1000")),
            LineItem::new("B", dec("99.99")).with_rates(dec("14"), dec("14")),
            LineItem::new("C", dec("10")).with_rates(Decimal::ZERO, Decimal::ZERO),
        ];

        let totals = invoice_totals(&items);
        let summed: Decimal = totals.lines.iter().map(|l| l.line_total).sum();

        assert_eq!(totals.grand_total, summed);
        assert_eq!(totals.taxable_total, dec("1109.99"));
        assert_eq!(totals.lines.len(), 3);
        assert_eq!(totals.lines[2].line_total, dec("10"));
    }

    #[test]
    fn rounding_happens_only_for_display() {
        // 0.05 at 9% is 0.0045 per line; three lines add up to 0.0135.
        let items = vec![LineItem::new("Tiny", dec("0.05")); 3];
        let totals = invoice_totals(&items);

        assert_eq!(totals.cgst_total, dec("0.0135"));
        assert_eq!(totals.rounded().cgst_total, dec("0.01"));
        assert_eq!(totals.rounded().lines[0].cgst_amount, dec("0.00"));
    }

    #[test]
    fn display_rounding_is_half_up() {
        assert_eq!(round_for_display(dec("2.345")).to_string(), "2.35");
        assert_eq!(round_for_display(dec("2.344")).to_string(), "2.34");
    }

    #[test]
    fn full_rate_on_a_huge_value_is_exact() {
        let value = dec("1000000000000000000000000000");
        let item = LineItem::new("Large", value).with_rates(dec("100"), Decimal::ZERO);

        let line = checked_line_totals(&item).unwrap();
        assert_eq!(line.cgst_amount, value);
        assert_eq!(line.line_total, dec("2000000000000000000000000000"));
    }

    #[test]
    fn overflowing_amounts_are_reported() {
        let item = LineItem::new("Overflow", Decimal::MAX).with_rates(dec("100"), dec("100"));
        assert!(checked_line_totals(&item).is_none());
        assert!(checked_invoice_totals(&[item]).is_none());

        let half = Decimal::MAX / dec("2");
        let items = vec![LineItem::new("A", half).with_rates(Decimal::ZERO, Decimal::ZERO); 3];
        assert!(checked_invoice_totals(&items).is_none());
    }
}
