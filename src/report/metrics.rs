//! Figures derived client-side for financial reports.

use super::payload::{FinancialPayload, Transaction};

/// Percentage change from `previous` to `current`; 0 when there is no usable baseline
pub fn growth_rate(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(previous) if previous != 0.0 && previous.is_finite() => {
            (current - previous) / previous * 100.0
        }
        _ => 0.0,
    }
}

/// Count and summed amount of transactions not yet completed; a missing status counts
pub fn overdue_totals(transactions: &[Transaction]) -> (u64, f64) {
    transactions
        .iter()
        .filter(|t| t.status.as_deref() != Some("completed"))
        .fold((0, 0.0), |(count, amount), t| {
            (count + 1, amount + t.amount.value())
        })
}

/// Fill in growth rate and overdue figures on a fetched financial payload
pub fn enrich_financial(payload: &FinancialPayload) -> FinancialPayload {
    let mut enriched = payload.clone();
    let (count, amount) = overdue_totals(&payload.transactions);
    enriched.summary.growth_rate = growth_rate(
        payload.summary.total_revenue,
        payload.summary.previous_revenue,
    );
    enriched.summary.overdue_payments_count = count;
    enriched.summary.overdue_payments_amount = amount;
    enriched
}
