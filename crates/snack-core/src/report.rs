//! # Reports Aggregator
//!
//! Folds snacks, sale totals and debts into [`Reports`]. The reads that feed
//! it are independent, so the figures are informational and may reflect
//! slightly different moments.

use rust_decimal::Decimal;

use crate::money::Money;
use crate::types::{Debt, Reports};

/// Accumulates report figures one record at a time.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    investment: Decimal,
    sales: Money,
    pending_amount: Money,
    outstanding: Money,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `unit_cost × stock` of a current snack.
    pub fn add_stock(&mut self, unit_cost: Decimal, stock: i64) -> &mut Self {
        self.investment = self
            .investment
            .saturating_add(unit_cost.saturating_mul(Decimal::from(stock)));
        self
    }

    /// Adds a sale total, paid or not.
    pub fn add_sale(&mut self, total: Money) -> &mut Self {
        self.sales += total;
        self
    }

    /// Adds a debt. Only pending debts count.
    pub fn add_debt(&mut self, debt: &Debt) -> &mut Self {
        if !debt.is_paid() {
            self.pending_amount += debt.amount();
            self.outstanding += debt.remaining();
        }
        self
    }

    pub fn build(&self) -> Reports {
        let investment = Money::from_decimal(self.investment);
        Reports {
            total_investment_cents: investment.cents(),
            total_sales_cents: self.sales.cents(),
            total_profit_cents: (self.sales - investment).cents(),
            total_debts_cents: self.pending_amount.cents(),
            total_outstanding_cents: self.outstanding.cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DebtStatus;
    use chrono::Utc;

    fn debt(amount: i64, paid: i64, status: DebtStatus) -> Debt {
        let now = Utc::now();
        Debt {
            id: "d".into(),
            sale_id: "s".into(),
            amount_cents: amount,
            amount_paid_cents: paid,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_figures() {
        let mut builder = ReportBuilder::new();
        builder
            .add_stock(Decimal::new(2, 0), 36) // 72.00
            .add_stock(Decimal::new(6667, 4), 3) // 2.0001
            .add_sale(Money::from_cents(1500))
            .add_sale(Money::from_cents(10_000))
            .add_debt(&debt(2000, 800, DebtStatus::Pending))
            .add_debt(&debt(1500, 1500, DebtStatus::Paid));

        let reports = builder.build();
        assert_eq!(reports.total_investment_cents, 7400);
        assert_eq!(reports.total_sales_cents, 11_500);
        assert_eq!(reports.total_profit_cents, 4100);
        // preserved figure counts the full amount, outstanding the remainder
        assert_eq!(reports.total_debts_cents, 2000);
        assert_eq!(reports.total_outstanding_cents, 1200);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(ReportBuilder::new().build(), Reports::default());
    }

    #[test]
    fn test_profit_can_be_negative() {
        let mut builder = ReportBuilder::new();
        builder.add_stock(Decimal::new(2, 0), 100);
        assert_eq!(builder.build().total_profit_cents, -20_000);
    }
}
