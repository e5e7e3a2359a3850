use crate::commands::{CmdMessage, CmdResult, Listing, MonthReport};
use crate::error::{Result, ShopError};
use crate::model::{Money, YearMonth};
use crate::shop::Shop;
use std::collections::BTreeMap;

/// Income from purchases against recorded expenses for one month.
pub fn run(shop: &mut Shop, month: YearMonth) -> Result<CmdResult> {
    let (income, purchase_count) = shop
        .stores()
        .purchases
        .values()
        .filter(|p| month.contains(p.date))
        .try_fold((Money::ZERO, 0), |(sum, n), p| {
            let income = sum
                .checked_add(p.total()?)
                .ok_or_else(|| ShopError::Invalid(format!("Income for {} overflows", month)))?;
            Ok::<_, ShopError>((income, n + 1))
        })?;

    let ledger = &mut shop.stores_mut().ledger;
    let expenses = ledger.month(month);
    let expense_count = expenses.len();
    let mut categories: BTreeMap<String, Money> = BTreeMap::new();
    for expense in expenses.values() {
        let total = categories.entry(expense.category.clone()).or_default();
        *total = *total + expense.amount;
    }
    let total_expenses = ledger.total_for(month);

    let mut by_category: Vec<(String, Money)> = categories.into_iter().collect();
    by_category.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then_with(|| a_name.cmp(b_name)));

    let report = MonthReport {
        month,
        income,
        expenses: total_expenses,
        purchase_count,
        expense_count,
        by_category,
    };

    let mut result = CmdResult::default();
    if report.net() < Money::ZERO {
        result.add_message(CmdMessage::warning(format!("{} closed at a loss", month)));
    }
    Ok(result.with_listing(Listing::Report(report)))
}
