use crate::commands::{CmdMessage, CmdResult, Listing};
use crate::entity::{Entity, EntityId};
use crate::error::{Result, ShopError};
use crate::model::{Expense, Money, YearMonth};
use crate::shop::Shop;
use chrono::NaiveDate;

pub const DEFAULT_CATEGORY: &str = "general";

pub fn add(
    shop: &mut Shop,
    description: &str,
    category: Option<&str>,
    amount: Money,
    date: NaiveDate,
) -> Result<CmdResult> {
    let description = description.trim();
    if description.is_empty() {
        return Err(ShopError::Invalid("Description cannot be empty".to_string()));
    }
    if amount == Money::ZERO {
        return Err(ShopError::Invalid("Amount must be greater than zero".to_string()));
    }
    let category = category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut expense = Expense::new(description, category, amount, date);
    expense.recorded_by = shop.stores().session.current();
    let id = shop.record_expense(expense)?;

    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Expense recorded ({}) in {}: {} {}",
        id.short(),
        YearMonth::of(date),
        description,
        amount
    ))))
}

pub fn remove(shop: &mut Shop, month: YearMonth, id: EntityId) -> Result<CmdResult> {
    let expense = shop
        .remove_expense(month, &id)?
        .ok_or(ShopError::NotFound { kind: Expense::KIND, id })?;

    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Expense removed from {}: {} {}",
        month, expense.description, expense.amount
    ))))
}

pub fn list(shop: &mut Shop, month: YearMonth) -> Result<CmdResult> {
    let mut expenses: Vec<Expense> = shop
        .stores_mut()
        .ledger
        .month(month)
        .values()
        .cloned()
        .collect();
    expenses.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.description.cmp(&b.description)));

    let mut result = CmdResult::default();
    if expenses.is_empty() {
        result.add_message(CmdMessage::info(format!("No expenses for {}.", month)));
    }
    Ok(result.with_listing(Listing::Expenses(expenses)))
}
