use crate::commands::{CmdMessage, CmdResult, Listing};
use crate::error::{Result, ShopError};
use crate::model::{Employee, Role};
use crate::session::password_hash;
use crate::shop::Shop;
use chrono::NaiveDate;

const MIN_PASSWORD_LEN: usize = 4;

/// The first employee can always be added. After that a manager has to be logged in.
pub fn add(shop: &mut Shop, name: &str, role: Role, password: &str, hired_on: NaiveDate) -> Result<CmdResult> {
    let stores = shop.stores();
    if !stores.employees.is_empty() {
        if !stores.session.is_logged_in() {
            return Err(ShopError::Invalid(
                "Log in as a manager to add employees".to_string(),
            ));
        }
        let is_manager = shop
            .current_employee()
            .is_some_and(|e| e.role == Role::Manager);
        if !is_manager {
            return Err(ShopError::Invalid(
                "Only a logged-in manager can add employees".to_string(),
            ));
        }
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(ShopError::Invalid("Name cannot be empty".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ShopError::Invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let wanted = name.to_lowercase();
    if stores.employees.find_first(|e| e.name.to_lowercase() == wanted).is_some() {
        return Err(ShopError::Invalid(format!("An employee named {} already exists", name)));
    }

    let id = shop.register(Employee::new(name, role, password_hash(password), hired_on))?;
    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Employee added ({}): {} ({})",
        id.short(),
        name,
        role
    ))))
}

pub fn list(shop: &Shop) -> Result<CmdResult> {
    let mut employees: Vec<Employee> = shop.stores().employees.values().cloned().collect();
    employees.sort_by_key(|e| e.name.to_lowercase());

    let mut result = CmdResult::default();
    if employees.is_empty() {
        result.add_message(CmdMessage::info("No employees yet."));
    }
    Ok(result.with_listing(Listing::Employees(employees)))
}

pub fn login(shop: &mut Shop, name: &str, password: &str) -> Result<CmdResult> {
    let id = shop.login(name, password)?;
    let display = shop
        .current_employee()
        .map(|e| e.name.clone())
        .unwrap_or_else(|| name.to_string());
    Ok(CmdResult::default()
        .with_affected(id)
        .with_message(CmdMessage::success(format!("Logged in as {}", display))))
}
