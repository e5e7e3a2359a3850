use chrono::NaiveDate;
use colored::Colorize;
use garagebook::api::{CmdMessage, Listing, MessageLevel};
use garagebook::commands::{ClientDetail, MonthReport, PurchaseView, VehicleView};
use garagebook::config::ShopConfig;
use garagebook::entity::Entity;
use garagebook::model::{Client, Employee, Expense, ServiceItem, StoreItem};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 10;
const MONEY_WIDTH: usize = 12;
const DATE_WIDTH: usize = 12;

pub(crate) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// Dates are shown in the workshop's configured format.
pub(crate) fn print_listing(listing: &Listing, date_format: &str) {
    let fmt = |date: NaiveDate| date.format(date_format).to_string();
    match listing {
        Listing::Clients(clients) => print_clients(clients),
        Listing::Client(detail) => print_client_detail(detail, &fmt),
        Listing::Vehicles(vehicles) => print_vehicles(vehicles),
        Listing::Employees(employees) => print_employees(employees, &fmt),
        Listing::Catalog { services, parts } => print_catalog(services, parts),
        Listing::Purchases(purchases) => print_purchases(purchases, &fmt),
        Listing::Expenses(expenses) => print_expenses(expenses, &fmt),
        Listing::Report(report) => print_report(report),
        Listing::Config(config) => print_config(config),
    }
}

fn short_id<T: Entity>(entity: &T) -> String {
    entity.id().map(|id| id.short()).unwrap_or_default()
}

fn print_clients(clients: &[Client]) {
    if clients.is_empty() {
        println!("No clients found.");
        return;
    }
    for client in clients {
        let right = format!("{:>16}", client.phone);
        row(&short_id(client), &client.name, &right.dimmed().to_string(), right.width());
    }
}

fn print_client_detail(detail: &ClientDetail, fmt: &dyn Fn(NaiveDate) -> String) {
    let client = &detail.client;
    println!("{} {}", short_id(client).yellow(), client.name.bold());
    println!("  phone:      {}", client.phone);
    if let Some(email) = &client.email {
        println!("  email:      {}", email);
    }
    println!("  registered: {}", fmt(client.registered_on));

    println!();
    if detail.vehicles.is_empty() {
        println!("  {}", "No vehicles.".dimmed());
    }
    for vehicle in &detail.vehicles {
        println!("  {} {}", short_id(vehicle).yellow(), vehicle.description());
    }

    println!();
    for (purchase, total) in &detail.purchases {
        let total = format!("{:>width$}", total.to_string(), width = MONEY_WIDTH);
        println!(
            "  {} {:<width$}{}",
            short_id(purchase).yellow(),
            fmt(purchase.date),
            total,
            width = DATE_WIDTH
        );
    }
    println!(
        "  {} purchase(s), {} spent",
        detail.purchases.len(),
        detail.spent.to_string().bold()
    );
}

fn print_vehicles(vehicles: &[VehicleView]) {
    if vehicles.is_empty() {
        println!("No vehicles found.");
        return;
    }
    for view in vehicles {
        let right = format!("{:>20}", truncate_to_width(&view.owner, 20));
        row(
            &short_id(&view.vehicle),
            &view.vehicle.description(),
            &right.dimmed().to_string(),
            right.width(),
        );
    }
}

fn print_employees(employees: &[Employee], fmt: &dyn Fn(NaiveDate) -> String) {
    if employees.is_empty() {
        println!("No employees found.");
        return;
    }
    for employee in employees {
        let last = employee
            .last_login
            .map(|at| fmt(at.date_naive()))
            .unwrap_or_else(|| "never".to_string());
        let right = format!("{:>10} {:>width$}", employee.role.to_string(), last, width = DATE_WIDTH);
        row(&short_id(employee), &employee.name, &right.dimmed().to_string(), right.width());
    }
}

fn print_catalog(services: &[ServiceItem], parts: &[StoreItem]) {
    println!("{}", "Services".bold());
    if services.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for service in services {
        let right = format!(
            "{:>8} {:>width$}",
            format!("{}min", service.labour_minutes),
            service.price.to_string(),
            width = MONEY_WIDTH
        );
        row(&short_id(service), &service.name, &right, right.width());
    }

    println!();
    println!("{}", "Parts".bold());
    if parts.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for part in parts {
        let stock = format!("{:>8}", format!("x{}", part.stock));
        let stock_colored = if part.stock == 0 {
            stock.red().to_string()
        } else {
            stock.clone()
        };
        let price = format!("{:>width$}", part.price.to_string(), width = MONEY_WIDTH);
        let right = format!("{} {}", stock_colored, price);
        row(&short_id(part), &part.name, &right, stock.width() + 1 + price.width());
    }
}

fn print_purchases(purchases: &[PurchaseView], fmt: &dyn Fn(NaiveDate) -> String) {
    if purchases.is_empty() {
        println!("No purchases found.");
        return;
    }
    for view in purchases {
        let title = match &view.vehicle {
            Some(plate) => format!("{} ({})", view.client, plate),
            None => view.client.clone(),
        };
        let date = format!("{:<width$}", fmt(view.purchase.date), width = DATE_WIDTH);
        let total = format!("{:>width$}", view.total.to_string(), width = MONEY_WIDTH);
        row(
            &short_id(&view.purchase),
            &format!("{}{}", date, title),
            &total,
            total.width(),
        );
    }
    let sum = purchases.iter().map(|v| v.total).sum::<garagebook::model::Money>();
    println!("{:>width$}", sum.to_string().bold(), width = LINE_WIDTH);
}

fn print_expenses(expenses: &[Expense], fmt: &dyn Fn(NaiveDate) -> String) {
    if expenses.is_empty() {
        println!("No expenses found.");
        return;
    }
    for expense in expenses {
        let date = format!("{:<width$}", fmt(expense.date), width = DATE_WIDTH);
        let right = format!(
            "{:>14} {:>width$}",
            expense.category,
            expense.amount.to_string(),
            width = MONEY_WIDTH
        );
        row(
            &short_id(expense),
            &format!("{}{}", date, expense.description),
            &right,
            right.width(),
        );
    }
}

fn print_report(report: &MonthReport) {
    println!("{}", format!("Report for {}", report.month).bold());
    println!(
        "  income    {:>width$}   ({} purchase(s))",
        report.income.to_string(),
        report.purchase_count,
        width = MONEY_WIDTH
    );
    println!(
        "  expenses  {:>width$}   ({} expense(s))",
        report.expenses.to_string(),
        report.expense_count,
        width = MONEY_WIDTH
    );
    for (category, amount) in &report.by_category {
        println!(
            "    {:<8}{:>width$}",
            truncate_to_width(category, 8),
            amount.to_string().dimmed(),
            width = MONEY_WIDTH
        );
    }

    let net = format!("{:>width$}", report.net().to_string(), width = MONEY_WIDTH);
    let net = if report.income >= report.expenses {
        net.green()
    } else {
        net.red()
    };
    println!("  net       {}", net.bold());
}

fn print_config(config: &ShopConfig) {
    for (key, value) in config.entries() {
        println!("{} = {}", key, value);
    }
}

/// One listing line: short id, a title truncated to fit, and a right-aligned
/// block whose display width is given separately since it may carry colour codes.
fn row(id: &str, title: &str, right: &str, right_width: usize) {
    let id_str = format!("{:<width$}", id, width = ID_WIDTH);
    let available = LINE_WIDTH.saturating_sub(ID_WIDTH + right_width + 1);
    let title_display = truncate_to_width(title, available);
    let padding = available.saturating_sub(title_display.width());
    println!(
        "{}{}{} {}",
        id_str.yellow(),
        title_display,
        " ".repeat(padding),
        right
    );
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}
