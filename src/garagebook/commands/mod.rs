//! # Commands
//!
//! One module per area of the workshop. Each command takes the [`Shop`] (or,
//! for `config`, the data directory), does its work and returns a
//! [`CmdResult`]: the records it touched or listed plus user-facing messages.
//! Nothing here prints; rendering belongs to the CLI.
//!
//! Ids arrive already resolved. Turning a typed prefix into an [`EntityId`] is
//! the API's job.

use crate::config::ShopConfig;
use crate::entity::EntityId;
use crate::model::{Client, Employee, Expense, Money, Purchase, ServiceItem, StoreItem, Vehicle, YearMonth};

pub mod catalog;
pub mod clients;
pub mod config;
pub mod employees;
pub mod expenses;
pub mod purchases;
pub mod report;
pub mod vehicles;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VehicleView {
    pub vehicle: Vehicle,
    pub owner: String,
}

#[derive(Debug, Clone)]
pub struct PurchaseView {
    pub purchase: Purchase,
    pub client: String,
    /// Plate of the vehicle worked on, when there was one and it is still on file.
    pub vehicle: Option<String>,
    pub total: Money,
}

#[derive(Debug, Clone)]
pub struct ClientDetail {
    pub client: Client,
    pub vehicles: Vec<Vehicle>,
    /// Oldest first, each with its total.
    pub purchases: Vec<(Purchase, Money)>,
    pub spent: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthReport {
    pub month: YearMonth,
    pub income: Money,
    pub expenses: Money,
    pub purchase_count: usize,
    pub expense_count: usize,
    /// Expense totals per category, largest first.
    pub by_category: Vec<(String, Money)>,
}

impl MonthReport {
    pub fn net(&self) -> Money {
        self.income - self.expenses
    }
}

/// What a command wants shown, beyond its messages.
#[derive(Debug, Clone)]
pub enum Listing {
    Clients(Vec<Client>),
    Client(Box<ClientDetail>),
    Vehicles(Vec<VehicleView>),
    Employees(Vec<Employee>),
    Catalog {
        services: Vec<ServiceItem>,
        parts: Vec<StoreItem>,
    },
    Purchases(Vec<PurchaseView>),
    Expenses(Vec<Expense>),
    Report(MonthReport),
    Config(ShopConfig),
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Ids created, changed or removed by the command.
    pub affected: Vec<EntityId>,
    pub listing: Option<Listing>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_affected(mut self, id: EntityId) -> Self {
        self.affected.push(id);
        self
    }

    pub fn with_listing(mut self, listing: Listing) -> Self {
        self.listing = Some(listing);
        self
    }
}
