//! # API Facade
//!
//! [`ShopApi`] is the single entry point for UIs. It is a thin layer over
//! `commands/*.rs`:
//!
//! - it **normalizes inputs**: id prefixes typed by a user become
//!   [`EntityId`]s, `ID:QTY` line specs become pairs, missing dates become today,
//! - it **dispatches** to the command function,
//! - it **returns structured results** (`Result<CmdResult>`), never text.
//!
//! Business rules live in the commands; storage behaviour in [`crate::store`].

use crate::commands::{self, CmdResult};
use crate::config::ShopConfig;
use crate::entity::EntityId;
use crate::error::{Result, ShopError};
use crate::model::{Client, Money, Role, ServiceItem, StoreItem, Vehicle, YearMonth};
use crate::shop::{Shop, ShopPaths, Stored};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

pub use commands::clients::ClientUpdate;
pub use commands::config::ConfigAction;
pub use commands::purchases::PurchaseFilter;
pub use commands::{CmdMessage, Listing, MessageLevel};

pub struct ShopApi {
    shop: Shop,
}

impl ShopApi {
    pub fn new(shop: Shop) -> Self {
        Self { shop }
    }

    /// Opens the workshop stored in `data_dir`, creating it if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let paths = ShopPaths::new(data_dir);
        let config = ShopConfig::load(paths.root())?;
        Ok(Self::new(Shop::open(paths, config)))
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn login(&mut self, name: &str, password: &str) -> Result<CmdResult> {
        commands::employees::login(&mut self.shop, name, password)
    }

    pub fn add_client(&mut self, name: &str, phone: &str, email: Option<&str>) -> Result<CmdResult> {
        commands::clients::add(&mut self.shop, name, phone, email, today())
    }

    pub fn list_clients(&self) -> Result<CmdResult> {
        commands::clients::list(&self.shop)
    }

    pub fn show_client(&self, client: &str) -> Result<CmdResult> {
        let id = self.resolve::<Client>(client)?;
        commands::clients::show(&self.shop, id)
    }

    pub fn find_clients(&self, pattern: &str) -> Result<CmdResult> {
        commands::clients::find(&self.shop, pattern)
    }

    pub fn update_client(&mut self, client: &str, changes: ClientUpdate) -> Result<CmdResult> {
        let id = self.resolve::<Client>(client)?;
        commands::clients::update(&mut self.shop, id, changes)
    }

    pub fn remove_client(&mut self, client: &str) -> Result<CmdResult> {
        let id = self.resolve::<Client>(client)?;
        commands::clients::remove(&mut self.shop, id)
    }

    pub fn add_vehicle(
        &mut self,
        owner: &str,
        make: &str,
        model: &str,
        year: u16,
        plate: &str,
    ) -> Result<CmdResult> {
        let owner = self.resolve::<Client>(owner)?;
        commands::vehicles::add(&mut self.shop, owner, make, model, year, plate, today())
    }

    pub fn list_vehicles(&self, owner: Option<&str>) -> Result<CmdResult> {
        let owner = owner
            .map(|o| self.resolve::<Client>(o))
            .transpose()?;
        commands::vehicles::list(&self.shop, owner)
    }

    pub fn remove_vehicle(&mut self, vehicle: &str) -> Result<CmdResult> {
        let id = self.resolve::<Vehicle>(vehicle)?;
        commands::vehicles::remove(&mut self.shop, id)
    }

    pub fn add_employee(&mut self, name: &str, role: Role, password: &str) -> Result<CmdResult> {
        commands::employees::add(&mut self.shop, name, role, password, today())
    }

    pub fn list_employees(&self) -> Result<CmdResult> {
        commands::employees::list(&self.shop)
    }

    pub fn add_service(&mut self, name: &str, price: Money, labour_minutes: u32) -> Result<CmdResult> {
        commands::catalog::add_service(&mut self.shop, name, price, labour_minutes)
    }

    pub fn add_part(&mut self, name: &str, price: Money, stock: u32) -> Result<CmdResult> {
        commands::catalog::add_part(&mut self.shop, name, price, stock)
    }

    pub fn restock(&mut self, part: &str, quantity: u32) -> Result<CmdResult> {
        let id = self.resolve::<StoreItem>(part)?;
        commands::catalog::restock(&mut self.shop, id, quantity)
    }

    pub fn list_catalog(&self) -> Result<CmdResult> {
        commands::catalog::list(&self.shop)
    }

    /// `services` and `parts` are `ID` or `ID:QTY` specs; the id may be a prefix.
    pub fn record_purchase<I: AsRef<str>>(
        &mut self,
        client: &str,
        vehicle: Option<&str>,
        services: &[I],
        parts: &[I],
        date: Option<NaiveDate>,
    ) -> Result<CmdResult> {
        let request = commands::purchases::PurchaseRequest {
            client: self.resolve::<Client>(client)?,
            vehicle: vehicle
                .map(|v| self.resolve::<Vehicle>(v))
                .transpose()?,
            services: self.resolve_lines::<ServiceItem, I>(services)?,
            parts: self.resolve_lines::<StoreItem, I>(parts)?,
            date: date.unwrap_or_else(today),
        };
        commands::purchases::record(&mut self.shop, request)
    }

    pub fn list_purchases(&self, month: Option<YearMonth>, client: Option<&str>) -> Result<CmdResult> {
        let filter = PurchaseFilter {
            month,
            client: client
                .map(|c| self.resolve::<Client>(c))
                .transpose()?,
        };
        commands::purchases::list(&self.shop, filter)
    }

    pub fn add_expense(
        &mut self,
        description: &str,
        category: Option<&str>,
        amount: Money,
        date: Option<NaiveDate>,
    ) -> Result<CmdResult> {
        let date = date.unwrap_or_else(today);
        commands::expenses::add(&mut self.shop, description, category, amount, date)
    }

    /// The expense is looked up in `month` (defaults to the current month).
    pub fn remove_expense(&mut self, expense: &str, month: Option<YearMonth>) -> Result<CmdResult> {
        let month = month.unwrap_or_else(|| YearMonth::of(today()));
        let id = self.shop.stores_mut().ledger.month(month).resolve(expense)?;
        commands::expenses::remove(&mut self.shop, month, id)
    }

    pub fn list_expenses(&mut self, month: Option<YearMonth>) -> Result<CmdResult> {
        let month = month.unwrap_or_else(|| YearMonth::of(today()));
        commands::expenses::list(&mut self.shop, month)
    }

    pub fn report(&mut self, month: Option<YearMonth>) -> Result<CmdResult> {
        let month = month.unwrap_or_else(|| YearMonth::of(today()));
        commands::report::run(&mut self.shop, month)
    }

    pub fn config(&mut self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&mut self.shop, action)
    }

    pub fn shutdown(&mut self) {
        self.shop.shutdown();
    }

    fn resolve<T: Stored>(&self, query: &str) -> Result<EntityId> {
        T::repository_ref(self.shop.stores()).resolve(query)
    }

    fn resolve_lines<T: Stored, I: AsRef<str>>(&self, specs: &[I]) -> Result<Vec<(EntityId, u32)>> {
        specs
            .iter()
            .map(|spec| {
                let (query, quantity) = parse_line_spec(spec.as_ref())?;
                Ok((self.resolve::<T>(query)?, quantity))
            })
            .collect()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Splits `ID:QTY` (quantity defaults to 1).
pub fn parse_line_spec(spec: &str) -> Result<(&str, u32)> {
    let spec = spec.trim();
    match spec.split_once(':') {
        None => Ok((spec, 1)),
        Some((id, qty)) => {
            let quantity = qty
                .trim()
                .parse::<u32>()
                .map_err(|_| ShopError::Invalid(format!("'{}' is not a valid quantity in '{}'", qty, spec)))?;
            Ok((id.trim(), quantity))
        }
    }
}
