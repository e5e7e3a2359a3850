use crate::entity::{impl_entity, EntityId};
use crate::error::{self, ShopError};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// An amount in cents. Never negative when parsed from user input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// `None` on overflow.
    pub fn times(&self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = String;

    /// Accepts `12`, `12.5` and `12.50`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("'{}' is not a valid amount", s);

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let cents = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .map(Money)
            .ok_or_else(invalid)
    }
}

/// A calendar month, the unit the expense ledger is split by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("'{}' is not a month, expected YYYY-MM", s);
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mechanic,
    Clerk,
    Manager,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Mechanic => "mechanic",
            Role::Clerk => "clerk",
            Role::Manager => "manager",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mechanic" => Ok(Role::Mechanic),
            "clerk" => Ok(Role::Clerk),
            "manager" => Ok(Role::Manager),
            other => Err(format!(
                "unknown role '{}', expected mechanic, clerk or manager",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    id: Option<EntityId>,
    pub name: String,
    pub role: Role,
    pub password_hash: u64,
    #[serde(with = "crate::store::adapters::adapted")]
    pub hired_on: NaiveDate,
    #[serde(default, with = "crate::store::adapters::adapted_option")]
    pub last_login: Option<DateTime<Utc>>,
}

impl_entity!(Employee, "employee");

impl Employee {
    pub fn new(name: impl Into<String>, role: Role, password_hash: u64, hired_on: NaiveDate) -> Self {
        Self {
            id: None,
            name: name.into(),
            role,
            password_hash,
            hired_on,
            last_login: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: Option<EntityId>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(with = "crate::store::adapters::adapted")]
    pub registered_on: NaiveDate,
    /// Maintained by the vehicle rules.
    #[serde(default)]
    pub owned_vehicle_ids: Vec<EntityId>,
    /// Maintained by the purchase rules.
    #[serde(default)]
    pub purchase_ids: Vec<EntityId>,
}

impl_entity!(Client, "client");

impl Client {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, registered_on: NaiveDate) -> Self {
        Self {
            id: None,
            name: name.into(),
            phone: phone.into(),
            email: None,
            registered_on,
            owned_vehicle_ids: Vec::new(),
            purchase_ids: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    id: Option<EntityId>,
    pub owner_id: EntityId,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub plate: String,
    #[serde(with = "crate::store::adapters::adapted")]
    pub registered_on: NaiveDate,
}

impl_entity!(Vehicle, "vehicle");

impl Vehicle {
    pub fn new(
        owner_id: EntityId,
        make: impl Into<String>,
        model: impl Into<String>,
        year: u16,
        plate: impl Into<String>,
        registered_on: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner_id,
            make: make.into(),
            model: model.into(),
            year,
            plate: plate.into().to_uppercase(),
            registered_on,
        }
    }

    pub fn description(&self) -> String {
        format!("{} {} {} ({})", self.year, self.make, self.model, self.plate)
    }
}

/// Labour the workshop sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    id: Option<EntityId>,
    pub name: String,
    pub price: Money,
    pub labour_minutes: u32,
}

impl_entity!(ServiceItem, "service");

impl ServiceItem {
    pub fn new(name: impl Into<String>, price: Money, labour_minutes: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            labour_minutes,
        }
    }
}

/// A stocked part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    id: Option<EntityId>,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl_entity!(StoreItem, "part");

impl StoreItem {
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            price,
            stock,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LineItem {
    Service(EntityId),
    Part(EntityId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub item: LineItem,
    pub quantity: u32,
    /// Copied from the catalog when the purchase is recorded.
    pub unit_price: Money,
}

impl PurchaseLine {
    pub fn total(&self) -> error::Result<Money> {
        self.unit_price
            .times(self.quantity)
            .ok_or_else(|| ShopError::Invalid(format!("Line total overflows: {} x {}", self.quantity, self.unit_price)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    id: Option<EntityId>,
    pub client_id: EntityId,
    #[serde(default)]
    pub vehicle_id: Option<EntityId>,
    pub lines: Vec<PurchaseLine>,
    #[serde(with = "crate::store::adapters::adapted")]
    pub date: NaiveDate,
    #[serde(default)]
    pub recorded_by: Option<EntityId>,
}

impl_entity!(Purchase, "purchase");

impl Purchase {
    pub fn new(client_id: EntityId, lines: Vec<PurchaseLine>, date: NaiveDate) -> Self {
        Self {
            id: None,
            client_id,
            vehicle_id: None,
            lines,
            date,
            recorded_by: None,
        }
    }

    pub fn total(&self) -> error::Result<Money> {
        self.lines.iter().try_fold(Money::ZERO, |sum, line| {
            sum.checked_add(line.total()?)
                .ok_or_else(|| ShopError::Invalid("Purchase total overflows".to_string()))
        })
    }

    /// Quantities per part, summed over lines that name the same part.
    pub fn part_quantities(&self) -> error::Result<Vec<(EntityId, u32)>> {
        let mut out: Vec<(EntityId, u32)> = Vec::new();
        for line in &self.lines {
            if let LineItem::Part(id) = line.item {
                match out.iter_mut().find(|(seen, _)| *seen == id) {
                    Some((_, qty)) => {
                        *qty = qty.checked_add(line.quantity).ok_or_else(|| {
                            ShopError::Invalid(format!("Quantity of part {} overflows", id.short()))
                        })?;
                    }
                    None => out.push((id, line.quantity)),
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    id: Option<EntityId>,
    pub description: String,
    pub category: String,
    pub amount: Money,
    #[serde(with = "crate::store::adapters::adapted")]
    pub date: NaiveDate,
    #[serde(default)]
    pub recorded_by: Option<EntityId>,
}

impl_entity!(Expense, "expense");

impl Expense {
    pub fn new(
        description: impl Into<String>,
        category: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            description: description.into(),
            category: category.into(),
            amount,
            date,
            recorded_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn money_parses_user_input() {
        assert_eq!("12".parse::<Money>().unwrap().cents(), 1200);
        assert_eq!("12.5".parse::<Money>().unwrap().cents(), 1250);
        assert_eq!("12.05".parse::<Money>().unwrap().cents(), 1205);
        assert_eq!(" 0.99 ".parse::<Money>().unwrap().cents(), 99);

        for bad in ["", "-3", "1.234", "abc", ".5", "1.x", "1,50"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn money_displays_two_decimals() {
        assert_eq!(Money::from_cents(1250).to_string(), "12.50");
        assert_eq!(Money::from_cents(7).to_string(), "0.07");
        assert_eq!(Money::from_cents(-1250).to_string(), "-12.50");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
    }

    #[test]
    fn year_month_parse_and_order() {
        let oct: YearMonth = "2026-10".parse().unwrap();
        assert_eq!(oct.to_string(), "2026-10");
        assert!(oct.contains(day(2026, 10, 31)));
        assert!(!oct.contains(day(2025, 10, 1)));
        assert!("2026-09".parse::<YearMonth>().unwrap() < oct);
        assert_eq!(YearMonth::of(day(2027, 1, 3)).to_string(), "2027-01");

        for bad in ["2026-13", "2026-1", "26-10", "october", "2026/10"] {
            assert!(bad.parse::<YearMonth>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Mechanic".parse::<Role>().unwrap(), Role::Mechanic);
        assert_eq!(Role::Manager.to_string(), "manager");
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn new_entities_are_unregistered() {
        let client = Client::new("Ada", "555-0100", day(2026, 10, 19));
        assert!(!client.is_registered());
        assert!(client.owned_vehicle_ids.is_empty());
        assert_eq!(Client::KIND, "client");
        assert_eq!(StoreItem::KIND, "part");
    }

    #[test]
    fn vehicle_plates_are_uppercased() {
        let v = Vehicle::new(EntityId::new_random(), "Saab", "900", 1991, "abc 123", day(2026, 1, 1));
        assert_eq!(v.plate, "ABC 123");
        assert_eq!(v.description(), "1991 Saab 900 (ABC 123)");
    }

    #[test]
    fn purchase_totals_and_part_quantities() {
        let filter = EntityId::new_random();
        let oil_change = EntityId::new_random();
        let purchase = Purchase::new(
            EntityId::new_random(),
            vec![
                PurchaseLine {
                    item: LineItem::Part(filter),
                    quantity: 2,
                    unit_price: Money::from_cents(1500),
                },
                PurchaseLine {
                    item: LineItem::Service(oil_change),
                    quantity: 1,
                    unit_price: Money::from_cents(4000),
                },
                PurchaseLine {
                    item: LineItem::Part(filter),
                    quantity: 1,
                    unit_price: Money::from_cents(1500),
                },
            ],
            day(2026, 10, 19),
        );

        assert_eq!(purchase.total().unwrap(), Money::from_cents(8500));
        assert_eq!(purchase.part_quantities().unwrap(), vec![(filter, 3)]);
    }

    #[test]
    fn overflowing_quantities_and_totals_are_errors() {
        let filter = EntityId::new_random();
        let line = |quantity, cents| PurchaseLine {
            item: LineItem::Part(filter),
            quantity,
            unit_price: Money::from_cents(cents),
        };

        let repeated = Purchase::new(
            EntityId::new_random(),
            vec![line(u32::MAX, 1), line(4, 1)],
            day(2026, 10, 19),
        );
        assert!(matches!(repeated.part_quantities(), Err(ShopError::Invalid(_))));

        let pricey = Purchase::new(
            EntityId::new_random(),
            vec![line(u32::MAX, i64::MAX / 2)],
            day(2026, 10, 19),
        );
        assert!(pricey.total().is_err());

        let two_halves = Purchase::new(
            EntityId::new_random(),
            vec![line(1, i64::MAX), line(1, 1)],
            day(2026, 10, 19),
        );
        assert!(two_halves.total().is_err());

        assert_eq!(Money::from_cents(250).times(3), Some(Money::from_cents(750)));
        assert_eq!(Money::from_cents(i64::MAX).times(2), None);
    }

    #[test]
    fn line_items_serialize_tagged() {
        let id = EntityId::new_random();
        let json = serde_json::to_value(LineItem::Part(id)).unwrap();
        assert_eq!(json["kind"], "part");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn client_links_default_when_missing() {
        let json = r#"{ "id": null, "name": "Ada", "phone": "1", "registered_on": "2026-10-19" }"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert!(client.owned_vehicle_ids.is_empty());
        assert!(client.purchase_ids.is_empty());
        assert_eq!(client.email, None);
    }
}
