//! # Application Root
//!
//! [`Shop`] owns every repository ([`Stores`]) and the [`EventBus`]. The two
//! are separate fields so a broadcast can hand listeners `&mut Stores` while
//! the bus itself stays borrowed by the dispatch loop.
//!
//! Every mutation that other collections care about goes through the shop:
//!
//! 1. the repository persists the change and returns its effects,
//! 2. [`Shop::dispatch`] routes each effect to the entity's channel,
//! 3. the consistency rules in [`crate::rules`] update the other repositories.
//!
//! When step 3 fails the originating record is already durable; the error
//! reports which listeners failed.

use crate::config::ShopConfig;
use crate::entity::{Entity, EntityId};
use crate::error::{Result, ShopError};
use crate::events::{Broadcaster, Signal};
use crate::ledger::Ledger;
use crate::model::{Client, Employee, Expense, Purchase, ServiceItem, StoreItem, Vehicle, YearMonth};
use crate::rules::InstalledRules;
use crate::session::{self, Session};
use crate::store::repository::{Committed, Effect, Repository};
use crate::store::Persistence;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ShopPaths {
    root: PathBuf,
}

impl ShopPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn employees(&self) -> PathBuf {
        self.root.join("employees.json")
    }

    pub fn clients(&self) -> PathBuf {
        self.root.join("clients.json")
    }

    pub fn vehicles(&self) -> PathBuf {
        self.root.join("vehicles.json")
    }

    pub fn services(&self) -> PathBuf {
        self.root.join("services.json")
    }

    pub fn parts(&self) -> PathBuf {
        self.root.join("store.json")
    }

    pub fn purchases(&self) -> PathBuf {
        self.root.join("purchases.json")
    }

    pub fn expenses_dir(&self) -> PathBuf {
        self.root.join("expenses")
    }

    pub fn expenses(&self, month: YearMonth) -> PathBuf {
        self.expenses_dir().join(format!("{}.json", month))
    }
}

pub struct Stores {
    pub employees: Repository<Employee>,
    pub clients: Repository<Client>,
    pub vehicles: Repository<Vehicle>,
    pub services: Repository<ServiceItem>,
    pub parts: Repository<StoreItem>,
    pub purchases: Repository<Purchase>,
    pub ledger: Ledger,
    pub session: Session,
}

impl Stores {
    pub fn open(persistence: &Rc<Persistence>, paths: &ShopPaths) -> Self {
        Self {
            employees: Repository::open(Rc::clone(persistence), paths.employees()),
            clients: Repository::open(Rc::clone(persistence), paths.clients()),
            vehicles: Repository::open(Rc::clone(persistence), paths.vehicles()),
            services: Repository::open(Rc::clone(persistence), paths.services()),
            parts: Repository::open(Rc::clone(persistence), paths.parts()),
            purchases: Repository::open(Rc::clone(persistence), paths.purchases()),
            ledger: Ledger::open(Rc::clone(persistence), paths.expenses_dir()),
            session: Session::default(),
        }
    }

    /// Rewrites every open collection file from memory. Returns how many were written.
    pub fn flush_all(&self) -> Result<usize> {
        self.employees.flush()?;
        self.clients.flush()?;
        self.vehicles.flush()?;
        self.services.flush()?;
        self.parts.flush()?;
        self.purchases.flush()?;
        Ok(6 + self.ledger.flush_all()?)
    }
}

/// The registered / updated / removed broadcasters of one entity type.
pub struct Channels<T> {
    pub registered: Broadcaster<Stores, T>,
    pub updated: Broadcaster<Stores, T>,
    pub removed: Broadcaster<Stores, T>,
}

impl<T: Entity> Channels<T> {
    fn new(registered: &'static str, updated: &'static str, removed: &'static str) -> Self {
        Self {
            registered: Broadcaster::new(registered),
            updated: Broadcaster::new(updated),
            removed: Broadcaster::new(removed),
        }
    }

    fn for_effect(&mut self, effect: &Effect<T>) -> &mut Broadcaster<Stores, T> {
        match effect {
            Effect::Registered(_) => &mut self.registered,
            Effect::Updated(_) => &mut self.updated,
            Effect::Removed(_) => &mut self.removed,
        }
    }
}

macro_rules! channels {
    ($kind:literal) => {
        Channels::new(
            concat!($kind, " registered"),
            concat!($kind, " updated"),
            concat!($kind, " removed"),
        )
    };
}

pub struct EventBus {
    pub employees: Channels<Employee>,
    pub clients: Channels<Client>,
    pub vehicles: Channels<Vehicle>,
    pub services: Channels<ServiceItem>,
    pub parts: Channels<StoreItem>,
    pub purchases: Channels<Purchase>,
    pub expenses: Channels<Expense>,
    pub session_changed: Signal<Stores>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            employees: channels!("employee"),
            clients: channels!("client"),
            vehicles: channels!("vehicle"),
            services: channels!("service"),
            parts: channels!("part"),
            purchases: channels!("purchase"),
            expenses: channels!("expense"),
            session_changed: Signal::new("session changed"),
        }
    }
}

/// Entities whose effects are published on the [`EventBus`].
pub trait Routed: Entity {
    fn channels(bus: &mut EventBus) -> &mut Channels<Self>;
}

/// Entities kept in a single repository inside [`Stores`].
pub trait Stored: Routed {
    fn repository(stores: &mut Stores) -> &mut Repository<Self>;
    fn repository_ref(stores: &Stores) -> &Repository<Self>;
}

macro_rules! routed {
    ($ty:ty, $field:ident) => {
        impl Routed for $ty {
            fn channels(bus: &mut EventBus) -> &mut Channels<Self> {
                &mut bus.$field
            }
        }
    };
    ($ty:ty, $field:ident, stored) => {
        routed!($ty, $field);

        impl Stored for $ty {
            fn repository(stores: &mut Stores) -> &mut Repository<Self> {
                &mut stores.$field
            }

            fn repository_ref(stores: &Stores) -> &Repository<Self> {
                &stores.$field
            }
        }
    };
}

routed!(Employee, employees, stored);
routed!(Client, clients, stored);
routed!(Vehicle, vehicles, stored);
routed!(ServiceItem, services, stored);
routed!(StoreItem, parts, stored);
routed!(Purchase, purchases, stored);
routed!(Expense, expenses);

pub struct Shop {
    paths: ShopPaths,
    config: ShopConfig,
    persistence: Rc<Persistence>,
    stores: Stores,
    bus: EventBus,
    rules: Option<InstalledRules>,
}

impl Shop {
    /// Loads every collection and installs the consistency rules.
    pub fn open(paths: ShopPaths, config: ShopConfig) -> Self {
        let persistence = Rc::new(Persistence::new(config.adapters(), config.obfuscate));
        let stores = Stores::open(&persistence, &paths);
        let mut bus = EventBus::default();
        let rules = InstalledRules::install(&mut bus);

        tracing::debug!(
            root = %paths.root().display(),
            obfuscate = config.obfuscate,
            clients = stores.clients.len(),
            vehicles = stores.vehicles.len(),
            "shop opened"
        );

        Self {
            paths,
            config,
            persistence,
            stores,
            bus,
            rules: Some(rules),
        }
    }

    pub fn paths(&self) -> &ShopPaths {
        &self.paths
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn persistence(&self) -> &Rc<Persistence> {
        &self.persistence
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Direct access, bypassing the bus. Changes made this way are not broadcast.
    pub fn stores_mut(&mut self) -> &mut Stores {
        &mut self.stores
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn dispatch<T: Routed>(&mut self, committed: &Committed<T>) -> Result<()> {
        let channels = T::channels(&mut self.bus);
        for effect in &committed.effects {
            channels
                .for_effect(effect)
                .broadcast(&mut self.stores, effect.entity())?;
        }
        Ok(())
    }

    pub fn register<T: Stored>(&mut self, entity: T) -> Result<EntityId> {
        let committed = T::repository(&mut self.stores).register(entity)?;
        self.dispatch(&committed)?;
        Ok(committed.id)
    }

    pub fn update<T: Stored>(&mut self, entity: T) -> Result<()> {
        let committed = T::repository(&mut self.stores).update(entity)?;
        self.dispatch(&committed)
    }

    /// Returns the removed entity, or `None` if the id was unknown.
    pub fn remove<T: Stored>(&mut self, id: &EntityId) -> Result<Option<T>> {
        let Some(committed) = T::repository(&mut self.stores).delete(id)? else {
            return Ok(None);
        };
        self.dispatch(&committed)?;
        Ok(committed.entity().cloned())
    }

    pub fn record_expense(&mut self, expense: Expense) -> Result<EntityId> {
        let committed = self.stores.ledger.record(expense)?;
        self.dispatch(&committed)?;
        Ok(committed.id)
    }

    /// Returns the removed expense, or `None` if `month` has no such id.
    pub fn remove_expense(&mut self, month: YearMonth, id: &EntityId) -> Result<Option<Expense>> {
        let Some(committed) = self.stores.ledger.remove(month, id)? else {
            return Ok(None);
        };
        self.dispatch(&committed)?;
        Ok(committed.entity().cloned())
    }

    /// Switches to `config` and rewrites every file in the new form, so data
    /// written under the old date format stays readable.
    pub fn apply_config(&mut self, config: ShopConfig) -> Result<usize> {
        // Month files must be read under the old settings before they change.
        self.stores.ledger.load_all();
        self.persistence.register_adapters(config.adapters());
        self.persistence.set_obfuscate(config.obfuscate);
        let written = self.stores.flush_all()?;
        tracing::info!(files = written, "collections rewritten for new configuration");
        self.config = config;
        Ok(written)
    }

    /// Logs in the employee with this name (case-insensitive) and password.
    pub fn login(&mut self, name: &str, password: &str) -> Result<EntityId> {
        let wanted = name.trim().to_lowercase();
        let id = self
            .stores
            .employees
            .iter()
            .find(|(_, e)| {
                e.name.to_lowercase() == wanted && session::verify_password(password, e.password_hash)
            })
            .map(|(id, _)| *id)
            .ok_or_else(|| ShopError::Auth(name.to_string()))?;

        self.set_session(Some(id))?;
        tracing::info!(employee = %id, "logged in");
        Ok(id)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.set_session(None)
    }

    pub fn current_employee(&self) -> Option<&Employee> {
        self.stores
            .session
            .current()
            .and_then(|id| self.stores.employees.get(&id))
    }

    fn set_session(&mut self, employee: Option<EntityId>) -> Result<()> {
        if self.stores.session.set(employee) {
            self.bus.session_changed.emit(&mut self.stores)?;
        }
        Ok(())
    }

    /// Removes the consistency rules. Later mutations are no longer propagated.
    pub fn shutdown(&mut self) {
        if let Some(rules) = self.rules.take() {
            rules.uninstall(&mut self.bus);
            tracing::debug!("consistency rules removed");
        }
    }
}
