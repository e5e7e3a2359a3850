//! # Consistency Rules
//!
//! Collections refer to each other by id, and some records keep back references
//! that another collection's mutations must maintain:
//!
//! | event | rule |
//! |---|---|
//! | vehicle registered | add the vehicle to its owner's `owned_vehicle_ids` |
//! | vehicle removed | drop it from the owner's list |
//! | purchase registered | add it to the client's `purchase_ids` |
//! | purchase registered | take the sold parts out of stock |
//! | session changed | stamp `last_login` on the employee now logged in |
//!
//! Rules write straight to the repositories in [`Stores`]. The effects of those
//! writes are not dispatched again, so a rule never triggers another rule.

use crate::entity::{Entity, EntityId};
use crate::error::{Result, ShopError};
use crate::events::ListenerId;
use crate::model::{Client, Employee, Purchase, StoreItem, Vehicle};
use crate::shop::{EventBus, Stores};
use chrono::Utc;

/// Listener handles, kept so the rules can be removed again.
#[derive(Debug)]
pub struct InstalledRules {
    vehicle_linked: ListenerId,
    vehicle_unlinked: ListenerId,
    purchase_linked: ListenerId,
    stock_drawn: ListenerId,
    login_stamped: ListenerId,
}

impl InstalledRules {
    pub fn install(bus: &mut EventBus) -> Self {
        Self {
            vehicle_linked: bus.vehicles.registered.add_listener(link_vehicle_to_owner),
            vehicle_unlinked: bus.vehicles.removed.add_listener(unlink_vehicle_from_owner),
            purchase_linked: bus.purchases.registered.add_listener(link_purchase_to_client),
            stock_drawn: bus.purchases.registered.add_listener(draw_down_stock),
            login_stamped: bus.session_changed.add_listener(stamp_last_login),
        }
    }

    pub fn uninstall(self, bus: &mut EventBus) {
        bus.vehicles.registered.remove_listener(self.vehicle_linked);
        bus.vehicles.removed.remove_listener(self.vehicle_unlinked);
        bus.purchases.registered.remove_listener(self.purchase_linked);
        bus.purchases.registered.remove_listener(self.stock_drawn);
        bus.session_changed.remove_listener(self.login_stamped);
    }
}

fn registered_id<T: Entity>(entity: &T) -> Result<EntityId> {
    entity.id().ok_or(ShopError::Unregistered { kind: T::KIND })
}

fn client_for(stores: &Stores, referrer: &'static str, id: EntityId) -> Result<Client> {
    stores
        .clients
        .get(&id)
        .cloned()
        .ok_or(ShopError::DanglingReference {
            referrer,
            kind: Client::KIND,
            id,
        })
}

pub fn link_vehicle_to_owner(stores: &mut Stores, vehicle: &Vehicle) -> Result<()> {
    let vehicle_id = registered_id(vehicle)?;
    let mut owner = client_for(stores, Vehicle::KIND, vehicle.owner_id)?;

    if owner.owned_vehicle_ids.contains(&vehicle_id) {
        return Ok(());
    }
    owner.owned_vehicle_ids.push(vehicle_id);
    stores.clients.update(owner)?;
    Ok(())
}

/// A missing owner is not an error here: the link is gone either way.
pub fn unlink_vehicle_from_owner(stores: &mut Stores, vehicle: &Vehicle) -> Result<()> {
    let vehicle_id = registered_id(vehicle)?;
    let Some(owner) = stores.clients.get(&vehicle.owner_id) else {
        tracing::warn!(vehicle = %vehicle_id, owner = %vehicle.owner_id, "removed vehicle had no owner on file");
        return Ok(());
    };

    if !owner.owned_vehicle_ids.contains(&vehicle_id) {
        return Ok(());
    }
    let mut owner = owner.clone();
    owner.owned_vehicle_ids.retain(|id| *id != vehicle_id);
    stores.clients.update(owner)?;
    Ok(())
}

pub fn link_purchase_to_client(stores: &mut Stores, purchase: &Purchase) -> Result<()> {
    let purchase_id = registered_id(purchase)?;
    let mut client = client_for(stores, Purchase::KIND, purchase.client_id)?;

    if client.purchase_ids.contains(&purchase_id) {
        return Ok(());
    }
    client.purchase_ids.push(purchase_id);
    stores.clients.update(client)?;
    Ok(())
}

/// Checks every part line before touching any stock, so a purchase is drawn
/// down completely or not at all.
pub fn draw_down_stock(stores: &mut Stores, purchase: &Purchase) -> Result<()> {
    let mut drawn: Vec<StoreItem> = Vec::new();

    for (part_id, quantity) in purchase.part_quantities()? {
        let part = stores
            .parts
            .get(&part_id)
            .ok_or(ShopError::DanglingReference {
                referrer: Purchase::KIND,
                kind: StoreItem::KIND,
                id: part_id,
            })?;

        let remaining = part
            .stock
            .checked_sub(quantity)
            .ok_or_else(|| ShopError::InsufficientStock {
                item: part.name.clone(),
                available: part.stock,
                requested: quantity,
            })?;

        let mut part = part.clone();
        part.stock = remaining;
        drawn.push(part);
    }

    for part in drawn {
        stores.parts.update(part)?;
    }
    Ok(())
}

pub fn stamp_last_login(stores: &mut Stores, _: &()) -> Result<()> {
    let Some(employee_id) = stores.session.current() else {
        return Ok(());
    };

    let mut employee = stores
        .employees
        .get(&employee_id)
        .cloned()
        .ok_or(ShopError::DanglingReference {
            referrer: "session",
            kind: Employee::KIND,
            id: employee_id,
        })?;
    employee.last_login = Some(Utc::now());
    stores.employees.update(employee)?;
    Ok(())
}
