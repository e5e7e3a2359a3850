use crate::commands::{CmdMessage, CmdResult, Listing, VehicleView};
use crate::entity::{Entity, EntityId};
use crate::error::{Result, ShopError};
use crate::model::Vehicle;
use crate::shop::Shop;
use chrono::{Datelike, NaiveDate};

const FIRST_MODEL_YEAR: u16 = 1886;

pub fn add(
    shop: &mut Shop,
    owner_id: EntityId,
    make: &str,
    model: &str,
    year: u16,
    plate: &str,
    registered_on: NaiveDate,
) -> Result<CmdResult> {
    let owner = shop.stores().clients.require(&owner_id)?.name.clone();

    let latest = u16::try_from(registered_on.year() + 1).unwrap_or(u16::MAX);
    if !(FIRST_MODEL_YEAR..=latest).contains(&year) {
        return Err(ShopError::Invalid(format!("{} is not a plausible model year", year)));
    }

    let plate = plate.trim();
    if plate.is_empty() {
        return Err(ShopError::Invalid("Plate cannot be empty".to_string()));
    }
    let taken = shop
        .stores()
        .vehicles
        .find_first(|v| v.plate.eq_ignore_ascii_case(plate))
        .is_some();
    if taken {
        return Err(ShopError::Invalid(format!(
            "A vehicle with plate {} is already registered",
            plate.to_uppercase()
        )));
    }

    let vehicle = Vehicle::new(owner_id, make.trim(), model.trim(), year, plate, registered_on);
    let description = vehicle.description();
    let id = shop.register(vehicle)?;

    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Vehicle added ({}): {} for {}",
        id.short(),
        description,
        owner
    ))))
}

pub fn list(shop: &Shop, owner: Option<EntityId>) -> Result<CmdResult> {
    let stores = shop.stores();
    if let Some(owner) = owner {
        stores.clients.require(&owner)?;
    }

    let mut views: Vec<VehicleView> = stores
        .vehicles
        .find_all(|v| owner.map_or(true, |o| v.owner_id == o))
        .into_iter()
        .map(|v| VehicleView {
            vehicle: v.clone(),
            owner: stores
                .clients
                .get(&v.owner_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "(unknown)".to_string()),
        })
        .collect();
    views.sort_by(|a, b| a.vehicle.plate.cmp(&b.vehicle.plate));

    let mut result = CmdResult::default();
    if views.is_empty() {
        result.add_message(CmdMessage::info("No vehicles."));
    }
    Ok(result.with_listing(Listing::Vehicles(views)))
}

pub fn remove(shop: &mut Shop, id: EntityId) -> Result<CmdResult> {
    let removed: Option<Vehicle> = shop.remove(&id)?;
    let vehicle = removed.ok_or(ShopError::NotFound {
        kind: Vehicle::KIND,
        id,
    })?;

    Ok(CmdResult::default()
        .with_affected(id)
        .with_message(CmdMessage::success(format!("Vehicle removed: {}", vehicle.description()))))
}
