use crate::commands::{ClientDetail, CmdMessage, CmdResult, Listing};
use crate::entity::EntityId;
use crate::error::{Result, ShopError};
use crate::matcher::SimpleMatcher;
use crate::model::{Client, Money, Purchase, Vehicle};
use crate::shop::Shop;
use chrono::NaiveDate;

/// Minimum matcher score for `client find`.
pub const FIND_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ClientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ShopError::Invalid(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

pub fn add(
    shop: &mut Shop,
    name: &str,
    phone: &str,
    email: Option<&str>,
    registered_on: NaiveDate,
) -> Result<CmdResult> {
    let mut client = Client::new(required("Name", name)?, required("Phone", phone)?, registered_on);
    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        client = client.with_email(email);
    }

    let display = client.name.clone();
    let id = shop.register(client)?;
    Ok(CmdResult::default()
        .with_affected(id)
        .with_message(CmdMessage::success(format!("Client added ({}): {}", id.short(), display))))
}

pub fn list(shop: &Shop) -> Result<CmdResult> {
    let mut clients: Vec<Client> = shop.stores().clients.values().cloned().collect();
    clients.sort_by_key(|c| c.name.to_lowercase());

    let mut result = CmdResult::default();
    if clients.is_empty() {
        result.add_message(CmdMessage::info("No clients yet."));
    }
    Ok(result.with_listing(Listing::Clients(clients)))
}

pub fn show(shop: &Shop, id: EntityId) -> Result<CmdResult> {
    let stores = shop.stores();
    let client = stores.clients.require(&id)?.clone();

    let mut vehicles: Vec<Vehicle> = client
        .owned_vehicle_ids
        .iter()
        .filter_map(|vid| stores.vehicles.get(vid).cloned())
        .collect();
    vehicles.sort_by(|a, b| a.plate.cmp(&b.plate));

    let mut purchases: Vec<(Purchase, Money)> = client
        .purchase_ids
        .iter()
        .filter_map(|pid| stores.purchases.get(pid))
        .map(|p| Ok((p.clone(), p.total()?)))
        .collect::<Result<_>>()?;
    purchases.sort_by_key(|(p, _)| p.date);

    let spent = purchases
        .iter()
        .try_fold(Money::ZERO, |sum, (_, total)| sum.checked_add(*total))
        .ok_or_else(|| ShopError::Invalid(format!("Total spent by {} overflows", client.name)))?;
    let detail = ClientDetail {
        client,
        vehicles,
        purchases,
        spent,
    };
    Ok(CmdResult::default()
        .with_affected(id)
        .with_listing(Listing::Client(Box::new(detail))))
}

pub fn find(shop: &Shop, pattern: &str) -> Result<CmdResult> {
    let hits: Vec<Client> = shop
        .stores()
        .clients
        .search(&SimpleMatcher, pattern, |c| c.name.clone(), FIND_THRESHOLD)
        .into_iter()
        .cloned()
        .collect();

    let mut result = CmdResult::default();
    if hits.is_empty() {
        result.add_message(CmdMessage::warning(format!("No client matches '{}'", pattern)));
    }
    Ok(result.with_listing(Listing::Clients(hits)))
}

pub fn update(shop: &mut Shop, id: EntityId, changes: ClientUpdate) -> Result<CmdResult> {
    if changes.is_empty() {
        return Ok(CmdResult::default().with_message(CmdMessage::info("Nothing to update.")));
    }

    let mut client = shop.stores().clients.require(&id)?.clone();
    if let Some(name) = changes.name {
        client.name = required("Name", &name)?;
    }
    if let Some(phone) = changes.phone {
        client.phone = required("Phone", &phone)?;
    }
    if let Some(email) = changes.email {
        let email = email.trim();
        client.email = (!email.is_empty()).then(|| email.to_string());
    }

    let display = client.name.clone();
    shop.update(client)?;
    Ok(CmdResult::default()
        .with_affected(id)
        .with_message(CmdMessage::success(format!("Client updated ({}): {}", id.short(), display))))
}

/// Refuses while the client still owns vehicles; their purchases stay on record.
pub fn remove(shop: &mut Shop, id: EntityId) -> Result<CmdResult> {
    let client = shop.stores().clients.require(&id)?;
    if !client.owned_vehicle_ids.is_empty() {
        return Err(ShopError::Invalid(format!(
            "{} still owns {} vehicle(s); remove them first",
            client.name,
            client.owned_vehicle_ids.len()
        )));
    }

    let removed: Option<Client> = shop.remove(&id)?;
    let mut result = CmdResult::default().with_affected(id);
    if let Some(client) = removed {
        result.add_message(CmdMessage::success(format!("Client removed: {}", client.name)));
    }
    Ok(result)
}
