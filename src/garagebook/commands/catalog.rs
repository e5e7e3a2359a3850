use crate::commands::{CmdMessage, CmdResult, Listing};
use crate::entity::EntityId;
use crate::error::{Result, ShopError};
use crate::model::{Money, ServiceItem, StoreItem};
use crate::shop::Shop;

fn item_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ShopError::Invalid("Name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

pub fn add_service(shop: &mut Shop, name: &str, price: Money, labour_minutes: u32) -> Result<CmdResult> {
    let name = item_name(name)?;
    let id = shop.register(ServiceItem::new(name.clone(), price, labour_minutes))?;
    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Service added ({}): {} at {}",
        id.short(),
        name,
        price
    ))))
}

pub fn add_part(shop: &mut Shop, name: &str, price: Money, stock: u32) -> Result<CmdResult> {
    let name = item_name(name)?;
    let id = shop.register(StoreItem::new(name.clone(), price, stock))?;
    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Part added ({}): {} at {}, {} in stock",
        id.short(),
        name,
        price,
        stock
    ))))
}

pub fn restock(shop: &mut Shop, id: EntityId, quantity: u32) -> Result<CmdResult> {
    if quantity == 0 {
        return Err(ShopError::Invalid("Restock quantity must be positive".to_string()));
    }

    let mut part = shop.stores().parts.require(&id)?.clone();
    part.stock = part
        .stock
        .checked_add(quantity)
        .ok_or_else(|| ShopError::Invalid(format!("Stock for {} would overflow", part.name)))?;

    let message = format!("{} restocked, {} in stock", part.name, part.stock);
    shop.update(part)?;
    Ok(CmdResult::default()
        .with_affected(id)
        .with_message(CmdMessage::success(message)))
}

pub fn list(shop: &Shop) -> Result<CmdResult> {
    let stores = shop.stores();
    let mut services: Vec<ServiceItem> = stores.services.values().cloned().collect();
    services.sort_by_key(|s| s.name.to_lowercase());
    let mut parts: Vec<StoreItem> = stores.parts.values().cloned().collect();
    parts.sort_by_key(|p| p.name.to_lowercase());

    let mut result = CmdResult::default();
    for part in parts.iter().filter(|p| p.stock == 0) {
        result.add_message(CmdMessage::warning(format!("{} is out of stock", part.name)));
    }
    Ok(result.with_listing(Listing::Catalog { services, parts }))
}
