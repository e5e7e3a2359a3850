use crate::commands::{CmdMessage, CmdResult, Listing, PurchaseView};
use crate::entity::EntityId;
use crate::error::{Result, ShopError};
use crate::model::{LineItem, Purchase, PurchaseLine, StoreItem, YearMonth};
use crate::shop::Shop;
use chrono::NaiveDate;

/// What the user asked to buy. Prices are looked up when it is recorded.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub client: EntityId,
    pub vehicle: Option<EntityId>,
    pub services: Vec<(EntityId, u32)>,
    pub parts: Vec<(EntityId, u32)>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseFilter {
    pub month: Option<YearMonth>,
    pub client: Option<EntityId>,
}

pub fn record(shop: &mut Shop, request: PurchaseRequest) -> Result<CmdResult> {
    let stores = shop.stores();
    let client = stores.clients.require(&request.client)?;

    if let Some(vehicle_id) = request.vehicle {
        let vehicle = stores.vehicles.require(&vehicle_id)?;
        if vehicle.owner_id != request.client {
            return Err(ShopError::Invalid(format!(
                "Vehicle {} does not belong to {}",
                vehicle.plate, client.name
            )));
        }
    }

    if request.services.is_empty() && request.parts.is_empty() {
        return Err(ShopError::Invalid("A purchase needs at least one service or part".to_string()));
    }
    if request
        .services
        .iter()
        .chain(request.parts.iter())
        .any(|(_, qty)| *qty == 0)
    {
        return Err(ShopError::Invalid("Quantities must be positive".to_string()));
    }

    let mut lines = Vec::with_capacity(request.services.len() + request.parts.len());
    for (id, quantity) in &request.services {
        let service = stores.services.require(id)?;
        lines.push(PurchaseLine {
            item: LineItem::Service(*id),
            quantity: *quantity,
            unit_price: service.price,
        });
    }
    for (id, quantity) in &request.parts {
        let part = stores.parts.require(id)?;
        lines.push(PurchaseLine {
            item: LineItem::Part(*id),
            quantity: *quantity,
            unit_price: part.price,
        });
    }

    let mut purchase = Purchase::new(request.client, lines, request.date);
    purchase.vehicle_id = request.vehicle;
    purchase.recorded_by = stores.session.current();

    // Same check the stock rule makes, done up front so nothing is recorded
    // when a part is short.
    for (part_id, wanted) in purchase.part_quantities()? {
        let part: &StoreItem = stores.parts.require(&part_id)?;
        if part.stock < wanted {
            return Err(ShopError::InsufficientStock {
                item: part.name.clone(),
                available: part.stock,
                requested: wanted,
            });
        }
    }

    let client_name = client.name.clone();
    let total = purchase.total()?;
    let id = shop.register(purchase)?;

    Ok(CmdResult::default().with_affected(id).with_message(CmdMessage::success(format!(
        "Purchase recorded ({}): {} for {}",
        id.short(),
        total,
        client_name
    ))))
}

pub fn list(shop: &Shop, filter: PurchaseFilter) -> Result<CmdResult> {
    let stores = shop.stores();
    if let Some(client) = filter.client {
        stores.clients.require(&client)?;
    }

    let mut views: Vec<PurchaseView> = stores
        .purchases
        .find_all(|p| {
            filter.month.map_or(true, |m| m.contains(p.date))
                && filter.client.map_or(true, |c| p.client_id == c)
        })
        .into_iter()
        .map(|p| {
            Ok(PurchaseView {
                purchase: p.clone(),
                client: stores
                    .clients
                    .get(&p.client_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "(removed client)".to_string()),
                vehicle: p
                    .vehicle_id
                    .and_then(|id| stores.vehicles.get(&id))
                    .map(|v| v.plate.clone()),
                total: p.total()?,
            })
        })
        .collect::<Result<_>>()?;
    views.sort_by_key(|v| v.purchase.date);

    let mut result = CmdResult::default();
    if views.is_empty() {
        result.add_message(CmdMessage::info("No purchases."));
    }
    Ok(result.with_listing(Listing::Purchases(views)))
}
