use crate::config::ShopConfig;
use crate::shop::{Shop, ShopPaths};
use chrono::NaiveDate;
use tempfile::TempDir;

/// A shop in a fresh temp directory. Keep the `TempDir` alive for the test.
pub fn shop() -> (TempDir, Shop) {
    let dir = TempDir::new().unwrap();
    let shop = Shop::open(ShopPaths::new(dir.path()), ShopConfig::default());
    (dir, shop)
}

pub fn reopen(dir: &TempDir) -> Shop {
    Shop::open(ShopPaths::new(dir.path()), ShopConfig::default())
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(2026, 10, 19)
}
