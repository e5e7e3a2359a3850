use crate::commands::{CmdMessage, CmdResult, Listing};
use crate::config::ShopConfig;
use crate::error::Result;
use crate::shop::Shop;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

/// Works on the live shop so that a changed setting takes effect for the rest
/// of the session, not only on the next start.
pub fn run(shop: &mut Shop, action: ConfigAction) -> Result<CmdResult> {
    match action {
        ConfigAction::ShowAll => {
            Ok(CmdResult::default().with_listing(Listing::Config(shop.config().clone())))
        }
        ConfigAction::ShowKey(key) => {
            let message = match shop.config().get(&key) {
                Some(val) => CmdMessage::info(val),
                None => CmdMessage::error(format!("Unknown config key: {}", key)),
            };
            Ok(CmdResult::default().with_message(message))
        }
        ConfigAction::Set(key, value) => {
            let previous = shop.config().clone();
            let mut config = previous.clone();
            if let Err(e) = config.set(&key, &value) {
                return Ok(CmdResult::default().with_message(CmdMessage::error(e.to_string())));
            }

            let display_val = config.get(&key).unwrap_or(value);
            let mut result = CmdResult::default()
                .with_message(CmdMessage::success(format!("{} set to {}", key, display_val)));

            if config != previous {
                let written = switch_config(shop, previous, config.clone())?;
                result.add_message(CmdMessage::info(format!(
                    "Rewrote {} collection file(s).",
                    written
                )));
            }
            Ok(result.with_listing(Listing::Config(config)))
        }
    }
}

/// Rewrites every collection under `next`, then records `next` in
/// `config.json`. If either step fails the files go back to `previous`, so the
/// data files and the saved settings always agree.
fn switch_config(shop: &mut Shop, previous: ShopConfig, next: ShopConfig) -> Result<usize> {
    let root = shop.paths().root().to_path_buf();
    let outcome = shop
        .apply_config(next.clone())
        .and_then(|written| next.save(&root).map(|()| written));

    if outcome.is_err() {
        if let Err(restore) = shop.apply_config(previous) {
            tracing::error!(error = %restore, "could not restore collections after failed config change");
        }
    }
    outcome
}
