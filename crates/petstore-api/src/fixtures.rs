use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::error::SuiteError;
use crate::order::{Order, OrderStatus};

pub const FIXTURE_ORDER_ID: i64 = 4;
pub const MISSING_ORDER_ID: i64 = 999_999;
pub const NEGATIVE_ORDER_ID: i64 = -999_999;

pub struct Fixture;

impl Fixture {
    /// Load a JSON fixture relative to `fixtures/`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Value> {
        let full = fixtures_root().join(path.as_ref());
        let data = fs::read_to_string(&full)
            .with_context(|| format!("failed to read fixture {}", full.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in fixture {}", full.display()))
    }

    /// Load an order fixture relative to `fixtures/`.
    pub fn load_order(path: impl AsRef<Path>) -> Result<Order> {
        let path = path.as_ref();
        let value = Self::load_json(path)?;
        serde_json::from_value(value)
            .with_context(|| format!("fixture {} is not an order", path.display()))
    }
}

/// The order every positive scenario submits.
pub fn order_for_pet() -> Order {
    Order {
        id: Some(FIXTURE_ORDER_ID),
        pet_id: Some(1),
        quantity: Some(5),
        ship_date: Some("2024-06-12T08:22:23.354Z".into()),
        status: Some(OrderStatus::Placed),
        complete: Some(true),
    }
}

/// [`order_for_pet`] as a generic field map.
pub fn order_for_pet_fields() -> Result<Map<String, Value>, SuiteError> {
    order_for_pet().to_json_map()
}

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|root| root.join("fixtures"))
        .unwrap_or_else(|| PathBuf::from("fixtures"))
}
