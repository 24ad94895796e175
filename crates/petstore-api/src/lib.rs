//! Verification suite for the Pet Store service's store endpoints.
//!
//! [`scenario::catalog`] lists the checks; [`scenario::ScenarioRunner`] runs them
//! against a live service through [`client::StoreClient`].

pub mod client;
pub mod config;
pub mod datetime;
pub mod error;
pub mod expect;
pub mod fixtures;
pub mod order;
pub mod scenario;
pub mod schema;
pub mod specs;

pub use client::{OrderBody, StoreClient, StoreResponse};
pub use datetime::{TimestampFormat, normalize};
pub use error::{AssertionFailure, FormatError, SuiteError};
pub use order::{Order, OrderEquivalence, OrderStatus, ShipDatePolicy};
pub use scenario::{Scenario, ScenarioFilter, ScenarioRunner, SuiteReport, Tag};
pub use specs::{ContentType, RequestSpec, ResponseSpec, ScenarioSpecs};
