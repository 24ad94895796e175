use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use ureq::{Agent, Body, http::Response};

use crate::error::SuiteError;
use crate::order::Order;
use crate::schema::SchemaValidator;
use crate::specs::{self, ScenarioSpecs};

const INVENTORY_PATH: &str = "/store/inventory";
const ORDER_PATH: &str = "/store/order";

/// Status and parsed body of one store call.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: Value,
}

impl StoreResponse {
    /// The `message` field of an error or acknowledgement body.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The `message` field read as an integer, whether sent as a number or a numeric string.
    pub fn message_as_i64(&self) -> Option<i64> {
        match self.body.get("message")? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, SuiteError> {
        serde_json::from_value(self.body.clone())
            .map_err(|source| SuiteError::Decode { what, source })
    }
}

/// Payload for `POST /store/order`.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderBody {
    Typed(Order),
    Json(Value),
    /// Sent verbatim; the empty string provokes the service's validation error.
    Raw(String),
}

impl OrderBody {
    fn into_payload(self) -> Result<String, SuiteError> {
        match self {
            OrderBody::Typed(order) => serde_json::to_string(&order).map_err(|source| {
                SuiteError::Decode {
                    what: "order request body",
                    source,
                }
            }),
            OrderBody::Json(value) => Ok(value.to_string()),
            OrderBody::Raw(text) => Ok(text),
        }
    }
}

impl From<Order> for OrderBody {
    fn from(order: Order) -> Self {
        OrderBody::Typed(order)
    }
}

impl From<&Order> for OrderBody {
    fn from(order: &Order) -> Self {
        OrderBody::Typed(order.clone())
    }
}

impl From<Value> for OrderBody {
    fn from(value: Value) -> Self {
        OrderBody::Json(value)
    }
}

impl From<Map<String, Value>> for OrderBody {
    fn from(map: Map<String, Value>) -> Self {
        OrderBody::Json(Value::Object(map))
    }
}

impl From<&str> for OrderBody {
    fn from(text: &str) -> Self {
        OrderBody::Raw(text.to_string())
    }
}

impl From<String> for OrderBody {
    fn from(text: String) -> Self {
        OrderBody::Raw(text)
    }
}

/// Typed access to the store endpoints under one scenario's specs.
///
/// Every call is attempted once. A status other than the response spec's
/// expected status is returned as [`SuiteError::UnexpectedStatus`] before the
/// body is looked at.
#[derive(Clone)]
pub struct StoreClient {
    agent: Agent,
    specs: ScenarioSpecs,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    pub fn new(specs: ScenarioSpecs) -> Self {
        Self::with_agent(build_agent(), specs)
    }

    pub fn with_agent(agent: Agent, specs: ScenarioSpecs) -> Self {
        Self { agent, specs }
    }

    /// Client bound to the process-wide specs from [`specs::install`].
    pub fn from_installed() -> Result<Self, SuiteError> {
        specs::installed()
            .map(Self::new)
            .ok_or(SuiteError::SpecsNotInstalled)
    }

    /// A client sharing this one's connection pool under different specs.
    pub fn with_specs(&self, specs: ScenarioSpecs) -> Self {
        Self::with_agent(self.agent.clone(), specs)
    }

    pub fn specs(&self) -> &ScenarioSpecs {
        &self.specs
    }

    pub fn get_inventory(
        &self,
        validator: Option<&SchemaValidator>,
    ) -> Result<StoreResponse, SuiteError> {
        let response = self.get(INVENTORY_PATH)?;
        if let Some(validator) = validator {
            validator.validate(&response.body)?;
        }
        Ok(response)
    }

    pub fn place_order(&self, body: impl Into<OrderBody>) -> Result<StoreResponse, SuiteError> {
        let payload = body.into().into_payload()?;
        let url = self.specs.request.url(ORDER_PATH);
        let mime = self.specs.request.content_type().as_mime();
        let result = self
            .agent
            .post(&url)
            .header("Content-Type", mime)
            .header("Accept", mime)
            .send(payload);
        self.finish("POST", url, result)
    }

    /// `id` is rendered into the path as-is, so negative or empty ids reach the service.
    pub fn find_order_by_id(&self, id: impl Display) -> Result<StoreResponse, SuiteError> {
        self.get(&format!("{ORDER_PATH}/{id}"))
    }

    pub fn delete_order_by_id(&self, id: impl Display) -> Result<StoreResponse, SuiteError> {
        let url = self.specs.request.url(&format!("{ORDER_PATH}/{id}"));
        let mime = self.specs.request.content_type().as_mime();
        let result = self
            .agent
            .delete(&url)
            .header("Content-Type", mime)
            .header("Accept", mime)
            .call();
        self.finish("DELETE", url, result)
    }

    fn get(&self, path: &str) -> Result<StoreResponse, SuiteError> {
        let url = self.specs.request.url(path);
        let mime = self.specs.request.content_type().as_mime();
        let result = self
            .agent
            .get(&url)
            .header("Content-Type", mime)
            .header("Accept", mime)
            .call();
        self.finish("GET", url, result)
    }

    fn finish(
        &self,
        method: &'static str,
        url: String,
        result: Result<Response<Body>, ureq::Error>,
    ) -> Result<StoreResponse, SuiteError> {
        let mut response = match result {
            Ok(response) => response,
            Err(source) => return Err(SuiteError::Transport { method, url, source }),
        };
        let status = response.status().as_u16();
        let text = match response.body_mut().read_to_string() {
            Ok(text) => text,
            Err(source) => return Err(SuiteError::Transport { method, url, source }),
        };
        debug!(method, %url, status, bytes = text.len(), "store call completed");

        let expected = self.specs.response.expected_status();
        if status != expected {
            return Err(SuiteError::UnexpectedStatus {
                method,
                url,
                expected,
                actual: status,
                body: text,
            });
        }
        Ok(StoreResponse {
            status,
            body: parse_body(&text),
        })
    }
}

fn build_agent() -> Agent {
    let config = Agent::config_builder().http_status_as_error(false).build();
    Agent::new_with_config(config)
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
