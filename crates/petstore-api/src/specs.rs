use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::SuiteError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Json,
    Text,
    Any,
}

impl ContentType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
            ContentType::Any => "*/*",
        }
    }
}

/// Defaults applied to every request of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    base_uri: String,
    content_type: ContentType,
}

impl RequestSpec {
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Join `path` onto the base URI without doubling the separator.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_uri.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Expectations checked against every response of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSpec {
    expected_status: u16,
}

impl ResponseSpec {
    pub fn expected_status(&self) -> u16 {
        self.expected_status
    }
}

#[derive(Debug, Default)]
pub struct RequestSpecBuilder {
    base_uri: Option<String>,
    content_type: ContentType,
}

impl RequestSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_uri(mut self, uri: impl Into<String>) -> Self {
        self.base_uri = Some(uri.into());
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn build(self) -> Result<RequestSpec, SuiteError> {
        let base_uri = self
            .base_uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(SuiteError::MissingBaseUri)?;
        Ok(RequestSpec {
            base_uri,
            content_type: self.content_type,
        })
    }
}

#[derive(Debug)]
pub struct ResponseSpecBuilder {
    expected_status: u16,
}

impl Default for ResponseSpecBuilder {
    fn default() -> Self {
        Self {
            expected_status: 200,
        }
    }
}

impl ResponseSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn build(self) -> ResponseSpec {
        ResponseSpec {
            expected_status: self.expected_status,
        }
    }
}

pub fn request_spec(
    base_uri: impl Into<String>,
    content_type: ContentType,
) -> Result<RequestSpec, SuiteError> {
    RequestSpecBuilder::new()
        .base_uri(base_uri)
        .content_type(content_type)
        .build()
}

pub fn response_spec(expected_status: u16) -> ResponseSpec {
    ResponseSpecBuilder::new().expect_status(expected_status).build()
}

/// Request and response specs travelling together with one scenario's client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpecs {
    pub request: RequestSpec,
    pub response: ResponseSpec,
}

impl ScenarioSpecs {
    pub fn new(request: RequestSpec, response: ResponseSpec) -> Self {
        Self { request, response }
    }
}

static INSTALLED: Lazy<RwLock<Option<ScenarioSpecs>>> = Lazy::new(|| RwLock::new(None));

/// Install process-wide default specs, replacing any previous pair.
///
/// Shared by every caller of [`installed`]; scenarios that may run concurrently
/// should carry a [`ScenarioSpecs`] instead.
pub fn install(request: RequestSpec, response: ResponseSpec) {
    *INSTALLED.write() = Some(ScenarioSpecs::new(request, response));
}

pub fn installed() -> Option<ScenarioSpecs> {
    INSTALLED.read().clone()
}

pub fn uninstall() {
    INSTALLED.write().take();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_spec_requires_base_uri() {
        assert!(matches!(
            RequestSpecBuilder::new().build(),
            Err(SuiteError::MissingBaseUri)
        ));
        assert!(matches!(
            request_spec("  ", ContentType::Json),
            Err(SuiteError::MissingBaseUri)
        ));
    }

    #[test]
    fn url_joins_paths_with_single_slash() {
        let spec = request_spec("https://petstore.swagger.io/v2/", ContentType::Json).unwrap();
        assert_eq!(
            spec.url("/store/order/4"),
            "https://petstore.swagger.io/v2/store/order/4"
        );
        assert_eq!(spec.url("store/order/"), "https://petstore.swagger.io/v2/store/order/");
        assert_eq!(spec.content_type().as_mime(), "application/json");
    }

    #[test]
    fn response_spec_defaults_to_ok() {
        assert_eq!(ResponseSpecBuilder::new().build().expected_status(), 200);
        assert_eq!(response_spec(404).expected_status(), 404);
    }

    #[test]
    fn installed_specs_are_replaced_by_the_next_install() {
        uninstall();
        assert!(installed().is_none());

        let request = request_spec("http://localhost:1", ContentType::Json).unwrap();
        install(request.clone(), response_spec(200));
        assert_eq!(installed().map(|s| s.response.expected_status()), Some(200));

        install(request, response_spec(404));
        assert_eq!(installed().map(|s| s.response.expected_status()), Some(404));

        uninstall();
        assert!(installed().is_none());
    }
}
