use jsonschema::Validator;
use serde_json::Value;

use crate::error::SuiteError;

const INVENTORY_SCHEMA: &str = include_str!("../schemas/inventory.json");

/// Compiled JSON schema applied to response bodies.
pub struct SchemaValidator {
    validator: Validator,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl SchemaValidator {
    pub fn from_value(schema: &Value) -> Result<Self, SuiteError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| SuiteError::InvalidSchema(err.to_string()))?;
        Ok(Self { validator })
    }

    pub fn parse(schema: &str) -> Result<Self, SuiteError> {
        let value: Value = serde_json::from_str(schema)
            .map_err(|source| SuiteError::Decode {
                what: "JSON schema",
                source,
            })?;
        Self::from_value(&value)
    }

    /// String-keyed map of integer counts, as served by `/store/inventory`.
    pub fn inventory() -> Result<Self, SuiteError> {
        Self::parse(INVENTORY_SCHEMA)
    }

    pub fn validate(&self, body: &Value) -> Result<(), SuiteError> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(body)
            .map(|err| err.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SuiteError::Schema { errors })
        }
    }
}
