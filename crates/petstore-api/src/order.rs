use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::datetime::{TimestampFormat, normalize, suffix_trim_matches};
use crate::error::{FormatError, SuiteError};

const SHIP_DATE: &str = "shipDate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Approved,
    Delivered,
}

/// Store order as it travels over the wire. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
}

impl Order {
    /// Generic key/value view of the order, as sent by field-map request bodies.
    pub fn to_json_map(&self) -> Result<Map<String, Value>, SuiteError> {
        let encode_error = |source| SuiteError::Decode {
            what: "order field map",
            source,
        };
        match serde_json::to_value(self).map_err(encode_error)? {
            Value::Object(map) => Ok(map),
            other => Err(encode_error(serde::ser::Error::custom(format!(
                "order serialized to {other} instead of an object"
            )))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipDatePolicy {
    /// Parse each side with its declared format and compare the normalized strings.
    #[default]
    Normalize,
    /// Trim the returned zone suffix and look for the rest in the submitted value.
    SuffixTrim,
}

/// One field that differs between a submitted and a returned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: String,
    pub submitted: Value,
    pub returned: Value,
}

/// Field-by-field comparison of a submitted order against the service's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEquivalence {
    submitted_format: TimestampFormat,
    returned_format: TimestampFormat,
    policy: ShipDatePolicy,
}

impl Default for OrderEquivalence {
    fn default() -> Self {
        Self::new(TimestampFormat::UtcMillis, TimestampFormat::OffsetTenthMillis)
    }
}

impl OrderEquivalence {
    pub fn new(submitted_format: TimestampFormat, returned_format: TimestampFormat) -> Self {
        Self {
            submitted_format,
            returned_format,
            policy: ShipDatePolicy::Normalize,
        }
    }

    pub fn with_policy(mut self, policy: ShipDatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn equals(&self, submitted: &Order, returned: &Order) -> Result<bool, FormatError> {
        self.mismatches(submitted, returned)
            .map(|mismatches| mismatches.is_empty())
    }

    pub fn mismatches(
        &self,
        submitted: &Order,
        returned: &Order,
    ) -> Result<Vec<FieldMismatch>, FormatError> {
        let mut out = Vec::new();
        push_if_differs(&mut out, "id", &submitted.id, &returned.id);
        push_if_differs(&mut out, "petId", &submitted.pet_id, &returned.pet_id);
        push_if_differs(&mut out, "quantity", &submitted.quantity, &returned.quantity);
        push_if_differs(&mut out, "status", &submitted.status, &returned.status);
        push_if_differs(&mut out, "complete", &submitted.complete, &returned.complete);
        let same_date = match (&submitted.ship_date, &returned.ship_date) {
            (Some(a), Some(b)) => self.ship_dates_match(a, b)?,
            (None, None) => true,
            _ => false,
        };
        if !same_date {
            out.push(FieldMismatch {
                field: SHIP_DATE.into(),
                submitted: json_of(&submitted.ship_date),
                returned: json_of(&returned.ship_date),
            });
        }
        Ok(out)
    }

    /// Every key of `response` must appear in `request` with an equal value.
    /// Keys only present in the request are not checked.
    pub fn response_subset_of_request(
        &self,
        request: &Map<String, Value>,
        response: &Map<String, Value>,
    ) -> Result<Vec<FieldMismatch>, FormatError> {
        let mut out = Vec::new();
        for (key, returned) in response {
            let submitted = request.get(key).cloned().unwrap_or(Value::Null);
            let matches = match (key.as_str(), &submitted, returned) {
                (SHIP_DATE, Value::String(a), Value::String(b)) => self.ship_dates_match(a, b)?,
                _ => request.contains_key(key) && submitted == *returned,
            };
            if !matches {
                out.push(FieldMismatch {
                    field: key.clone(),
                    submitted,
                    returned: returned.clone(),
                });
            }
        }
        Ok(out)
    }

    fn ship_dates_match(&self, submitted: &str, returned: &str) -> Result<bool, FormatError> {
        match self.policy {
            ShipDatePolicy::Normalize => Ok(normalize(submitted, &self.submitted_format)?
                == normalize(returned, &self.returned_format)?),
            ShipDatePolicy::SuffixTrim => Ok(suffix_trim_matches(submitted, returned)),
        }
    }
}

fn push_if_differs<T: PartialEq + Serialize>(
    out: &mut Vec<FieldMismatch>,
    field: &str,
    submitted: &Option<T>,
    returned: &Option<T>,
) {
    if submitted != returned {
        out.push(FieldMismatch {
            field: field.to_string(),
            submitted: json_of(submitted),
            returned: json_of(returned),
        });
    }
}

fn json_of<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn submitted() -> Order {
        Order {
            id: Some(4),
            pet_id: Some(1),
            quantity: Some(5),
            ship_date: Some("2024-06-12T08:22:23.354Z".into()),
            status: Some(OrderStatus::Placed),
            complete: Some(true),
        }
    }

    fn echoed() -> Order {
        Order {
            ship_date: Some("2024-06-12T08:22:23.3540+00:00".into()),
            ..submitted()
        }
    }

    #[test]
    fn echoed_order_is_equivalent_despite_ship_date_notation() {
        let eq = OrderEquivalence::default();
        assert!(eq.equals(&submitted(), &echoed()).unwrap());
        assert_ne!(submitted(), echoed());
    }

    #[test]
    fn boundary_ship_dates_stay_equivalent() {
        let eq = OrderEquivalence::default();
        let cases = [
            ("2024-06-12T00:00:00.000Z", "2024-06-12T00:00:00.0000Z"),
            ("2024-06-12T23:59:59.999Z", "2024-06-12T23:59:59.9999+00:00"),
            ("2024-12-31T23:59:59.999Z", "2024-12-31T23:59:59.9999-03:00"),
            ("2024-06-12T08:22:23.050Z", "2024-06-12T08:22:23.0500+09:30"),
        ];
        for (sent, back) in cases {
            let order = Order {
                ship_date: Some(sent.into()),
                ..submitted()
            };
            let returned = Order {
                ship_date: Some(back.into()),
                ..submitted()
            };
            assert!(eq.equals(&order, &returned).unwrap(), "{sent} vs {back}");
        }

        let next_second = Order {
            ship_date: Some("2024-06-13T00:00:00.0000+00:00".into()),
            ..submitted()
        };
        let end_of_day = Order {
            ship_date: Some("2024-06-12T23:59:59.999Z".into()),
            ..submitted()
        };
        assert!(!eq.equals(&end_of_day, &next_second).unwrap());
    }

    #[test]
    fn differing_fields_are_named() {
        let eq = OrderEquivalence::default();
        let returned = Order {
            quantity: Some(6),
            status: Some(OrderStatus::Approved),
            ..echoed()
        };
        let fields: Vec<_> = eq
            .mismatches(&submitted(), &returned)
            .unwrap()
            .into_iter()
            .map(|m| m.field)
            .collect();
        assert_eq!(fields, vec!["quantity", "status"]);
    }

    #[test]
    fn absent_field_never_equals_present_one() {
        let eq = OrderEquivalence::default();
        let returned = Order {
            complete: None,
            ..echoed()
        };
        let mismatches = eq.mismatches(&submitted(), &returned).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].submitted, json!(true));
        assert_eq!(mismatches[0].returned, Value::Null);

        let no_date = Order {
            ship_date: None,
            ..echoed()
        };
        assert!(!eq.equals(&submitted(), &no_date).unwrap());
    }

    #[test]
    fn unparsable_ship_date_is_an_error_not_a_mismatch() {
        let eq = OrderEquivalence::default();
        let returned = Order {
            ship_date: Some("yesterday".into()),
            ..echoed()
        };
        let err = eq.equals(&submitted(), &returned).unwrap_err();
        assert_eq!(err.raw, "yesterday");
    }

    #[test]
    fn suffix_trim_policy_accepts_compact_offsets() {
        let eq = OrderEquivalence::default().with_policy(ShipDatePolicy::SuffixTrim);
        let returned = Order {
            ship_date: Some("2024-06-12T08:22:23.354+0000".into()),
            ..submitted()
        };
        assert!(eq.equals(&submitted(), &returned).unwrap());
    }

    #[test]
    fn field_map_round_trips_wire_names() {
        let map = submitted().to_json_map().unwrap();
        assert_eq!(map.get("petId"), Some(&json!(1)));
        assert_eq!(map.get("status"), Some(&json!("placed")));
        let back: Order = serde_json::from_value(Value::Object(map)).unwrap();
        assert_eq!(back, submitted());
        assert!(Order::default().to_json_map().unwrap().is_empty());
    }

    #[test]
    fn subset_check_is_driven_by_response_keys() {
        let eq = OrderEquivalence::default();
        let mut request = submitted().to_json_map().unwrap();
        request.insert("note".into(), json!("request only"));
        let response = echoed().to_json_map().unwrap();
        assert!(eq.response_subset_of_request(&request, &response).unwrap().is_empty());

        let mut extra = response.clone();
        extra.insert("code".into(), json!(200));
        let mismatches = eq.response_subset_of_request(&request, &extra).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].field, "code");
        assert_eq!(mismatches[0].submitted, Value::Null);
    }

    #[test]
    fn unknown_response_fields_are_ignored_when_decoding() {
        let body = json!({
            "id": 4, "petId": 1, "quantity": 5,
            "shipDate": "2024-06-12T08:22:23.3540+00:00",
            "status": "placed", "complete": true, "extra": "ignored"
        });
        let order: Order = serde_json::from_value(body).unwrap();
        assert_eq!(order, echoed());
    }
}
