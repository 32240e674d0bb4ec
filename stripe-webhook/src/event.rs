//! Event notification types delivered by the payment processor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WebhookError;

/// An authenticated (or explicitly trusted) event notification.
///
/// Only the `type` field is interpreted by the router; everything else,
/// including `id`, is kept as an opaque JSON object for the handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Event {
    /// Dot-delimited event type, e.g. `customer.source.created`
    pub event_type: String,

    /// Remaining event fields (`id`, `data`, `created`, `livemode`, ...)
    pub payload: Map<String, Value>,
}

impl From<Map<String, Value>> for Event {
    /// A missing or non-string `type` yields an empty event type, which no
    /// handler can be registered for.
    fn from(mut fields: Map<String, Value>) -> Self {
        let event_type = match fields.remove("type") {
            Some(Value::String(t)) => t,
            _ => String::new(),
        };

        Self {
            event_type,
            payload: fields,
        }
    }
}

impl From<Event> for Map<String, Value> {
    fn from(event: Event) -> Self {
        let mut fields = event.payload;
        fields.insert("type".to_string(), Value::String(event.event_type));
        fields
    }
}

impl Event {
    /// Create an event with an empty payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: Map::new(),
        }
    }

    /// Set the provider-assigned identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.payload.insert("id".to_string(), Value::String(id.into()));
        self
    }

    /// Parse an event from the raw request body.
    ///
    /// Any JSON object is accepted; only non-object bodies are malformed.
    pub fn from_slice(raw: &[u8]) -> Result<Self, WebhookError> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Provider-assigned identifier (`evt_...`) when it is a string.
    pub fn id(&self) -> Option<&str> {
        self.payload.get("id").and_then(Value::as_str)
    }

    /// The `data.object` resource the event describes, if present.
    pub fn data_object(&self) -> Option<&Value> {
        self.payload.get("data").and_then(|data| data.get("object"))
    }

    /// Whether the event originated in live mode.
    pub fn livemode(&self) -> bool {
        self.payload
            .get("livemode")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stripe_event() {
        let raw = br#"{
            "id": "evt_123",
            "object": "event",
            "type": "customer.source.created",
            "livemode": true,
            "data": {"object": {"id": "card_1", "object": "card"}}
        }"#;

        let event = Event::from_slice(raw).unwrap();

        assert_eq!(event.id(), Some("evt_123"));
        assert_eq!(event.event_type, "customer.source.created");
        assert!(event.livemode());
        assert_eq!(
            event.data_object().and_then(|o| o.get("id")),
            Some(&Value::String("card_1".to_string()))
        );
        assert!(!event.payload.contains_key("type"));
    }

    #[test]
    fn test_parse_event_with_numeric_id() {
        let event = Event::from_slice(br#"{"type":"invoice.paid","id":42}"#).unwrap();

        assert_eq!(event.event_type, "invoice.paid");
        assert_eq!(event.id(), None);
        assert_eq!(event.payload.get("id"), Some(&Value::from(42)));
    }

    #[test]
    fn test_parse_event_without_type() {
        let event = Event::from_slice(br#"{"object": "event"}"#).unwrap();
        assert_eq!(event.event_type, "");
        assert!(event.id().is_none());
        assert!(!event.livemode());
    }

    #[test]
    fn test_parse_event_with_non_string_type() {
        let event = Event::from_slice(br#"{"type": null}"#).unwrap();
        assert_eq!(event.event_type, "");

        let event = Event::from_slice(br#"{"type": 7}"#).unwrap();
        assert_eq!(event.event_type, "");
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Event::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_non_object() {
        let err = Event::from_slice(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[test]
    fn test_serialize_keeps_type_field() {
        let event = Event::new("invoice.paid").with_id("evt_1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"type": "invoice.paid", "id": "evt_1"}));
    }
}
