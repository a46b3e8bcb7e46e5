use serde::{Deserialize, Serialize};

/// A single enumerated resource, ready to be handed to a [`Sink`](crate::sink::Sink).
///
/// `properties` is deliberately an opaque JSON string rather than a parsed value: Cloud Control
/// returns an arbitrary per-type JSON document and re-parsing it into a typed shape is a
/// downstream concern this crate does not own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedResource {
    pub identifier: String,
    pub type_name: String,
    /// Empty for global services.
    pub region: String,
    pub account_id: String,
    pub properties: String,
}

impl EnrichedResource {
    pub fn new(
        identifier: impl Into<String>,
        type_name: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        properties: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            type_name: type_name.into(),
            region: region.into(),
            account_id: account_id.into(),
            properties: properties.into(),
        }
    }
}
