//! Attribute schemas of the provider, its resources and data sources

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Bool,
    /// Map of string to string
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub description: &'static str,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub computed: bool,
    /// A change forces replacement instead of an in-place update
    #[serde(skip_serializing_if = "is_false")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Attribute {
    fn new(ty: AttributeType, description: &'static str) -> Self {
        Self {
            ty,
            description,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
        }
    }

    pub fn required(ty: AttributeType, description: &'static str) -> Self {
        Self {
            required: true,
            ..Self::new(ty, description)
        }
    }

    pub fn optional(ty: AttributeType, description: &'static str) -> Self {
        Self {
            optional: true,
            ..Self::new(ty, description)
        }
    }

    pub fn computed(ty: AttributeType, description: &'static str) -> Self {
        Self {
            computed: true,
            ..Self::new(ty, description)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// Schema of one resource, data source, or the provider block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub attributes: BTreeMap<&'static str, Attribute>,
    /// Default create timeout, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_timeout_secs: Option<u64>,
}

impl Schema {
    pub fn new(description: Option<&'static str>) -> Self {
        Self {
            description,
            attributes: BTreeMap::new(),
            create_timeout_secs: None,
        }
    }

    pub fn attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Names of attributes whose change forces replacement
    pub fn force_new_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| *name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<&'static str, Schema>,
    pub data_sources: BTreeMap<&'static str, Schema>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_flags_are_sparse() {
        let schema = Schema::new(Some("test")).attribute(
            "entity",
            Attribute::required(AttributeType::String, "The entity").force_new(),
        );
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "description": "test",
                "attributes": {
                    "entity": {
                        "type": "string",
                        "description": "The entity",
                        "required": true,
                        "force_new": true,
                    }
                }
            })
        );
        assert_eq!(schema.force_new_attributes().collect::<Vec<_>>(), ["entity"]);
    }
}
