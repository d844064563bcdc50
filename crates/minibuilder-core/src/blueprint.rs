//! Application blueprint returned by the extraction service
//!
//! A blueprint is read-only once received. The next successful response
//! replaces it wholesale; nothing in the crate mutates one in place.

use serde::{Deserialize, Serialize};

/// The structured description of a mock application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(rename = "App Name", default)]
    pub app_name: String,
    #[serde(rename = "Roles", default)]
    pub roles: Vec<Role>,
}

/// A named actor grouping an ordered list of features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "Role", default)]
    pub name: String,
    #[serde(rename = "Features", default)]
    pub features: Vec<Feature>,
}

/// One unit of mock functionality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "Entity", default)]
    pub entity: String,
    #[serde(rename = "Feature", default)]
    pub name: String,
    /// Field labels. Not guaranteed unique within a feature.
    #[serde(rename = "Input Fields", default)]
    pub input_fields: Vec<String>,
    #[serde(rename = "Buttons", default)]
    pub buttons: Vec<String>,
}

impl Blueprint {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Pretty-printed JSON using the service's own key names
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn role(&self, index: usize) -> Option<&Role> {
        self.roles.get(index)
    }

    pub fn feature_count(&self) -> usize {
        self.roles.iter().map(|r| r.features.len()).sum()
    }
}

impl Role {
    /// Entity labels in feature order; index i pairs with `features[i]`
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.entity.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODO_JSON: &str = r#"{
        "App Name": "Todo",
        "Roles": [{
            "Role": "User",
            "Features": [{
                "Entity": "Task",
                "Feature": "Manage Tasks",
                "Input Fields": ["Title", "Due Date"],
                "Buttons": ["Add", "Delete"]
            }]
        }]
    }"#;

    #[test]
    fn test_parse_service_keys() {
        let bp = Blueprint::from_json(TODO_JSON).unwrap();
        assert_eq!(bp.app_name, "Todo");
        assert_eq!(bp.roles.len(), 1);
        let role = &bp.roles[0];
        assert_eq!(role.name, "User");
        let feature = &role.features[0];
        assert_eq!(feature.entity, "Task");
        assert_eq!(feature.name, "Manage Tasks");
        assert_eq!(feature.input_fields, vec!["Title", "Due Date"]);
        assert_eq!(feature.buttons, vec!["Add", "Delete"]);
    }

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let bp = Blueprint::from_json(r#"{"App Name": "Bare", "Roles": [{"Role": "Admin"}]}"#).unwrap();
        assert_eq!(bp.roles[0].features.len(), 0);
        assert_eq!(bp.feature_count(), 0);

        let empty = Blueprint::from_json("{}").unwrap();
        assert_eq!(empty, Blueprint::default());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(Blueprint::from_json(r#"["not", "an", "object"]"#).is_err());
        assert!(Blueprint::from_json(r#"{"Roles": "nope"}"#).is_err());
        assert!(Blueprint::from_json("<html>502</html>").is_err());
    }

    #[test]
    fn test_pretty_json_keeps_service_keys() {
        let bp = Blueprint::from_json(TODO_JSON).unwrap();
        let pretty = bp.to_pretty_json().unwrap();
        assert!(pretty.contains("\"App Name\": \"Todo\""));
        assert!(pretty.contains("\"Input Fields\""));
        assert_eq!(Blueprint::from_json(&pretty).unwrap(), bp);
    }

    #[test]
    fn test_entities_follow_feature_order() {
        let role = Role {
            name: "Staff".to_string(),
            features: vec![
                Feature { entity: "Order".to_string(), ..Default::default() },
                Feature { entity: "Invoice".to_string(), ..Default::default() },
            ],
        };
        assert_eq!(role.entities().collect::<Vec<_>>(), vec!["Order", "Invoice"]);
    }
}
