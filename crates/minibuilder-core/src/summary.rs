use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::blueprint::Blueprint;

/// Deduplicated, first-seen-order projection of a blueprint's names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsSummary {
    pub app_name: String,
    pub roles: Vec<String>,
    pub entities: Vec<String>,
    pub features: Vec<String>,
}

/// Ordered set: keeps the first occurrence of each value
#[derive(Default)]
struct FirstSeen {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl FirstSeen {
    fn push(&mut self, value: &str) {
        if !self.seen.contains(value) {
            self.seen.insert(value.to_string());
            self.values.push(value.to_string());
        }
    }
}

/// Reduce a blueprint to its requirements summary.
///
/// Deduplication spans the whole blueprint: two roles repeating an entity or
/// feature name contribute it once.
pub fn summarize(blueprint: &Blueprint) -> RequirementsSummary {
    let mut roles = FirstSeen::default();
    let mut entities = FirstSeen::default();
    let mut features = FirstSeen::default();

    for role in &blueprint.roles {
        roles.push(&role.name);
        for feature in &role.features {
            entities.push(&feature.entity);
            features.push(&feature.name);
        }
    }

    RequirementsSummary {
        app_name: blueprint.app_name.clone(),
        roles: roles.values,
        entities: entities.values,
        features: features.values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Feature, Role};

    fn feature(entity: &str, name: &str) -> Feature {
        Feature {
            entity: entity.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn role(name: &str, features: Vec<Feature>) -> Role {
        Role { name: name.to_string(), features }
    }

    #[test]
    fn test_summarize_empty_blueprint() {
        let bp = Blueprint { app_name: "Nothing".to_string(), roles: vec![] };
        let summary = summarize(&bp);
        assert_eq!(summary.app_name, "Nothing");
        assert!(summary.roles.is_empty());
        assert!(summary.entities.is_empty());
        assert!(summary.features.is_empty());
    }

    #[test]
    fn test_summarize_todo_scenario() {
        let bp = Blueprint {
            app_name: "Todo".to_string(),
            roles: vec![role("User", vec![feature("Task", "Manage Tasks")])],
        };
        let summary = summarize(&bp);
        assert_eq!(
            summary,
            RequirementsSummary {
                app_name: "Todo".to_string(),
                roles: vec!["User".to_string()],
                entities: vec!["Task".to_string()],
                features: vec!["Manage Tasks".to_string()],
            }
        );
    }

    #[test]
    fn test_dedup_across_roles_keeps_first_seen_order() {
        let bp = Blueprint {
            app_name: "Shop".to_string(),
            roles: vec![
                role("Customer", vec![feature("Order", "Place Order"), feature("Cart", "Edit Cart")]),
                role("Admin", vec![feature("Product", "Manage Products"), feature("Order", "Place Order")]),
                role("Customer", vec![feature("Cart", "Checkout")]),
            ],
        };
        let summary = summarize(&bp);
        assert_eq!(summary.roles, vec!["Customer", "Admin"]);
        assert_eq!(summary.entities, vec!["Order", "Cart", "Product"]);
        assert_eq!(summary.features, vec!["Place Order", "Edit Cart", "Manage Products", "Checkout"]);
    }

    #[test]
    fn test_summarize_is_deterministic() {
        let bp = Blueprint {
            app_name: "A".to_string(),
            roles: vec![role("R", vec![feature("E1", "F1"), feature("E2", "F2"), feature("E1", "F3")])],
        };
        assert_eq!(summarize(&bp), summarize(&bp));
    }
}
