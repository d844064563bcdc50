//! Role / feature selection
//!
//! The mutators never bounds-check. Out-of-range indices are tolerated and
//! resolved by the read path, so a render that lands between a blueprint swap
//! and the next reselect shows nothing instead of failing.

use serde::{Deserialize, Serialize};

use crate::blueprint::{Blueprint, Feature, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    role_idx: usize,
    feature_idx: usize,
}

impl Selection {
    pub fn role_index(&self) -> usize {
        self.role_idx
    }

    /// Also the entity index: a role's features and entities pair 1:1
    pub fn feature_index(&self) -> usize {
        self.feature_idx
    }

    pub fn select_role(&mut self, index: usize) {
        self.role_idx = index;
        self.feature_idx = 0;
    }

    pub fn select_feature(&mut self, index: usize) {
        self.feature_idx = index;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_role<'a>(&self, blueprint: Option<&'a Blueprint>) -> Option<&'a Role> {
        blueprint.and_then(|bp| bp.roles.get(self.role_idx))
    }

    /// The active feature, or `None` when the blueprint is absent or either
    /// index falls outside it. Call on every render; never cache the result.
    pub fn current_feature<'a>(&self, blueprint: Option<&'a Blueprint>) -> Option<&'a Feature> {
        self.current_role(blueprint)
            .and_then(|role| role.features.get(self.feature_idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint_with_counts(counts: &[usize]) -> Blueprint {
        Blueprint {
            app_name: "Test".to_string(),
            roles: counts
                .iter()
                .enumerate()
                .map(|(r, &n)| Role {
                    name: format!("Role {}", r),
                    features: (0..n)
                        .map(|f| Feature {
                            entity: format!("Entity {}.{}", r, f),
                            name: format!("Feature {}.{}", r, f),
                            ..Default::default()
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_select_role_resets_feature() {
        let mut sel = Selection::default();
        sel.select_feature(7);
        sel.select_role(3);
        assert_eq!(sel.role_index(), 3);
        assert_eq!(sel.feature_index(), 0);

        // Reselecting the same role resets too
        sel.select_feature(2);
        sel.select_role(3);
        assert_eq!(sel.feature_index(), 0);
    }

    #[test]
    fn test_current_feature_absent_blueprint() {
        let sel = Selection::default();
        assert!(sel.current_feature(None).is_none());
        assert!(sel.current_role(None).is_none());
    }

    #[test]
    fn test_current_feature_out_of_range() {
        let bp = blueprint_with_counts(&[2]);
        let mut sel = Selection::default();

        sel.select_role(1);
        assert!(sel.current_feature(Some(&bp)).is_none());

        sel.select_role(0);
        sel.select_feature(2);
        assert!(sel.current_feature(Some(&bp)).is_none());

        sel.select_feature(1);
        assert_eq!(sel.current_feature(Some(&bp)).unwrap().name, "Feature 0.1");
    }

    #[test]
    fn test_uneven_roles_stale_feature_index() {
        let bp = blueprint_with_counts(&[3, 1]);
        let mut sel = Selection::default();

        sel.select_feature(2);
        assert_eq!(sel.current_feature(Some(&bp)).unwrap().name, "Feature 0.2");

        // Selecting a role goes through the reset rule
        sel.select_role(1);
        assert_eq!(sel.current_feature(Some(&bp)).unwrap().name, "Feature 1.0");

        // A stale index that bypassed the reset resolves to nothing
        sel.select_feature(2);
        assert!(sel.current_feature(Some(&bp)).is_none());
        sel.select_feature(0);
        assert_eq!(sel.current_feature(Some(&bp)).unwrap().name, "Feature 1.0");
    }

    #[test]
    fn test_read_path_tracks_blueprint_changes() {
        let mut sel = Selection::default();
        sel.select_role(1);
        sel.select_feature(1);

        let big = blueprint_with_counts(&[2, 2]);
        let small = blueprint_with_counts(&[2]);
        assert!(sel.current_feature(Some(&big)).is_some());
        assert!(sel.current_feature(Some(&small)).is_none());
    }
}
