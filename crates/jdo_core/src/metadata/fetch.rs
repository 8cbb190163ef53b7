//! Fetch plans.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Named set of fetch groups selecting which fields are loaded together.
///
/// Two group names are built in: [`FetchPlan::DEFAULT`] selects the
/// default-fetch-group fields of a class and [`FetchPlan::ALL`] selects
/// every field. Primary key fields are always part of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPlan {
    groups: BTreeSet<String>,
}

impl FetchPlan {
    /// Name of the default fetch group.
    pub const DEFAULT: &'static str = "default";

    /// Name of the group containing every field.
    pub const ALL: &'static str = "all";

    /// Creates a plan with no groups (primary key fields only).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            groups: BTreeSet::new(),
        }
    }

    /// Creates a plan that fetches every field.
    #[must_use]
    pub fn all() -> Self {
        Self::empty().with_group(Self::ALL)
    }

    /// Adds a group to the plan.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    /// Removes a group from the plan.
    #[must_use]
    pub fn without_group(mut self, group: &str) -> Self {
        self.groups.remove(group);
        self
    }

    /// Whether the plan contains `group`.
    #[must_use]
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Iterates over group names in sorted order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self::empty().with_group(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_has_default_group() {
        let plan = FetchPlan::default();
        assert!(plan.contains(FetchPlan::DEFAULT));
        assert!(!plan.contains(FetchPlan::ALL));
    }

    #[test]
    fn groups_are_sorted_and_unique() {
        let plan = FetchPlan::empty()
            .with_group("zeta")
            .with_group("alpha")
            .with_group("zeta");
        let groups: Vec<_> = plan.groups().collect();
        assert_eq!(groups, vec!["alpha", "zeta"]);
    }

    #[test]
    fn without_group_removes() {
        let plan = FetchPlan::default().without_group(FetchPlan::DEFAULT);
        assert_eq!(plan, FetchPlan::empty());
    }
}
