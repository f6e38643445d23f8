//! Soft-delete and rename cascades as plain state transitions.
//!
//! Each function inspects the current snapshots and returns the complete set
//! of records a change touches. The data layer applies a plan in a single
//! transaction, so a plan is all-or-nothing.
//!
//! Rules:
//! - Deactivating a category deactivates every active subcategory in it.
//!   Products are left alone; they simply stop showing up as orphans.
//! - Activating a category touches only the category.
//! - Toggling a subcategory never cascades.
//! - Deleting is a soft deactivation that is refused while active dependents
//!   exist.

use std::fmt;

use crate::catalog::model::{Category, Product, Subcategory};
use crate::types::{CategoryId, ProductId, SubcategoryId};

/// Records whose `active` flag changes together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadePlan {
    /// New value of the `active` flag for every listed record.
    pub active: bool,
    pub categories: Vec<CategoryId>,
    pub subcategories: Vec<SubcategoryId>,
    pub products: Vec<ProductId>,
}

impl CascadePlan {
    /// Number of records the plan changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len() + self.subcategories.len() + self.products.len()
    }

    /// Whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deactivate `category` and every subcategory of it that is still active.
#[must_use]
pub fn deactivate_category_plan(category: CategoryId, subcategories: &[Subcategory]) -> CascadePlan {
    CascadePlan {
        active: false,
        categories: vec![category],
        subcategories: subcategories
            .iter()
            .filter(|s| s.category_id == category && s.active)
            .map(|s| s.id)
            .collect(),
        products: Vec::new(),
    }
}

/// Reactivate `category` only. Its subcategories keep their current state.
#[must_use]
pub fn activate_category_plan(category: CategoryId) -> CascadePlan {
    CascadePlan {
        active: true,
        categories: vec![category],
        ..CascadePlan::default()
    }
}

/// Flip a category's flag, cascading on the way down.
#[must_use]
pub fn toggle_category_plan(category: &Category, subcategories: &[Subcategory]) -> CascadePlan {
    if category.active {
        deactivate_category_plan(category.id, subcategories)
    } else {
        activate_category_plan(category.id)
    }
}

/// Flip a subcategory's flag. Products are never touched.
#[must_use]
pub fn toggle_subcategory_plan(subcategory: &Subcategory) -> CascadePlan {
    CascadePlan {
        active: !subcategory.active,
        subcategories: vec![subcategory.id],
        ..CascadePlan::default()
    }
}

/// Denormalized name updates caused by renaming a category or subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub new_name: String,
    /// Subcategories whose `category_name` changes.
    pub subcategories: Vec<SubcategoryId>,
    /// Products whose `category_name` (or `subcategory_name`) changes.
    pub products: Vec<ProductId>,
}

/// Plan the rewrite of `category_name` after renaming `category`.
///
/// Returns `None` when the name is unchanged, in which case only the
/// category's own fields need saving.
#[must_use]
pub fn rename_category_plan(
    category: &Category,
    new_name: &str,
    subcategories: &[Subcategory],
    products: &[Product],
) -> Option<RenamePlan> {
    if category.name == new_name {
        return None;
    }
    Some(RenamePlan {
        new_name: new_name.to_owned(),
        subcategories: subcategories
            .iter()
            .filter(|s| s.category_id == category.id)
            .map(|s| s.id)
            .collect(),
        products: products
            .iter()
            .filter(|p| p.category_id == Some(category.id))
            .map(|p| p.id)
            .collect(),
    })
}

/// Plan the rewrite of `subcategory_name` after renaming `subcategory`.
#[must_use]
pub fn rename_subcategory_plan(
    subcategory: &Subcategory,
    new_name: &str,
    products: &[Product],
) -> Option<RenamePlan> {
    if subcategory.name == new_name {
        return None;
    }
    Some(RenamePlan {
        new_name: new_name.to_owned(),
        subcategories: Vec::new(),
        products: products
            .iter()
            .filter(|p| p.subcategory_id == Some(subcategory.id))
            .map(|p| p.id)
            .collect(),
    })
}

/// Active records that still depend on a category or subcategory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub active_products: usize,
    pub active_subcategories: usize,
}

impl DependencyReport {
    /// Deleting is refused while anything active still points at the record.
    #[must_use]
    pub const fn blocks_delete(&self) -> bool {
        self.active_products > 0 || self.active_subcategories > 0
    }

    /// Lines for the dependency list, e.g. `["1 subcategoría activa", "2 productos activos"]`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.active_subcategories > 0 {
            lines.push(pluralize(self.active_subcategories, "subcategoría activa", "subcategorías activas"));
        }
        if self.active_products > 0 {
            lines.push(pluralize(self.active_products, "producto activo", "productos activos"));
        }
        lines
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join(" y "))
    }
}

fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Count active products and subcategories under `category`.
#[must_use]
pub fn check_category_dependencies(
    category: CategoryId,
    products: &[Product],
    subcategories: &[Subcategory],
) -> DependencyReport {
    DependencyReport {
        active_products: products
            .iter()
            .filter(|p| p.active && p.category_id == Some(category))
            .count(),
        active_subcategories: subcategories
            .iter()
            .filter(|s| s.active && s.category_id == category)
            .count(),
    }
}

/// Count active products under `subcategory`.
#[must_use]
pub fn check_subcategory_dependencies(subcategory: SubcategoryId, products: &[Product]) -> DependencyReport {
    DependencyReport {
        active_products: products
            .iter()
            .filter(|p| p.active && p.subcategory_id == Some(subcategory))
            .count(),
        active_subcategories: 0,
    }
}

/// Soft-delete a category, or report what blocks it.
///
/// # Errors
///
/// Returns the [`DependencyReport`] when active dependents exist.
pub fn delete_category_plan(
    category: CategoryId,
    products: &[Product],
    subcategories: &[Subcategory],
) -> Result<CascadePlan, DependencyReport> {
    let report = check_category_dependencies(category, products, subcategories);
    if report.blocks_delete() {
        return Err(report);
    }
    Ok(deactivate_category_plan(category, subcategories))
}

/// Soft-delete a subcategory, or report what blocks it.
///
/// # Errors
///
/// Returns the [`DependencyReport`] when active products exist.
pub fn delete_subcategory_plan(
    subcategory: SubcategoryId,
    products: &[Product],
) -> Result<CascadePlan, DependencyReport> {
    let report = check_subcategory_dependencies(subcategory, products);
    if report.blocks_delete() {
        return Err(report);
    }
    Ok(CascadePlan {
        active: false,
        subcategories: vec![subcategory],
        ..CascadePlan::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::model::fixtures::{category, product, subcategory};

    #[test]
    fn test_deactivate_category_cascades_to_active_subcategories_only() {
        let mut already_off = subcategory(12, 1, "Apagada");
        already_off.active = false;
        let subcategories = vec![
            subcategory(10, 1, "S"),
            subcategory(11, 1, "T"),
            already_off,
            subcategory(20, 2, "Otra"),
        ];

        let plan = deactivate_category_plan(CategoryId::new(1), &subcategories);

        assert!(!plan.active);
        assert_eq!(plan.categories, vec![CategoryId::new(1)]);
        assert_eq!(
            plan.subcategories,
            vec![SubcategoryId::new(10), SubcategoryId::new(11)]
        );
        assert!(plan.products.is_empty());
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_activate_category_does_not_touch_subcategories() {
        let mut off = category(1, "A");
        off.active = false;
        let mut sub = subcategory(10, 1, "S");
        sub.active = false;

        let plan = toggle_category_plan(&off, &[sub]);

        assert!(plan.active);
        assert_eq!(plan.categories, vec![CategoryId::new(1)]);
        assert!(plan.subcategories.is_empty());
    }

    #[test]
    fn test_toggle_subcategory_never_cascades() {
        let sub = subcategory(10, 1, "S");
        let plan = toggle_subcategory_plan(&sub);

        assert!(!plan.active);
        assert_eq!(plan.subcategories, vec![SubcategoryId::new(10)]);
        assert!(plan.products.is_empty());
        assert!(plan.categories.is_empty());
    }

    #[test]
    fn test_rename_category_collects_dependents() {
        let cat = category(1, "Aromáticas");
        let subcategories = vec![subcategory(10, 1, "S"), subcategory(20, 2, "T")];
        let products = vec![
            product(1, 1, Some(1), None),
            product(2, 1, Some(2), None),
            product(3, 1, Some(1), Some(10)),
        ];

        let plan = rename_category_plan(&cat, "Perfumadas", &subcategories, &products).unwrap();

        assert_eq!(plan.new_name, "Perfumadas");
        assert_eq!(plan.subcategories, vec![SubcategoryId::new(10)]);
        assert_eq!(plan.products, vec![ProductId::new(1), ProductId::new(3)]);
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let cat = category(1, "A");
        assert!(rename_category_plan(&cat, "A", &[], &[]).is_none());
        let sub = subcategory(10, 1, "S");
        assert!(rename_subcategory_plan(&sub, "S", &[]).is_none());
    }

    #[test]
    fn test_rename_subcategory_collects_products() {
        let sub = subcategory(10, 1, "S");
        let products = vec![product(1, 1, Some(1), Some(10)), product(2, 1, Some(1), None)];

        let plan = rename_subcategory_plan(&sub, "Nueva", &products).unwrap();

        assert_eq!(plan.products, vec![ProductId::new(1)]);
        assert!(plan.subcategories.is_empty());
    }

    #[test]
    fn test_category_delete_blocked_with_counts() {
        let mut inactive = product(3, 1, Some(1), None);
        inactive.active = false;
        let products = vec![product(1, 1, Some(1), None), product(2, 1, Some(1), None), inactive];
        let subcategories = vec![subcategory(10, 1, "S")];

        let report = delete_category_plan(CategoryId::new(1), &products, &subcategories).unwrap_err();

        assert_eq!(report.active_products, 2);
        assert_eq!(report.active_subcategories, 1);
        assert_eq!(
            report.lines(),
            vec!["1 subcategoría activa".to_owned(), "2 productos activos".to_owned()]
        );
        assert_eq!(report.to_string(), "1 subcategoría activa y 2 productos activos");
    }

    #[test]
    fn test_category_delete_allowed_without_active_dependents() {
        let mut inactive = product(1, 1, Some(1), None);
        inactive.active = false;

        let plan = delete_category_plan(CategoryId::new(1), &[inactive], &[]).unwrap();

        assert!(!plan.active);
        assert_eq!(plan.categories, vec![CategoryId::new(1)]);
    }

    #[test]
    fn test_subcategory_delete_blocked() {
        let products = vec![product(1, 1, Some(1), Some(10))];

        let report = delete_subcategory_plan(SubcategoryId::new(10), &products).unwrap_err();

        assert_eq!(report.lines(), vec!["1 producto activo".to_owned()]);
        assert!(delete_subcategory_plan(SubcategoryId::new(11), &products).is_ok());
    }

    #[test]
    fn test_plural_forms() {
        let report = DependencyReport {
            active_products: 1,
            active_subcategories: 3,
        };
        assert_eq!(report.to_string(), "3 subcategorías activas y 1 producto activo");
        assert!(!DependencyReport::default().blocks_delete());
    }
}
