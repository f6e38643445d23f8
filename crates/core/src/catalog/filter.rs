//! Catalog page filter state.
//!
//! The public catalog filters by at most one category and, within it, at most
//! one subcategory. Choosing a category (including "all") always clears the
//! subcategory; choosing a subcategory leaves the category alone.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::model::{Category, Product, Subcategory};
use crate::types::{CategoryId, SubcategoryId};

/// Current selection on the catalog page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub selected_category: Option<CategoryId>,
    pub selected_subcategory: Option<SubcategoryId>,
}

impl CatalogFilter {
    /// Select a category, or all categories with `None`. Resets the subcategory.
    pub const fn select_category(&mut self, category: Option<CategoryId>) {
        self.selected_category = category;
        self.selected_subcategory = None;
    }

    /// Select a subcategory, or none. The category is unchanged.
    pub const fn select_subcategory(&mut self, subcategory: Option<SubcategoryId>) {
        self.selected_subcategory = subcategory;
    }

    /// Rebuild a selection from query parameters.
    ///
    /// Runs the same transitions a visitor would (category first, then
    /// subcategory) and drops a subcategory that does not belong to the
    /// selected category, so a hand-edited URL cannot show an impossible
    /// combination.
    #[must_use]
    pub fn restore(
        category: Option<CategoryId>,
        subcategory: Option<SubcategoryId>,
        subcategories: &[Subcategory],
    ) -> Self {
        let mut filter = Self::default();
        filter.select_category(category);

        let belongs = subcategory.and_then(|sid| {
            subcategories
                .iter()
                .find(|s| s.id == sid)
                .filter(|s| category.is_none_or(|cid| s.category_id == cid))
        });
        if let Some(sub) = belongs {
            if filter.selected_category.is_none() {
                filter.select_category(Some(sub.category_id));
            }
            filter.select_subcategory(Some(sub.id));
        }
        filter
    }

    /// Products to show, in input order.
    ///
    /// First drops everything that must never be public: inactive products
    /// and orphans whose category or subcategory is set but not among the
    /// active ones. Then applies the selection, subcategory taking precedence
    /// over category.
    #[must_use]
    pub fn visible_products<'a>(
        &self,
        products: &'a [Product],
        active_categories: &[Category],
        active_subcategories: &[Subcategory],
    ) -> Vec<&'a Product> {
        let category_ids: HashSet<CategoryId> = active_categories
            .iter()
            .filter(|c| c.active)
            .map(|c| c.id)
            .collect();
        let subcategory_ids: HashSet<SubcategoryId> = active_subcategories
            .iter()
            .filter(|s| s.active)
            .map(|s| s.id)
            .collect();

        products
            .iter()
            .filter(|p| p.is_visible())
            .filter(|p| p.category_id.is_none_or(|id| category_ids.contains(&id)))
            .filter(|p| {
                p.subcategory_id
                    .is_none_or(|id| subcategory_ids.contains(&id))
            })
            .filter(|p| match (self.selected_subcategory, self.selected_category) {
                (Some(sid), _) => p.subcategory_id == Some(sid),
                (None, Some(cid)) => p.category_id == Some(cid),
                (None, None) => true,
            })
            .collect()
    }

    /// Subcategory chips offered for the selected category.
    ///
    /// Empty when no category is selected.
    #[must_use]
    pub fn subcategory_chips<'a>(&self, active_subcategories: &'a [Subcategory]) -> Vec<&'a Subcategory> {
        let Some(category) = self.selected_category else {
            return Vec::new();
        };
        active_subcategories
            .iter()
            .filter(|s| s.active && s.category_id == category)
            .collect()
    }

    /// Whether any filter is applied.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.selected_category.is_some() || self.selected_subcategory.is_some()
    }
}
