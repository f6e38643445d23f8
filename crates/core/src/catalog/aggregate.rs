//! Grouping and stock aggregation over catalog snapshots.
//!
//! The dashboard shows a stock breakdown by category, then by subcategory
//! within each category. Groups follow the order of the category and
//! subcategory lists (which are fetched sorted by creation time). Products
//! with no parent, or whose parent is not in the list, land in a trailing
//! "none" bucket.

use std::collections::HashMap;

use crate::catalog::model::{Category, Product, Subcategory};
use crate::types::{CategoryId, SubcategoryId};

/// Label of the bucket for products without a known category.
pub const NO_CATEGORY_LABEL: &str = "Sin categoría";

/// Label of the bucket for products without a known subcategory.
pub const NO_SUBCATEGORY_LABEL: &str = "Sin subcategoría";

/// Sum of `stock` over a set of products.
#[must_use]
pub fn sum_stock<'a>(products: impl IntoIterator<Item = &'a Product>) -> i64 {
    products.into_iter().map(|p| i64::from(p.stock.max(0))).sum()
}

/// Map of category id to display name.
#[must_use]
pub fn category_names(categories: &[Category]) -> HashMap<CategoryId, &str> {
    categories.iter().map(|c| (c.id, c.name.as_str())).collect()
}

/// Map of subcategory id to display name.
#[must_use]
pub fn subcategory_names(subcategories: &[Subcategory]) -> HashMap<SubcategoryId, &str> {
    subcategories.iter().map(|s| (s.id, s.name.as_str())).collect()
}

/// Products of one subcategory inside a [`CategoryGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryGroup<'a> {
    /// `None` for the "Sin subcategoría" bucket.
    pub id: Option<SubcategoryId>,
    pub name: String,
    pub products: Vec<&'a Product>,
    pub stock: i64,
}

/// Products of one category, split further by subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    /// `None` for the "Sin categoría" bucket.
    pub id: Option<CategoryId>,
    pub name: String,
    pub products: Vec<&'a Product>,
    pub stock: i64,
    pub subcategories: Vec<SubcategoryGroup<'a>>,
}

impl CategoryGroup<'_> {
    /// Whether the group should be shown split by subcategory.
    ///
    /// A category where no product has a subcategory lists its products
    /// directly instead of a lone "Sin subcategoría" row.
    #[must_use]
    pub fn has_subcategories(&self) -> bool {
        self.subcategories.iter().any(|s| s.id.is_some())
    }
}

/// Full stock breakdown shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockBreakdown<'a> {
    pub groups: Vec<CategoryGroup<'a>>,
    pub total_stock: i64,
}

impl<'a> StockBreakdown<'a> {
    /// Group `products` by category, then by subcategory.
    ///
    /// Only categories that actually have products produce a group.
    #[must_use]
    pub fn build(
        products: &'a [Product],
        categories: &[Category],
        subcategories: &[Subcategory],
    ) -> Self {
        let known_categories = category_names(categories);
        let known_subcategories = subcategory_names(subcategories);

        let mut by_category: HashMap<Option<CategoryId>, Vec<&'a Product>> = HashMap::new();
        for product in products {
            let key = product
                .category_id
                .filter(|id| known_categories.contains_key(id));
            by_category.entry(key).or_default().push(product);
        }

        let mut groups = Vec::new();
        for category in categories {
            if let Some(members) = by_category.remove(&Some(category.id)) {
                groups.push(category_group(
                    Some(category.id),
                    category.name.clone(),
                    members,
                    subcategories,
                    &known_subcategories,
                ));
            }
        }
        if let Some(members) = by_category.remove(&None) {
            groups.push(category_group(
                None,
                NO_CATEGORY_LABEL.to_owned(),
                members,
                subcategories,
                &known_subcategories,
            ));
        }

        Self {
            total_stock: sum_stock(products),
            groups,
        }
    }

    /// Stock per category name, in group order.
    #[must_use]
    pub fn stock_by_category(&self) -> Vec<(&str, i64)> {
        self.groups
            .iter()
            .map(|g| (g.name.as_str(), g.stock))
            .collect()
    }
}

fn category_group<'a>(
    id: Option<CategoryId>,
    name: String,
    products: Vec<&'a Product>,
    subcategories: &[Subcategory],
    known_subcategories: &HashMap<SubcategoryId, &str>,
) -> CategoryGroup<'a> {
    let mut by_subcategory: HashMap<Option<SubcategoryId>, Vec<&'a Product>> = HashMap::new();
    for &product in &products {
        let key = product
            .subcategory_id
            .filter(|sid| known_subcategories.contains_key(sid));
        by_subcategory.entry(key).or_default().push(product);
    }

    let mut subgroups = Vec::new();
    for subcategory in subcategories {
        if let Some(members) = by_subcategory.remove(&Some(subcategory.id)) {
            subgroups.push(SubcategoryGroup {
                id: Some(subcategory.id),
                name: subcategory.name.clone(),
                stock: sum_stock(members.iter().copied()),
                products: members,
            });
        }
    }
    if let Some(members) = by_subcategory.remove(&None) {
        subgroups.push(SubcategoryGroup {
            id: None,
            name: NO_SUBCATEGORY_LABEL.to_owned(),
            stock: sum_stock(members.iter().copied()),
            products: members,
        });
    }

    CategoryGroup {
        id,
        name,
        stock: sum_stock(products.iter().copied()),
        products,
        subcategories: subgroups,
    }
}

/// Headline numbers on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounters {
    pub total_products: usize,
    pub total_categories: usize,
    /// Products with exactly zero units ("Sin Stock").
    pub out_of_stock: usize,
}

impl DashboardCounters {
    #[must_use]
    pub fn compute(products: &[Product], categories: &[Category]) -> Self {
        Self {
            total_products: products.len(),
            total_categories: categories.len(),
            out_of_stock: products.iter().filter(|p| p.is_out_of_stock()).count(),
        }
    }
}
