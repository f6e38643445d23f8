//! Seed the database with a demo catalog.
//!
//! Creates a few categories, subcategories and products plus the store
//! settings, going through the same validation and repositories as the admin
//! panel. Refuses to run when categories already exist.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;

use candela_core::catalog::{
    Category, CategoryInput, CurrentParents, ProductInput, SettingsInput, SocialLinks,
    StoreSettings, Subcategory, SubcategoryInput, ValidationError,
};
use candela_data::RepositoryError;
use candela_data::db::{
    CategoryRepository, ProductRepository, SettingsRepository, SubcategoryRepository,
};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid demo data: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Demo product {product} names unknown category {category}")]
    UnknownParent {
        product: &'static str,
        category: &'static str,
    },
}

/// A demo category and the subcategories under it.
pub struct DemoCategory {
    pub name: &'static str,
    pub description: &'static str,
    pub subcategories: &'static [&'static str],
}

/// A demo product, placed by category and subcategory name.
pub struct DemoProduct {
    pub name: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    pub stock: &'static str,
    pub category: &'static str,
    pub subcategory: Option<&'static str>,
    pub aroma: &'static str,
}

pub const DEMO_CATEGORIES: &[DemoCategory] = &[
    DemoCategory {
        name: "Aromáticas",
        description: "Velas perfumadas con aceites esenciales.",
        subcategories: &["Soya", "Cera de Abeja"],
    },
    DemoCategory {
        name: "Decorativas",
        description: "Piezas para ambientar cualquier espacio.",
        subcategories: &[],
    },
    DemoCategory {
        name: "Regalos",
        description: "Sets listos para regalar.",
        subcategories: &["Packs"],
    },
];

pub const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        name: "Vela de Coco",
        description: "Cera de soya con aroma a coco tostado.",
        price: "35000",
        stock: "12",
        category: "Aromáticas",
        subcategory: Some("Soya"),
        aroma: "Coco",
    },
    DemoProduct {
        name: "Vela de Lavanda",
        description: "Relajante, ideal para la noche.",
        price: "32000",
        stock: "8",
        category: "Aromáticas",
        subcategory: Some("Soya"),
        aroma: "Lavanda",
    },
    DemoProduct {
        name: "Vela de Miel",
        description: "Cera de abeja pura con mecha de algodón.",
        price: "42000",
        stock: "0",
        category: "Aromáticas",
        subcategory: Some("Cera de Abeja"),
        aroma: "Miel",
    },
    DemoProduct {
        name: "Vela Pilar Floral",
        description: "Pilar con flores secas incrustadas.",
        price: "48000",
        stock: "5",
        category: "Decorativas",
        subcategory: None,
        aroma: "",
    },
    DemoProduct {
        name: "Pack Lavanda y Sándalo",
        description: "Dos velas medianas en caja de regalo.",
        price: "65000",
        stock: "4",
        category: "Regalos",
        subcategory: Some("Packs"),
        aroma: "Lavanda y sándalo",
    },
];

/// Insert the demo catalog and settings.
///
/// # Errors
///
/// Returns `SeedError` if a write fails or the demo data does not validate.
pub async fn run(pool: &PgPool) -> Result<(), SeedError> {
    let categories_repo = CategoryRepository::new(pool);
    if !categories_repo.list().await?.is_empty() {
        tracing::warn!("Categories already exist, skipping seed");
        return Ok(());
    }

    let subcategories_repo = SubcategoryRepository::new(pool);
    for demo in DEMO_CATEGORIES {
        let input = CategoryInput {
            name: demo.name.to_owned(),
            description: demo.description.to_owned(),
        };
        let id = categories_repo.create(&input.validate(&[], None)?).await?;
        for name in demo.subcategories {
            let input = SubcategoryInput {
                name: (*name).to_owned(),
                description: String::new(),
            };
            let existing = subcategories_repo.list().await?;
            subcategories_repo
                .create(id, demo.name, &input.validate(id, &existing, None)?)
                .await?;
        }
    }

    let categories = categories_repo.list().await?;
    let subcategories = subcategories_repo.list().await?;
    let products_repo = ProductRepository::new(pool);
    for demo in DEMO_PRODUCTS {
        let input = product_input(demo, &categories, &subcategories)?;
        let draft = input.validate(&categories, &subcategories, CurrentParents::default())?;
        products_repo.create(&draft).await?;
    }

    let settings = SettingsInput {
        store_name: "Candela".to_owned(),
        description: "Velas artesanales hechas a mano en Colombia.".to_owned(),
        contact_email: "hola@candela.co".to_owned(),
        phone: "+57 300 000 0000".to_owned(),
        social: SocialLinks {
            instagram: "https://instagram.com/candela".to_owned(),
            ..SocialLinks::default()
        },
    }
    .validate()?;
    SettingsRepository::new(pool)
        .save(&StoreSettings {
            store_name: settings.store_name,
            description: settings.description,
            contact_email: settings.contact_email,
            phone: settings.phone,
            social: settings.social,
            ..StoreSettings::default()
        })
        .await?;

    tracing::info!(
        categories = categories.len(),
        subcategories = subcategories.len(),
        products = DEMO_PRODUCTS.len(),
        "Seed complete!"
    );
    Ok(())
}

/// Resolve a demo product's parents by name.
fn product_input(
    demo: &DemoProduct,
    categories: &[Category],
    subcategories: &[Subcategory],
) -> Result<ProductInput, SeedError> {
    let by_name: HashMap<&str, &Category> =
        categories.iter().map(|c| (c.name.as_str(), c)).collect();
    let category = by_name.get(demo.category).ok_or(SeedError::UnknownParent {
        product: demo.name,
        category: demo.category,
    })?;
    let subcategory = demo.subcategory.and_then(|name| {
        subcategories
            .iter()
            .find(|s| s.category_id == category.id && s.name == name)
    });

    Ok(ProductInput {
        name: demo.name.to_owned(),
        description: demo.description.to_owned(),
        price: demo.price.to_owned(),
        stock: demo.stock.to_owned(),
        category_id: Some(category.id),
        subcategory_id: subcategory.map(|s| s.id),
        aroma: demo.aroma.to_owned(),
        image_count: 0,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use candela_core::{CategoryId, SubcategoryId};
    use chrono::Utc;

    use super::*;

    fn fixtures() -> (Vec<Category>, Vec<Subcategory>) {
        let mut categories = Vec::new();
        let mut subcategories = Vec::new();
        let mut next_sub = 100;
        for (i, demo) in (1..).zip(DEMO_CATEGORIES) {
            categories.push(Category {
                id: CategoryId::new(i),
                name: demo.name.to_string(),
                description: demo.description.to_string(),
                active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
            for name in demo.subcategories {
                subcategories.push(Subcategory {
                    id: SubcategoryId::new(next_sub),
                    name: (*name).to_string(),
                    description: String::new(),
                    category_id: CategoryId::new(i),
                    category_name: demo.name.to_string(),
                    active: true,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                });
                next_sub += 1;
            }
        }
        (categories, subcategories)
    }

    #[test]
    fn test_demo_products_validate() {
        let (categories, subcategories) = fixtures();
        for demo in DEMO_PRODUCTS {
            let draft = product_input(demo, &categories, &subcategories)
                .unwrap()
                .validate(&categories, &subcategories, CurrentParents::default())
                .unwrap();
            assert_eq!(draft.category_name, demo.category);
            assert_eq!(draft.subcategory_name, demo.subcategory.unwrap_or_default());
        }
    }

    #[test]
    fn test_demo_category_names_are_unique() {
        let (categories, _) = fixtures();
        for demo in DEMO_CATEGORIES {
            let input = CategoryInput {
                name: demo.name.to_string(),
                description: String::new(),
            };
            let others: Vec<Category> = categories
                .iter()
                .filter(|c| c.name != demo.name)
                .cloned()
                .collect();
            assert!(input.validate(&others, None).is_ok());
        }
    }
}
