//! Admin form validation.
//!
//! Every form is validated here before anything is written. Messages are the
//! Spanish strings shown inline on the admin pages.

use crate::catalog::model::{Category, MAX_PRODUCT_IMAGES, Product, SocialLinks, Subcategory};
use crate::types::{CategoryId, Email, Price, SubcategoryId};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A form value that cannot be saved.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El nombre no puede estar vacío.")]
    EmptyName,
    #[error("Ya existe una categoría con ese nombre.")]
    DuplicateCategory,
    #[error("Ya existe una subcategoría con ese nombre.")]
    DuplicateSubcategory,
    #[error("El nombre es obligatorio.")]
    ProductNameRequired,
    #[error("El precio debe ser un número entero mayor o igual a cero.")]
    InvalidPrice,
    #[error("El stock debe ser un número entero mayor o igual a cero.")]
    InvalidStock,
    #[error("La categoría seleccionada no existe.")]
    UnknownCategory,
    #[error("La subcategoría seleccionada no pertenece a la categoría.")]
    SubcategoryMismatch,
    #[error("La categoría seleccionada está inactiva.")]
    InactiveCategory,
    #[error("La subcategoría seleccionada está inactiva.")]
    InactiveSubcategory,
    #[error("Puedes subir máximo 5 imágenes.")]
    TooManyImages,
    #[error("El correo de contacto no es válido.")]
    InvalidContactEmail,
    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    PasswordTooShort,
}

/// Raw category form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
}

impl CategoryInput {
    /// Trim fields and check the name against every existing category.
    ///
    /// `editing` excludes the record being edited so saving without a rename
    /// is not reported as a duplicate.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyName`] or [`ValidationError::DuplicateCategory`].
    pub fn validate(
        &self,
        existing: &[Category],
        editing: Option<CategoryId>,
    ) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let taken = existing
            .iter()
            .filter(|c| Some(c.id) != editing)
            .any(|c| same_name(&c.name, name));
        if taken {
            return Err(ValidationError::DuplicateCategory);
        }
        Ok(Self {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
        })
    }
}

/// Raw subcategory form. The parent comes from the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubcategoryInput {
    pub name: String,
    pub description: String,
}

impl SubcategoryInput {
    /// Trim fields and check the name against the siblings in `category`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyName`] or [`ValidationError::DuplicateSubcategory`].
    pub fn validate(
        &self,
        category: CategoryId,
        existing: &[Subcategory],
        editing: Option<SubcategoryId>,
    ) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let taken = existing
            .iter()
            .filter(|s| s.category_id == category && Some(s.id) != editing)
            .any(|s| same_name(&s.name, name));
        if taken {
            return Err(ValidationError::DuplicateSubcategory);
        }
        Ok(Self {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
        })
    }
}

/// Raw product form as submitted. Numbers arrive as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub aroma: String,
    /// Images already attached plus new files in this submission.
    pub image_count: usize,
}

/// A product ready to write, with denormalized names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    pub subcategory_id: Option<SubcategoryId>,
    pub subcategory_name: String,
    pub aroma: Option<String>,
}

/// The parents a product is saved under right now.
///
/// A deactivated parent stays selectable for the products that still point
/// at it, so editing an orphaned product does not detach it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentParents {
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
}

impl CurrentParents {
    #[must_use]
    pub const fn of(product: &Product) -> Self {
        Self {
            category_id: product.category_id,
            subcategory_id: product.subcategory_id,
        }
    }

    /// Active categories plus the current one.
    #[must_use]
    pub fn allows_category(&self, category: &Category) -> bool {
        category.active || self.category_id == Some(category.id)
    }

    /// Active subcategories plus the current one.
    #[must_use]
    pub fn allows_subcategory(&self, subcategory: &Subcategory) -> bool {
        subcategory.active || self.subcategory_id == Some(subcategory.id)
    }
}

impl ProductInput {
    /// Validate and resolve the parent names.
    ///
    /// `categories` and `subcategories` are the full lists, inactive records
    /// included. An inactive parent is accepted only when it is the one in
    /// `current`.
    ///
    /// # Errors
    ///
    /// The first failing rule as a [`ValidationError`].
    pub fn validate(
        &self,
        categories: &[Category],
        subcategories: &[Subcategory],
        current: CurrentParents,
    ) -> Result<ProductDraft, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::ProductNameRequired);
        }
        let price = Price::parse_form(&self.price).map_err(|_| ValidationError::InvalidPrice)?;
        let stock = parse_stock(&self.stock)?;
        if self.image_count > MAX_PRODUCT_IMAGES {
            return Err(ValidationError::TooManyImages);
        }

        let category = match self.category_id {
            Some(id) => {
                let category = categories
                    .iter()
                    .find(|c| c.id == id)
                    .ok_or(ValidationError::UnknownCategory)?;
                if !current.allows_category(category) {
                    return Err(ValidationError::InactiveCategory);
                }
                Some(category)
            }
            None => None,
        };
        let subcategory = match self.subcategory_id {
            Some(id) => {
                let sub = subcategories
                    .iter()
                    .find(|s| s.id == id)
                    .ok_or(ValidationError::SubcategoryMismatch)?;
                if category.is_none_or(|c| c.id != sub.category_id) {
                    return Err(ValidationError::SubcategoryMismatch);
                }
                if !current.allows_subcategory(sub) {
                    return Err(ValidationError::InactiveSubcategory);
                }
                Some(sub)
            }
            None => None,
        };

        let aroma = self.aroma.trim();
        Ok(ProductDraft {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            stock,
            category_id: category.map(|c| c.id),
            category_name: category.map(|c| c.name.clone()).unwrap_or_default(),
            subcategory_id: subcategory.map(|s| s.id),
            subcategory_name: subcategory.map(|s| s.name.clone()).unwrap_or_default(),
            aroma: (!aroma.is_empty()).then(|| aroma.to_owned()),
        })
    }
}

fn parse_stock(input: &str) -> Result<i32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match trimmed.parse::<i32>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ValidationError::InvalidStock),
    }
}

/// Raw store settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsInput {
    pub store_name: String,
    pub description: String,
    pub contact_email: String,
    pub phone: String,
    pub social: SocialLinks,
}

impl SettingsInput {
    /// Trim every field; a non-empty contact email must parse.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidContactEmail`].
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let contact_email = self.contact_email.trim();
        let contact_email = if contact_email.is_empty() {
            String::new()
        } else {
            Email::parse(contact_email)
                .map_err(|_| ValidationError::InvalidContactEmail)?
                .into_inner()
        };
        Ok(Self {
            store_name: self.store_name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            contact_email,
            phone: self.phone.trim().to_owned(),
            social: SocialLinks {
                instagram: self.social.instagram.trim().to_owned(),
                facebook: self.social.facebook.trim().to_owned(),
                whatsapp: self.social.whatsapp.trim().to_owned(),
                tiktok: self.social.tiktok.trim().to_owned(),
            },
        })
    }
}

/// Check a new password and its confirmation from the registration form.
///
/// # Errors
///
/// [`ValidationError::PasswordMismatch`] or [`ValidationError::PasswordTooShort`].
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::model::fixtures::{category, subcategory};

    fn product_input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            price: "15000".to_owned(),
            stock: "3".to_owned(),
            ..ProductInput::default()
        }
    }

    #[test]
    fn test_category_name_is_trimmed() {
        let input = CategoryInput {
            name: "  Velas de soya ".to_owned(),
            description: " Naturales ".to_owned(),
        };
        let valid = input.validate(&[], None).unwrap();
        assert_eq!(valid.name, "Velas de soya");
        assert_eq!(valid.description, "Naturales");
    }

    #[test]
    fn test_category_empty_name() {
        let input = CategoryInput {
            name: "   ".to_owned(),
            ..CategoryInput::default()
        };
        let err = input.validate(&[], None).unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
        assert_eq!(err.to_string(), "El nombre no puede estar vacío.");
    }

    #[test]
    fn test_category_duplicate_is_case_insensitive() {
        let existing = vec![category(1, "Aromáticas")];
        let input = CategoryInput {
            name: "AROMÁTICAS".to_owned(),
            ..CategoryInput::default()
        };
        let err = input.validate(&existing, None).unwrap_err();
        assert_eq!(err.to_string(), "Ya existe una categoría con ese nombre.");
    }

    #[test]
    fn test_category_edit_keeps_own_name() {
        let existing = vec![category(1, "Aromáticas"), category(2, "Decorativas")];
        let input = CategoryInput {
            name: "aromáticas".to_owned(),
            ..CategoryInput::default()
        };
        assert!(input.validate(&existing, Some(CategoryId::new(1))).is_ok());
        assert_eq!(
            input.validate(&existing, Some(CategoryId::new(2))),
            Err(ValidationError::DuplicateCategory)
        );
    }

    #[test]
    fn test_subcategory_unique_among_siblings_only() {
        let existing = vec![subcategory(10, 1, "Lavanda"), subcategory(11, 2, "Canela")];
        let input = SubcategoryInput {
            name: "canela".to_owned(),
            ..SubcategoryInput::default()
        };
        assert!(input.validate(CategoryId::new(1), &existing, None).is_ok());

        let dup = SubcategoryInput {
            name: " Lavanda".to_owned(),
            ..SubcategoryInput::default()
        };
        let err = dup.validate(CategoryId::new(1), &existing, None).unwrap_err();
        assert_eq!(err.to_string(), "Ya existe una subcategoría con ese nombre.");
    }

    #[test]
    fn test_product_requires_name() {
        let err = product_input("  ")
            .validate(&[], &[], CurrentParents::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "El nombre es obligatorio.");
    }

    #[test]
    fn test_product_blank_numbers_are_zero() {
        let input = ProductInput {
            price: String::new(),
            stock: " ".to_owned(),
            ..product_input("Vela")
        };
        let draft = input.validate(&[], &[], CurrentParents::default()).unwrap();
        assert_eq!(draft.price, Price::ZERO);
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.aroma, None);
    }

    #[test]
    fn test_product_rejects_negative_numbers() {
        let bad_stock = ProductInput {
            stock: "-1".to_owned(),
            ..product_input("Vela")
        };
        assert_eq!(
            bad_stock.validate(&[], &[], CurrentParents::default()),
            Err(ValidationError::InvalidStock)
        );

        let bad_price = ProductInput {
            price: "-100".to_owned(),
            ..product_input("Vela")
        };
        assert_eq!(
            bad_price.validate(&[], &[], CurrentParents::default()),
            Err(ValidationError::InvalidPrice)
        );
    }

    #[test]
    fn test_product_resolves_parent_names() {
        let categories = vec![category(1, "Aromáticas")];
        let subcategories = vec![subcategory(10, 1, "Lavanda")];
        let input = ProductInput {
            category_id: Some(CategoryId::new(1)),
            subcategory_id: Some(SubcategoryId::new(10)),
            aroma: " lavanda y miel ".to_owned(),
            ..product_input("Vela")
        };

        let draft = input.validate(&categories, &subcategories, CurrentParents::default()).unwrap();

        assert_eq!(draft.category_name, "Aromáticas");
        assert_eq!(draft.subcategory_name, "Lavanda");
        assert_eq!(draft.aroma.as_deref(), Some("lavanda y miel"));
    }

    #[test]
    fn test_product_subcategory_must_match_category() {
        let categories = vec![category(1, "A"), category(2, "B")];
        let subcategories = vec![subcategory(10, 1, "S")];

        let wrong_parent = ProductInput {
            category_id: Some(CategoryId::new(2)),
            subcategory_id: Some(SubcategoryId::new(10)),
            ..product_input("Vela")
        };
        assert_eq!(
            wrong_parent.validate(&categories, &subcategories, CurrentParents::default()),
            Err(ValidationError::SubcategoryMismatch)
        );

        let no_parent = ProductInput {
            subcategory_id: Some(SubcategoryId::new(10)),
            ..product_input("Vela")
        };
        assert_eq!(
            no_parent.validate(&categories, &subcategories, CurrentParents::default()),
            Err(ValidationError::SubcategoryMismatch)
        );
    }

    #[test]
    fn test_product_inactive_parent_only_when_current() {
        let mut retired = category(1, "Navidad");
        retired.active = false;
        let mut retired_sub = subcategory(10, 1, "Renos");
        retired_sub.active = false;
        let categories = vec![retired, category(2, "Aromáticas")];
        let subcategories = vec![retired_sub];
        let input = ProductInput {
            category_id: Some(CategoryId::new(1)),
            subcategory_id: Some(SubcategoryId::new(10)),
            ..product_input("Vela")
        };

        assert_eq!(
            input.validate(&categories, &subcategories, CurrentParents::default()),
            Err(ValidationError::InactiveCategory)
        );

        let current = CurrentParents {
            category_id: Some(CategoryId::new(1)),
            subcategory_id: Some(SubcategoryId::new(10)),
        };
        let draft = input.validate(&categories, &subcategories, current).unwrap();
        assert_eq!(draft.category_id, Some(CategoryId::new(1)));
        assert_eq!(draft.category_name, "Navidad");
        assert_eq!(draft.subcategory_name, "Renos");

        let category_only = CurrentParents {
            category_id: Some(CategoryId::new(1)),
            subcategory_id: None,
        };
        assert_eq!(
            input.validate(&categories, &subcategories, category_only),
            Err(ValidationError::InactiveSubcategory)
        );
    }

    #[test]
    fn test_product_image_limit() {
        let input = ProductInput {
            image_count: 6,
            ..product_input("Vela")
        };
        assert_eq!(
            input.validate(&[], &[], CurrentParents::default()),
            Err(ValidationError::TooManyImages)
        );
    }

    #[test]
    fn test_settings_email_optional_but_checked() {
        let blank = SettingsInput::default().validate().unwrap();
        assert!(blank.contact_email.is_empty());

        let bad = SettingsInput {
            contact_email: "no-es-correo".to_owned(),
            ..SettingsInput::default()
        };
        assert_eq!(bad.validate(), Err(ValidationError::InvalidContactEmail));

        let good = SettingsInput {
            contact_email: " Hola@Candela.co ".to_owned(),
            store_name: " Candela ".to_owned(),
            ..SettingsInput::default()
        }
        .validate()
        .unwrap();
        assert_eq!(good.contact_email, "hola@candela.co");
        assert_eq!(good.store_name, "Candela");
    }

    #[test]
    fn test_new_password_rules() {
        assert_eq!(
            validate_new_password("secreto", "secreta"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_new_password("abc", "abc").unwrap_err().to_string(),
            "La contraseña debe tener al menos 6 caracteres."
        );
        assert!(validate_new_password("abcdef", "abcdef").is_ok());
    }
}
