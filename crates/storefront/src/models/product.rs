//! Catalog product types.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use pampa_core::{CATEGORIES, Money, ProductId, ProductIdError, is_palette_color};

use super::double_option;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    /// List price.
    #[serde(rename = "preco")]
    pub price: Money,
    #[serde(rename = "preco_promocional", default)]
    pub promotional_price: Option<Money>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    /// Shown in the home page "lançamentos" strip.
    #[serde(rename = "lancamento", default)]
    pub is_featured: bool,
    #[serde(rename = "nova_colecao", default)]
    pub is_new_collection: bool,
    #[serde(rename = "imagens", default)]
    pub images: Vec<String>,
    #[serde(rename = "imagem_principal", default)]
    pub primary_image: Option<String>,
    /// Sizes in display order.
    #[serde(rename = "tamanhos", default)]
    pub sizes: Vec<String>,
    #[serde(rename = "cores", default)]
    pub colors: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price charged per unit: the promotional price when one is set and
    /// non-zero, otherwise the list price.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.promotional_price
            .filter(|promo| !promo.is_zero())
            .unwrap_or(self.price)
    }

    /// Whether `size` may be ordered. An empty size list accepts anything.
    #[must_use]
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.is_empty() || self.sizes.iter().any(|s| s == size)
    }

    /// Whether `color` may be ordered. An empty color list accepts anything.
    #[must_use]
    pub fn offers_color(&self, color: &str) -> bool {
        self.colors.is_empty() || self.colors.iter().any(|c| c == color)
    }
}

/// A product ready to be inserted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Admin-assigned id; blank means "generate one".
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: Money,
    #[serde(rename = "preco_promocional", default)]
    pub promotional_price: Option<Money>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "lancamento", default)]
    pub is_featured: bool,
    #[serde(rename = "nova_colecao", default)]
    pub is_new_collection: bool,
    #[serde(rename = "imagens", default)]
    pub images: Vec<String>,
    #[serde(rename = "imagem_principal", default)]
    pub primary_image: Option<String>,
    #[serde(rename = "tamanhos", default)]
    pub sizes: Vec<String>,
    #[serde(rename = "cores", default)]
    pub colors: Vec<String>,
}

impl NewProduct {
    /// Check the product against the catalog vocabulary.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name is required".to_string());
        }
        validate_category(self.category.as_deref())?;
        validate_colors(&self.colors)?;
        validate_sizes(&self.sizes)
    }

    /// The product id to insert, generating one when the admin left it blank.
    ///
    /// # Errors
    ///
    /// Returns [`ProductIdError`] for an oversized id.
    pub fn resolve_id(&self) -> Result<ProductId, ProductIdError> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(generate_product_id()),
            Some(raw) => ProductId::parse(raw),
        }
    }
}

/// Partial product update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "preco", default)]
    pub price: Option<Money>,
    #[serde(rename = "preco_promocional", default, deserialize_with = "double_option")]
    pub promotional_price: Option<Option<Money>>,
    #[serde(rename = "categoria", default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(rename = "lancamento", default)]
    pub is_featured: Option<bool>,
    #[serde(rename = "nova_colecao", default)]
    pub is_new_collection: Option<bool>,
    #[serde(rename = "imagens", default)]
    pub images: Option<Vec<String>>,
    #[serde(rename = "imagem_principal", default, deserialize_with = "double_option")]
    pub primary_image: Option<Option<String>>,
    #[serde(rename = "tamanhos", default)]
    pub sizes: Option<Vec<String>>,
    #[serde(rename = "cores", default)]
    pub colors: Option<Vec<String>>,
}

impl ProductPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.promotional_price.is_none()
            && self.category.is_none()
            && self.is_featured.is_none()
            && self.is_new_collection.is_none()
            && self.images.is_none()
            && self.primary_image.is_none()
            && self.sizes.is_none()
            && self.colors.is_none()
    }

    /// Check the changed fields against the catalog vocabulary.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("product name cannot be blank".to_string());
        }
        if let Some(category) = &self.category {
            validate_category(category.as_deref())?;
        }
        if let Some(colors) = &self.colors {
            validate_colors(colors)?;
        }
        if let Some(sizes) = &self.sizes {
            validate_sizes(sizes)?;
        }
        Ok(())
    }
}

/// Ordering applied to product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrder {
    #[default]
    NewestFirst,
    IdDescending,
}

impl ProductOrder {
    /// SQL `ORDER BY` clause body.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::NewestFirst => "created_at DESC, id",
            Self::IdDescending => "id DESC",
        }
    }
}

/// Equality filters, ordering and limit for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductFilter {
    pub new_collection: Option<bool>,
    pub featured: Option<bool>,
    pub order: ProductOrder,
    pub limit: Option<u32>,
}

impl ProductFilter {
    /// Every product, newest first.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Products flagged as the new collection.
    #[must_use]
    pub fn new_collection() -> Self {
        Self {
            new_collection: Some(true),
            ..Self::default()
        }
    }

    /// The `limit` newest featured products.
    #[must_use]
    pub fn featured(limit: u32) -> Self {
        Self {
            featured: Some(true),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// The regular shop: everything outside the new collection, highest id first.
    #[must_use]
    pub fn shop() -> Self {
        Self {
            new_collection: Some(false),
            order: ProductOrder::IdDescending,
            ..Self::default()
        }
    }

    /// Whether `product` passes the equality filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.new_collection
            .is_none_or(|flag| product.is_new_collection == flag)
            && self.featured.is_none_or(|flag| product.is_featured == flag)
    }
}

/// Generate an admin-style product id (`PP100` to `PP1099`).
#[must_use]
pub fn generate_product_id() -> ProductId {
    ProductId::sequential(100 + rand::rng().random_range(0..1000))
}

fn validate_category(category: Option<&str>) -> Result<(), String> {
    match category {
        Some(c) if !CATEGORIES.contains(&c) => Err(format!(
            "unknown category '{c}' (expected one of: {})",
            CATEGORIES.join(", ")
        )),
        _ => Ok(()),
    }
}

fn validate_colors(colors: &[String]) -> Result<(), String> {
    match colors.iter().find(|c| !is_palette_color(c)) {
        Some(c) => Err(format!("color '{c}' is not in the shop palette")),
        None => Ok(()),
    }
}

fn validate_sizes(sizes: &[String]) -> Result<(), String> {
    if sizes.iter().any(|s| s.trim().is_empty()) {
        return Err("sizes cannot be blank".to_string());
    }
    Ok(())
}
