//! Product repository queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use pampa_core::{Money, ProductId};

use super::{PgGateway, money_from_db};
use crate::gateway::{CatalogGateway, GatewayError};
use crate::models::{NewProduct, Product, ProductFilter, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, nome, descricao, preco, preco_promocional, categoria, \
     lancamento, nova_colecao, imagens, imagem_principal, tamanhos, cores, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    nome: String,
    descricao: String,
    preco: Decimal,
    preco_promocional: Option<Decimal>,
    categoria: Option<String>,
    lancamento: bool,
    nova_colecao: bool,
    imagens: Vec<String>,
    imagem_principal: Option<String>,
    tamanhos: Vec<String>,
    cores: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = GatewayError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            price: money_from_db(row.preco, "preco")?,
            promotional_price: row
                .preco_promocional
                .map(|p| money_from_db(p, "preco_promocional"))
                .transpose()?,
            id: row.id,
            name: row.nome,
            description: row.descricao,
            category: row.categoria,
            is_featured: row.lancamento,
            is_new_collection: row.nova_colecao,
            images: row.imagens,
            primary_image: row.imagem_principal,
            sizes: row.tamanhos,
            colors: row.cores,
            created_at: row.created_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, GatewayError> {
    rows.into_iter().map(Product::try_from).collect()
}

impl CatalogGateway for PgGateway {
    #[instrument(skip(self))]
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, GatewayError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos \
             WHERE ($1::boolean IS NULL OR nova_colecao = $1) \
               AND ($2::boolean IS NULL OR lancamento = $2) \
             ORDER BY {} \
             LIMIT $3",
            filter.order.sql()
        );
        let rows = self
            .bounded(
                "list_products",
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(filter.new_collection)
                    .bind(filter.featured)
                    .bind(filter.limit.map(i64::from))
                    .fetch_all(&self.pool),
            )
            .await?;
        into_products(rows)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM produtos WHERE id = $1");
        let row = self
            .bounded(
                "get_product",
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM produtos WHERE id = ANY($1)");
        let rows = self
            .bounded(
                "products_by_ids",
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(raw_ids)
                    .fetch_all(&self.pool),
            )
            .await?;
        into_products(rows)
    }

    #[instrument(skip(self, product), fields(product_id = %id))]
    async fn create_product(
        &self,
        id: ProductId,
        product: NewProduct,
    ) -> Result<Product, GatewayError> {
        let sql = format!(
            "INSERT INTO produtos (id, nome, descricao, preco, preco_promocional, categoria, \
                                   lancamento, nova_colecao, imagens, imagem_principal, tamanhos, cores) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = self
            .bounded(
                "create_product",
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .bind(product.name)
                    .bind(product.description)
                    .bind(product.price.to_decimal())
                    .bind(product.promotional_price.map(Money::to_decimal))
                    .bind(product.category)
                    .bind(product.is_featured)
                    .bind(product.is_new_collection)
                    .bind(product.images)
                    .bind(product.primary_image)
                    .bind(product.sizes)
                    .bind(product.colors)
                    .fetch_one(&self.pool),
            )
            .await?;
        Product::try_from(row)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, GatewayError> {
        if patch.is_empty() {
            return self.get_product(id).await;
        }

        let mut builder = build_product_update(id, patch);
        let row = self
            .bounded(
                "update_product",
                builder
                    .build_query_as::<ProductRow>()
                    .fetch_optional(&self.pool),
            )
            .await?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<bool, GatewayError> {
        let result = self
            .bounded(
                "delete_product",
                sqlx::query("DELETE FROM produtos WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Build `UPDATE produtos SET ... WHERE id = $n RETURNING ...` for the
/// fields present in `patch`. The patch must not be empty.
fn build_product_update(id: &ProductId, patch: ProductPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE produtos SET ");
    let mut set = builder.separated(", ");

    if let Some(name) = patch.name {
        set.push("nome = ").push_bind_unseparated(name);
    }
    if let Some(description) = patch.description {
        set.push("descricao = ").push_bind_unseparated(description);
    }
    if let Some(price) = patch.price {
        set.push("preco = ").push_bind_unseparated(price.to_decimal());
    }
    if let Some(promo) = patch.promotional_price {
        set.push("preco_promocional = ")
            .push_bind_unseparated(promo.map(Money::to_decimal));
    }
    if let Some(category) = patch.category {
        set.push("categoria = ").push_bind_unseparated(category);
    }
    if let Some(featured) = patch.is_featured {
        set.push("lancamento = ").push_bind_unseparated(featured);
    }
    if let Some(new_collection) = patch.is_new_collection {
        set.push("nova_colecao = ").push_bind_unseparated(new_collection);
    }
    if let Some(images) = patch.images {
        set.push("imagens = ").push_bind_unseparated(images);
    }
    if let Some(primary) = patch.primary_image {
        set.push("imagem_principal = ").push_bind_unseparated(primary);
    }
    if let Some(sizes) = patch.sizes {
        set.push("tamanhos = ").push_bind_unseparated(sizes);
    }
    if let Some(colors) = patch.colors {
        set.push("cores = ").push_bind_unseparated(colors);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id.as_str().to_owned())
        .push(" RETURNING ")
        .push(PRODUCT_COLUMNS);
    builder
}
