//! Seed the catalog with the sample products.
//!
//! Products are written through the same gateway the server uses, so they
//! pass the same validation (category, palette colors, sizes).

use std::time::Duration;

use tracing::{info, warn};

use pampa_core::{Money, ProductId};
use pampa_storefront::db::{self, PgGateway};
use pampa_storefront::gateway::CatalogGateway;
use pampa_storefront::models::NewProduct;

use super::migrate::database_url;

/// Statement timeout for seeding.
const SEED_TIMEOUT: Duration = Duration::from_secs(30);

struct SampleProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    price_centavos: i64,
    category: &'static str,
    is_featured: bool,
    images: &'static [&'static str],
    sizes: &'static [&'static str],
    colors: &'static [&'static str],
}

const SAMPLE_CATALOG: [SampleProduct; 4] = [
    SampleProduct {
        id: "camisa-campeira",
        name: "Camisa Campeira Premium",
        description: "Camisa feita em algodão premium, ideal para o dia a dia no campo e para eventos campeiros.",
        price_centavos: 19_990,
        category: "Camisas",
        is_featured: true,
        images: &[
            "https://images.unsplash.com/photo-1512436991641-6745cdb1723f?auto=format&fit=crop&w=600&q=80",
            "https://images.unsplash.com/photo-1503342217505-b0a15ec3261c?auto=format&fit=crop&w=600&q=80",
        ],
        sizes: &["P", "M", "G", "GG"],
        colors: &["Branco", "Bege", "Verde Musgo"],
    },
    SampleProduct {
        id: "bota-couro",
        name: "Bota de Couro",
        description: "Bota de couro legítimo, resistente e confortável para o uso diário no campo.",
        price_centavos: 34_990,
        category: "Calçados",
        is_featured: true,
        images: &[
            "https://images.unsplash.com/photo-1464983953574-0892a716854b?auto=format&fit=crop&w=600&q=80",
        ],
        sizes: &["37", "38", "39", "40", "41", "42"],
        colors: &["Marrom", "Preto"],
    },
    SampleProduct {
        id: "chapeu-palha",
        name: "Chapéu de Palha",
        description: "Chapéu tradicional de palha, leve e estiloso para proteção no sol.",
        price_centavos: 9_990,
        category: "Boinas",
        is_featured: false,
        images: &[
            "https://images.unsplash.com/photo-1503342217505-b0a15ec3261c?auto=format&fit=crop&w=600&q=80",
        ],
        sizes: &["P", "M", "G"],
        colors: &["Bege"],
    },
    SampleProduct {
        id: "lenco-tradicional",
        name: "Lenço Tradicional",
        description: "Lenço tradicional gaúcho, símbolo de respeito e tradição.",
        price_centavos: 4_990,
        category: "Lenços",
        is_featured: false,
        images: &[
            "https://images.unsplash.com/photo-1519125323398-675f0ddb6308?auto=format&fit=crop&w=600&q=80",
        ],
        sizes: &["Único"],
        colors: &["Vermelho", "Azul Marinho", "Verde Musgo"],
    },
];

impl SampleProduct {
    fn to_new_product(&self) -> Result<NewProduct, Box<dyn std::error::Error>> {
        let to_strings =
            |values: &[&str]| -> Vec<String> { values.iter().map(ToString::to_string).collect() };
        Ok(NewProduct {
            id: Some(self.id.to_string()),
            name: self.name.to_string(),
            description: self.description.to_string(),
            price: Money::from_minor(self.price_centavos)?,
            promotional_price: None,
            category: Some(self.category.to_string()),
            is_featured: self.is_featured,
            is_new_collection: false,
            images: to_strings(self.images),
            primary_image: self.images.first().map(ToString::to_string),
            sizes: to_strings(self.sizes),
            colors: to_strings(self.colors),
        })
    }
}

/// Insert the sample catalog.
///
/// # Arguments
///
/// * `overwrite` - Replace products whose id already exists instead of skipping them
///
/// # Errors
///
/// Returns an error if the database is unreachable or a product is rejected.
pub async fn catalog(overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let gateway = PgGateway::new(pool, SEED_TIMEOUT);
    info!("Connected to database");

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;

    for sample in &SAMPLE_CATALOG {
        let product = sample.to_new_product()?;
        product.validate()?;
        let id = ProductId::parse(sample.id)?;

        if gateway.get_product(&id).await?.is_some() {
            if !overwrite {
                info!(product_id = %id, "Already present, skipping");
                skipped += 1;
                continue;
            }
            warn!(product_id = %id, "Replacing existing product");
            gateway.delete_product(&id).await?;
        }

        gateway.create_product(id, product).await?;
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}
