//! # Catalog
//!
//! In-memory catalog of metals, stones and products, loaded from TOML.
//!
//! The catalog is the persistence stand-in for the storefront: everything it
//! hands to the calculator is plain data.
//!
//! ```toml
//! [[metals]]
//! id = "gold"
//! name = "Gold"
//! purityLevels = [
//!     { karat = 10, priceMultiplier = 1.0 },
//!     { karat = 14, priceMultiplier = 1.15 },
//! ]
//!
//! [[stones]]
//! id = "diamond"
//! name = "Diamond"
//! price = 450.0
//!
//! [[products]]
//! id = "solitaire-ring"
//! name = "Classic Solitaire Ring"
//! basePrice = 1000.0
//! metalId = "gold"
//! stoneIds = ["diamond"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use karat_core::validation::{validate_metal, validate_product, validate_quantity, validate_stone};
use karat_core::{CoreError, CoreResult, Metal, PriceBreakdown, Product, StoneType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// What a shopper picked on the product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub product_id: String,
    pub karat: u32,
    #[serde(default)]
    pub stone_id: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub metals: Vec<Metal>,
    #[serde(default)]
    pub stones: Vec<StoneType>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Catalog {
    /// Reads and validates a catalog file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::CatalogLoadFailed(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_toml_str(&contents)?;
        info!(
            ?path,
            metals = catalog.metals.len(),
            stones = catalog.stones.len(),
            products = catalog.products.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses and validates a catalog document.
    pub fn from_toml_str(contents: &str) -> StoreResult<Self> {
        let catalog: Catalog =
            toml::from_str(contents).map_err(|e| StoreError::CatalogLoadFailed(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks every entry and every cross reference.
    pub fn validate(&self) -> StoreResult<()> {
        ensure_unique_ids("metal", self.metals.iter().map(|m| m.id.as_str()))?;
        ensure_unique_ids("stone", self.stones.iter().map(|s| s.id.as_str()))?;
        ensure_unique_ids("product", self.products.iter().map(|p| p.id.as_str()))?;

        for metal in &self.metals {
            validate_metal(metal).map_err(|e| invalid("metal", &metal.id, e))?;
        }

        for stone in &self.stones {
            validate_stone(stone).map_err(|e| invalid("stone", &stone.id, e))?;
        }

        for product in &self.products {
            validate_product(product).map_err(|e| invalid("product", &product.id, e))?;

            if self.metal(&product.metal_id).is_err() {
                return Err(invalid(
                    "product",
                    &product.id,
                    format!("unknown metal {}", product.metal_id),
                ));
            }

            if let Some(missing) = product.stone_ids.iter().find(|id| self.stone(id).is_err()) {
                return Err(invalid("product", &product.id, format!("unknown stone {missing}")));
            }
        }

        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn product(&self, id: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    pub fn metal(&self, id: &str) -> CoreResult<&Metal> {
        self.metals
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| CoreError::MetalNotFound(id.to_string()))
    }

    pub fn stone(&self, id: &str) -> CoreResult<&StoneType> {
        self.stones
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::StoneNotFound(id.to_string()))
    }

    /// Resolves a stone choice for a product, rejecting stones it doesn't offer.
    pub fn stone_for(&self, product: &Product, stone_id: Option<&str>) -> CoreResult<Option<&StoneType>> {
        let Some(stone_id) = stone_id else {
            return Ok(None);
        };
        let stone = self.stone(stone_id)?;
        if !product.offers_stone(stone_id) {
            return Err(CoreError::StoneNotOffered {
                product_id: product.id.clone(),
                stone_id: stone_id.to_string(),
            });
        }
        Ok(Some(stone))
    }

    /// Active products, optionally limited to one category.
    pub fn listed_products<'a>(&'a self, category: Option<&'a str>) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(|p| p.active)
            .filter(move |p| category.map_or(true, |c| p.category.as_deref() == Some(c)))
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Prices a product configuration in the base currency.
    ///
    /// Lookups fail for unknown IDs. Pricing data gaps do not: a karat the
    /// metal doesn't offer prices at the base tier and a missing base price
    /// counts as 0.
    pub fn quote(&self, request: &QuoteRequest) -> CoreResult<PriceBreakdown> {
        validate_quantity(request.quantity)?;

        let product = self.product(&request.product_id)?;
        let metal = self.metal(&product.metal_id)?;
        let stone = self.stone_for(product, request.stone_id.as_deref())?;

        if !metal.offers_karat(request.karat) {
            debug!(
                product = %product.id,
                metal = %metal.id,
                karat = request.karat,
                "Karat not offered, pricing at base tier"
            );
        }

        Ok(PriceBreakdown::for_item(
            product.base_price,
            metal,
            request.karat,
            stone,
            request.quantity,
        ))
    }
}

fn ensure_unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(invalid(kind, id, "id is required"));
        }
        if !seen.insert(id) {
            return Err(invalid(kind, id, "duplicate id"));
        }
    }
    Ok(())
}

fn invalid(kind: &str, id: &str, reason: impl ToString) -> StoreError {
    StoreError::InvalidCatalog {
        entry: format!("{kind} '{id}'"),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = include_str!("../data/catalog.toml");

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn request(product: &str, karat: u32, stone: Option<&str>, quantity: u32) -> QuoteRequest {
        QuoteRequest {
            product_id: product.to_string(),
            karat,
            stone_id: stone.map(str::to_string),
            quantity,
        }
    }

    #[test]
    fn test_sample_catalog_loads() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(catalog.metals.len(), 2);
        assert_eq!(catalog.stones.len(), 3);
        assert_eq!(catalog.products.len(), 4);

        let gold = catalog.metal("gold").unwrap();
        assert_eq!(gold.active_karats(), vec![10, 14, 18]);
    }

    #[test]
    fn test_quote_compounds_tiers_and_adds_stone() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();

        let quote = catalog.quote(&request("solitaire-ring", 14, Some("sapphire"), 2)).unwrap();
        assert!(approx_eq(quote.multiplier, 1.15));
        assert!(approx_eq(quote.total, 2700.0));

        let quote = catalog.quote(&request("solitaire-ring", 18, Some("diamond"), 1)).unwrap();
        assert!(approx_eq(quote.unit_price, 1000.0 * 1.38 + 450.0));
    }

    #[test]
    fn test_quote_falls_back_for_unknown_or_inactive_karat() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();

        let inactive = catalog.quote(&request("rope-chain", 22, None, 1)).unwrap();
        assert_eq!(inactive.multiplier, 1.0);
        assert_eq!(inactive.total, 640.0);

        let unknown = catalog.quote(&request("rope-chain", 24, None, 1)).unwrap();
        assert_eq!(unknown.multiplier, 1.0);
    }

    #[test]
    fn test_quote_missing_base_price_is_zero() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let quote = catalog.quote(&request("signet-ring", 18, None, 3)).unwrap();
        assert_eq!(quote.base_price, 0.0);
        assert_eq!(quote.total, 0.0);
    }

    #[test]
    fn test_quote_lookup_errors() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();

        assert!(matches!(
            catalog.quote(&request("tiara", 18, None, 1)),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(matches!(
            catalog.quote(&request("rope-chain", 18, Some("ruby"), 1)),
            Err(CoreError::StoneNotOffered { .. })
        ));
        assert!(matches!(
            catalog.quote(&request("rope-chain", 18, Some("opal"), 1)),
            Err(CoreError::StoneNotFound(_))
        ));
        assert!(matches!(
            catalog.quote(&request("rope-chain", 18, None, 0)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_listed_products_by_category() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(catalog.listed_products(Some("rings")).count(), 3);
        assert_eq!(catalog.listed_products(Some("necklaces")).count(), 1);
        assert_eq!(catalog.listed_products(None).count(), 4);
    }

    #[test]
    fn test_rejects_duplicate_karats() {
        let result = Catalog::from_toml_str(
            r#"
            [[metals]]
            id = "gold"
            name = "Gold"
            purityLevels = [
                { karat = 14, priceMultiplier = 1.0 },
                { karat = 14, priceMultiplier = 1.15 },
            ]
            "#,
        );
        assert!(matches!(result, Err(StoreError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_rejects_dangling_references() {
        let result = Catalog::from_toml_str(
            r#"
            [[products]]
            id = "ring"
            name = "Ring"
            metalId = "silver"
            "#,
        );
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid catalog entry product 'ring': unknown metal silver"
        );
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("karat-catalog-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.products.len(), 4);
        let quote = catalog.quote(&request("eternity-band", 950, None, 1)).unwrap();
        assert!(approx_eq(quote.total, 1800.0 * 1.08));
    }

    #[test]
    fn test_rejects_fractional_karat() {
        let result = Catalog::from_toml_str(
            r#"
            [[metals]]
            id = "gold"
            name = "Gold"
            purityLevels = [
                { karat = 10, priceMultiplier = 1.0 },
                { karat = 14.5, priceMultiplier = 1.15 },
            ]
            "#,
        );
        assert!(matches!(result, Err(StoreError::CatalogLoadFailed(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/karat/catalog.toml")).unwrap_err();
        assert!(matches!(err, StoreError::CatalogLoadFailed(_)));
    }
}
