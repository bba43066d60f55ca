use serde::{Deserialize, Serialize};

use crate::domain::{BudgetBand, ProductId};

/// Bandwidth the client always quotes; the backend requires the field but the
/// operator never edits it.
pub const FIXED_BANDWIDTH_MBPS: u32 = 100;

/// File name the combined deck is saved under on the operator's machine.
pub const FINAL_DECK_FILE_NAME: &str = "final_recommended_pitch.pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
}

/// Backend-provided list of sellable products and selectable industries.
/// Replaced wholesale on every successful `/api/catalog` fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
    #[serde(default)]
    pub industries: Vec<String>,
}

impl Catalog {
    pub fn product_name(&self, id: &ProductId) -> Option<&str> {
        self.products
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.name.as_str())
    }
}

/// Body of `POST /api/recommend` and `POST /api/generate`. Field names match
/// the backend contract verbatim; `nam_name`/`nam_circle` are the account
/// manager's name and territory circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitchRequest {
    pub client_name: String,
    pub company_name: String,
    pub client_email: String,
    pub nam_name: String,
    pub nam_circle: String,
    pub industry: String,
    pub budget_band: BudgetBand,
    pub size: Option<u64>,
    pub products_already_sold: Vec<ProductId>,
    pub bandwidth_mbps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    #[serde(default)]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub talking_points: Vec<String>,
}

/// Ranked recommendation returned by `POST /api/recommend`. Order is the
/// backend's rank order and must be preserved when rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub recommended: Vec<RecommendedProduct>,
}
