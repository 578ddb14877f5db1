use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// How a sold unit reaches the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FulfillmentMethod {
    /// Seller ships each order directly (FBM).
    #[serde(rename = "fbm", alias = "self_fulfilled")]
    SelfFulfilled,
    /// Marketplace warehouses and ships the unit (FBA).
    #[serde(rename = "fba", alias = "marketplace")]
    Marketplace,
}

impl FulfillmentMethod {
    /// Short code used in opportunity keys and the database, `"fbm"` or `"fba"`.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            FulfillmentMethod::SelfFulfilled => "fbm",
            FulfillmentMethod::Marketplace => "fba",
        }
    }
}

impl std::fmt::Display for FulfillmentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FulfillmentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fbm" | "self" | "selffulfilled" | "self-fulfilled" => {
                Ok(FulfillmentMethod::SelfFulfilled)
            }
            "fba" | "marketplace" => Ok(FulfillmentMethod::Marketplace),
            other => Err(CoreError::InvalidFulfillmentMethod(other.to_string())),
        }
    }
}

/// Package dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_in: f64,
    pub width_in: f64,
    pub height_in: f64,
}

impl Dimensions {
    #[must_use]
    pub fn new(length_in: f64, width_in: f64, height_in: f64) -> Self {
        Self {
            length_in,
            width_in,
            height_in,
        }
    }

    #[must_use]
    pub fn cubic_feet(&self) -> f64 {
        self.length_in * self.width_in * self.height_in / 1728.0
    }

    #[must_use]
    pub fn longest(&self) -> f64 {
        self.length_in.max(self.width_in).max(self.height_in)
    }

    #[must_use]
    pub fn shortest(&self) -> f64 {
        self.length_in.min(self.width_in).min(self.height_in)
    }

    /// Longest side plus the girth around the two shorter sides.
    #[must_use]
    pub fn length_plus_girth(&self) -> f64 {
        let longest = self.longest();
        let sum = self.length_in + self.width_in + self.height_in;
        longest + 2.0 * (sum - longest)
    }
}

/// A product found at a retail store, as reported by a scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProduct {
    /// Retailer's own product identifier.
    pub id: String,
    pub title: String,
    /// Retailer name, e.g. `"walmart"`.
    pub store: String,
    pub category: Option<String>,
    /// Current shelf price. Scanners send `null` when the page had no price.
    pub price: Option<f64>,
    /// Pre-markdown price, if the listing showed one.
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Shipping weight in pounds, when the retailer lists it.
    #[serde(default)]
    pub weight_lb: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl SourceProduct {
    /// Markdown from `original_price` to `price`, as a whole percentage.
    ///
    /// `None` when either price is missing or the original price is not
    /// above the current one.
    #[must_use]
    pub fn discount_percent(&self) -> Option<f64> {
        let (current, original) = (self.price?, self.original_price?);
        if original <= 0.0 || original <= current {
            return None;
        }
        Some(((original - current) / original * 100.0).round())
    }
}

/// A marketplace listing matched to a [`SourceProduct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceProduct {
    /// ASIN-like listing identifier.
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    /// Buy-box price. `None` when the listing is out of stock.
    pub price: Option<f64>,
    /// Best-seller rank within `category`; lower sells more.
    #[serde(default)]
    pub sales_rank: Option<u64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub features: Vec<String>,
    pub url: String,
}

/// Canonical form of a category name used for every category lookup:
/// trimmed and lowercased.
#[must_use]
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}
