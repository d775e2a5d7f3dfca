//! Data models for scraped products, price tiers and listing pages.

use crate::site::catalog::{Category, Gender};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prices below this are affordable.
pub const AFFORDABLE_BELOW: f64 = 3000.0;

/// Prices below this (and at least [`AFFORDABLE_BELOW`]) are mid-range.
pub const MID_BELOW: f64 = 8000.0;

/// Number of components in a CLIP ViT-B/32 image embedding.
pub const EMBEDDING_DIM: usize = 512;

/// A product scraped from a Culture Circle listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product name (from the card image alt text)
    pub name: String,
    /// Brand, taken as the first word of the name
    pub brand: String,
    /// Original (list) price
    pub price: Option<f64>,
    /// Sale price shown next to the struck-through original
    pub discounted_price: Option<f64>,
    /// Catalog category
    pub category: Category,
    /// Catalog gender
    pub gender: Gender,
    /// Absolute product page URL
    pub product_url: String,
    /// Product image URL
    pub image_url: String,
    /// Derived price band
    pub price_tier: PriceTier,
    /// Image path relative to the run directory, empty if not downloaded
    #[serde(default)]
    pub image_path: String,
    /// Image embedding, once computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Product {
    /// Creates an empty product for the given section.
    pub fn new(category: Category, gender: Gender) -> Self {
        Self {
            name: String::new(),
            brand: String::new(),
            price: None,
            discounted_price: None,
            category,
            gender,
            product_url: String::new(),
            image_url: String::new(),
            price_tier: PriceTier::Unknown,
            image_path: String::new(),
            embedding: None,
        }
    }

    /// Returns the price the customer pays: the discounted price if any.
    /// A zero sale price counts as missing.
    pub fn effective_price(&self) -> Option<f64> {
        self.discounted_price.filter(|p| *p > 0.0).or(self.price)
    }

    /// Recomputes the price tier from the current prices.
    pub fn classify(&mut self) {
        self.price_tier = PriceTier::for_price(self.effective_price());
    }

    /// Returns discount percentage if on sale.
    pub fn discount_percent(&self) -> Option<u8> {
        match (self.price, self.discounted_price) {
            (Some(orig), Some(sale)) if sale > 0.0 && sale < orig => {
                let discount = ((orig - sale) / orig * 100.0).round() as u8;
                Some(discount.min(99))
            }
            _ => None,
        }
    }

    /// Returns true if an image was saved for this product.
    pub fn has_image(&self) -> bool {
        !self.image_path.is_empty()
    }
}

/// Three-way price band, plus `Unknown` for products without a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Affordable,
    Mid,
    Expensive,
    Unknown,
}

impl PriceTier {
    /// Classifies a known price. Never returns `Unknown`.
    pub fn classify(price: f64) -> Self {
        if price < AFFORDABLE_BELOW {
            PriceTier::Affordable
        } else if price < MID_BELOW {
            PriceTier::Mid
        } else {
            PriceTier::Expensive
        }
    }

    /// Classifies an optional price.
    pub fn for_price(price: Option<f64>) -> Self {
        price.map(Self::classify).unwrap_or(PriceTier::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Affordable => "affordable",
            PriceTier::Mid => "mid",
            PriceTier::Expensive => "expensive",
            PriceTier::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "affordable" => Ok(PriceTier::Affordable),
            "mid" => Ok(PriceTier::Mid),
            "expensive" => Ok(PriceTier::Expensive),
            "unknown" | "" => Ok(PriceTier::Unknown),
            _ => Err(format!("Unknown price tier: {}. Use: affordable, mid, expensive", s)),
        }
    }
}

/// Products parsed from one listing page.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Search keyword that produced the page
    pub keyword: String,
    /// Category of the section
    pub category: Category,
    /// Gender of the section
    pub gender: Gender,
    /// Products found
    pub products: Vec<Product>,
}

impl Listing {
    /// Creates an empty listing.
    pub fn new(keyword: impl Into<String>, category: Category, gender: Gender) -> Self {
        Self { keyword: keyword.into(), category, gender, products: Vec::new() }
    }

    /// Returns number of products.
    pub fn count(&self) -> usize {
        self.products.len()
    }

    /// Returns true if no products were found.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
