//! Price tier filter.

use super::Filter;
use crate::site::models::{PriceTier, Product};

/// Keeps products in one price tier.
pub struct TierFilter {
    tier: PriceTier,
}

impl TierFilter {
    pub fn new(tier: PriceTier) -> Self {
        Self { tier }
    }
}

impl Filter for TierFilter {
    fn matches(&self, product: &Product) -> bool {
        product.price_tier == self.tier
    }

    fn description(&self) -> String {
        format!("Tier: {}", self.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::catalog::{Category, Gender};

    fn priced(price: Option<f64>) -> Product {
        let mut product = Product::new(Category::Shoes, Gender::Men);
        product.price = price;
        product.classify();
        product
    }

    #[test]
    fn test_tier_filter() {
        let filter = TierFilter::new(PriceTier::Expensive);
        assert!(filter.matches(&priced(Some(8000.0))));
        assert!(!filter.matches(&priced(Some(7999.0))));
        assert!(!filter.matches(&priced(None)));
    }

    #[test]
    fn test_unknown_tier() {
        let filter = TierFilter::new(PriceTier::Unknown);
        assert!(filter.matches(&priced(None)));
        assert!(!filter.matches(&priced(Some(10.0))));
        assert_eq!(filter.description(), "Tier: unknown");
    }
}
