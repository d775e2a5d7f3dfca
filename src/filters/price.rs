//! Price range filter.

use super::Filter;
use crate::site::models::Product;

/// Filters products by the price actually charged (discounted if on sale).
pub struct PriceFilter {
    min: Option<f64>,
    max: Option<f64>,
}

impl PriceFilter {
    /// Creates a new price filter with optional min/max bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

impl Filter for PriceFilter {
    fn matches(&self, product: &Product) -> bool {
        // Products without price pass the filter (don't exclude them)
        let Some(price) = product.effective_price() else {
            return true;
        };

        if self.min.is_some_and(|min| price < min) {
            return false;
        }

        !self.max.is_some_and(|max| price > max)
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Price: ₹{:.0} - ₹{:.0}", min, max),
            (Some(min), None) => format!("Price: >= ₹{:.0}", min),
            (None, Some(max)) => format!("Price: <= ₹{:.0}", max),
            (None, None) => "Price: any".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::catalog::{Category, Gender};

    fn make_product(price: Option<f64>, discounted: Option<f64>) -> Product {
        let mut product = Product::new(Category::Shoes, Gender::Men);
        product.price = price;
        product.discounted_price = discounted;
        product
    }

    #[test]
    fn test_price_filter_range() {
        let filter = PriceFilter::new(Some(2000.0), Some(5000.0));

        assert!(filter.matches(&make_product(Some(3000.0), None)));
        assert!(filter.matches(&make_product(Some(2000.0), None)));
        assert!(filter.matches(&make_product(Some(5000.0), None)));
        assert!(!filter.matches(&make_product(Some(1999.0), None)));
        assert!(!filter.matches(&make_product(Some(5001.0), None)));
    }

    #[test]
    fn test_price_filter_uses_discounted_price() {
        let filter = PriceFilter::new(None, Some(5000.0));
        assert!(filter.matches(&make_product(Some(9000.0), Some(4500.0))));
        assert!(!filter.matches(&make_product(Some(9000.0), None)));
    }

    #[test]
    fn test_price_filter_no_price_passes() {
        let filter = PriceFilter::new(Some(100.0), None);
        assert!(filter.matches(&make_product(None, None)));
    }

    #[test]
    fn test_price_filter_description() {
        assert_eq!(PriceFilter::new(Some(10.0), Some(50.0)).description(), "Price: ₹10 - ₹50");
        assert_eq!(PriceFilter::new(Some(10.0), None).description(), "Price: >= ₹10");
        assert_eq!(PriceFilter::new(None, Some(50.0)).description(), "Price: <= ₹50");
        assert_eq!(PriceFilter::new(None, None).description(), "Price: any");
    }
}
