//! Composable filters that narrow the candidate set for similarity queries.

pub mod price;
pub mod section;
pub mod tier;

use crate::site::catalog::{Category, Gender};
use crate::site::models::{PriceTier, Product};

pub use price::PriceFilter;
pub use section::{CategoryFilter, GenderFilter};
pub use tier::TierFilter;

/// A single predicate over dataset rows.
pub trait Filter: Send + Sync {
    /// Whether the row stays in the candidate set.
    fn matches(&self, product: &Product) -> bool;

    /// Short label shown in similarity reports.
    fn description(&self) -> String;
}

/// Conjunction of filters; an empty chain keeps every row.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.filters.iter().all(|f| f.matches(product))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Labels in the order the filters were added.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a chain from the optional `similar` flags, skipping unset ones.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Restricts to one category.
    pub fn category(mut self, category: Option<Category>) -> Self {
        if let Some(category) = category {
            self.chain.add(CategoryFilter::new(category));
        }
        self
    }

    /// Restricts to one gender.
    pub fn gender(mut self, gender: Option<Gender>) -> Self {
        if let Some(gender) = gender {
            self.chain.add(GenderFilter::new(gender));
        }
        self
    }

    /// Restricts to one price tier.
    pub fn tier(mut self, tier: Option<PriceTier>) -> Self {
        if let Some(tier) = tier {
            self.chain.add(TierFilter::new(tier));
        }
        self
    }

    /// Restricts the effective price to `[min, max]`; no-op if both are unset.
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_some() || max.is_some() {
            self.chain.add(PriceFilter::new(min, max));
        }
        self
    }

    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
