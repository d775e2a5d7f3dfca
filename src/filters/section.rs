//! Category and gender filters.

use super::Filter;
use crate::site::catalog::{Category, Gender};
use crate::site::models::Product;

/// Keeps products from one category.
pub struct CategoryFilter {
    category: Category,
}

impl CategoryFilter {
    pub fn new(category: Category) -> Self {
        Self { category }
    }
}

impl Filter for CategoryFilter {
    fn matches(&self, product: &Product) -> bool {
        product.category == self.category
    }

    fn description(&self) -> String {
        format!("Category: {}", self.category)
    }
}

/// Keeps products from one gender section.
pub struct GenderFilter {
    gender: Gender,
}

impl GenderFilter {
    pub fn new(gender: Gender) -> Self {
        Self { gender }
    }
}

impl Filter for GenderFilter {
    fn matches(&self, product: &Product) -> bool {
        product.gender == self.gender
    }

    fn description(&self) -> String {
        format!("Gender: {}", self.gender)
    }
}
