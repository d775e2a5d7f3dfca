//! Culture Circle modules for browser sessions, parsing, and data models.

pub mod browser;
pub mod catalog;
pub mod models;
pub mod parser;
pub mod selectors;

pub use browser::{Browser, BrowserSession, ListingSource};
pub use catalog::{Category, Gender, Section, SectionSelection};
pub use models::{Listing, PriceTier, Product};
pub use parser::Parser;
