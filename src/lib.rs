//! culture-scraper - Culture Circle fashion catalog scraper
//!
//! Drives a real browser through the catalog's category/gender keyword
//! sections, saves product images, writes CSV/JSON datasets and ranks
//! products by CLIP image similarity.

pub mod commands;
pub mod config;
pub mod dataset;
pub mod download;
pub mod embedding;
pub mod filters;
pub mod format;
pub mod logging;
pub mod similarity;
pub mod site;

pub use config::Config;
pub use site::catalog::{Category, Gender};
pub use site::models::{PriceTier, Product};
