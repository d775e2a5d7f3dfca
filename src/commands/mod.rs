//! CLI command implementations.

pub mod embed;
pub mod images;
pub mod scrape;
pub mod similar;

pub use embed::EmbedCommand;
pub use images::ImagesCommand;
pub use scrape::ScrapeCommand;
pub use similar::{SimilarCommand, SimilarQuery};
