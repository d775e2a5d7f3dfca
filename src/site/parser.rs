//! HTML parser for Culture Circle listing pages.

use crate::site::catalog::{Category, Gender};
use crate::site::models::{Listing, Product};
use crate::site::selectors;
use anyhow::Result;
use scraper::{ElementRef, Html};
use tracing::{debug, trace};

/// Parser for rendered listing HTML.
pub struct Parser {
    base_url: String,
}

impl Parser {
    /// Creates a parser that resolves relative links against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Parses every product card on a listing page.
    pub fn parse_listing(
        &self,
        html: &str,
        keyword: &str,
        category: Category,
        gender: Gender,
    ) -> Result<Listing> {
        let document = Html::parse_document(html);
        let mut listing = Listing::new(keyword, category, gender);

        for element in document.select(&selectors::CARD_SELECTOR) {
            match self.parse_card(element, category, gender) {
                Some(product) => {
                    trace!("Parsed product: {} ({:?})", product.name, product.effective_price());
                    listing.products.push(product);
                }
                None => trace!("Skipping empty card"),
            }
        }

        debug!("Parsed {} products for '{}'", listing.count(), keyword);

        Ok(listing)
    }

    /// Parses a single product card. Returns `None` for placeholder cards
    /// with neither a link nor an image.
    fn parse_card(&self, element: ElementRef, category: Category, gender: Gender) -> Option<Product> {
        let mut product = Product::new(category, gender);

        let href = element.value().attr("href").unwrap_or_default().trim();
        product.product_url = self.absolute_url(href);

        if let Some(img) = element.select(&selectors::IMAGE).next() {
            product.image_url = img.value().attr("src").unwrap_or_default().trim().to_string();
            product.name = clean_text(img.value().attr("alt").unwrap_or_default());
            product.brand = product.name.split_whitespace().next().unwrap_or_default().to_string();
        }

        if product.product_url.is_empty() && product.image_url.is_empty() {
            return None;
        }

        for span in element.select(&selectors::PRICE_SPANS) {
            let text = span.text().collect::<String>();
            if text.trim().is_empty() {
                continue;
            }

            let value = extract_price(&text);
            let class = span.value().attr("class").unwrap_or_default();

            if class.contains(selectors::STRIKE_CLASS) {
                product.price = value;
            } else {
                product.discounted_price = value;
            }
        }

        if product.price.is_none() {
            product.price = product.discounted_price;
        }

        product.classify();

        Some(product)
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            href.to_string()
        }
    }
}

/// Trims and collapses runs of whitespace to a single space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts a numeric price from text like "₹12,999".
pub fn extract_price(text: &str) -> Option<f64> {
    let cleaned: String =
        text.replace(',', "").chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    // "Rs. 1299" leaves a stray leading dot
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::models::PriceTier;

    const BASE: &str = "https://culture-circle.com";

    fn card(href: &str, src: &str, alt: &str, prices: &str) -> String {
        format!(
            r#"<a class="flex flex-col gap-3 w-full" href="{}">
                <img src="{}" alt="{}">
                <div class="flex items-baseline gap-1">{}</div>
            </a>"#,
            href, src, alt, prices
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><div class=\"grid\">{}</div></body></html>", cards.join("\n"))
    }

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price("₹12,999"), Some(12999.0));
        assert_eq!(extract_price("12999.50"), Some(12999.5));
        assert_eq!(extract_price("Rs. 1,299"), Some(1299.0));
        assert_eq!(extract_price("  ₹ 450 "), Some(450.0));
        assert_eq!(extract_price(""), None);
        assert_eq!(extract_price("Sold out"), None);
        assert_eq!(extract_price("1.2.3"), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Nike   Dunk\n Low  "), "Nike Dunk Low");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_parse_discounted_card() {
        let html = page(&[card(
            "/products/nike-dunk-low",
            "https://cdn.culture-circle.com/dunk.jpg",
            "Nike  Dunk Low Panda",
            r#"<span class="text-sm line-through">₹12,999</span><span class="font-bold">₹7,499</span>"#,
        )]);

        let parser = Parser::new(BASE);
        let listing =
            parser.parse_listing(&html, "men+sneakers+casual", Category::Shoes, Gender::Men).unwrap();

        assert_eq!(listing.count(), 1);
        let product = &listing.products[0];
        assert_eq!(product.name, "Nike Dunk Low Panda");
        assert_eq!(product.brand, "Nike");
        assert_eq!(product.product_url, "https://culture-circle.com/products/nike-dunk-low");
        assert_eq!(product.image_url, "https://cdn.culture-circle.com/dunk.jpg");
        assert_eq!(product.price, Some(12999.0));
        assert_eq!(product.discounted_price, Some(7499.0));
        assert_eq!(product.price_tier, PriceTier::Mid);
        assert_eq!(product.category, Category::Shoes);
        assert_eq!(product.gender, Gender::Men);
        assert!(product.image_path.is_empty());
    }

    #[test]
    fn test_single_price_falls_back() {
        let html = page(&[card(
            "https://culture-circle.com/products/bag",
            "bag.jpg",
            "Coach Tabby Bag",
            r#"<span>₹2,500</span>"#,
        )]);

        let listing = Parser::new(BASE)
            .parse_listing(&html, "women+shoulder+bags", Category::Bags, Gender::Women)
            .unwrap();

        let product = &listing.products[0];
        assert_eq!(product.product_url, "https://culture-circle.com/products/bag");
        assert_eq!(product.price, Some(2500.0));
        assert_eq!(product.discounted_price, Some(2500.0));
        assert_eq!(product.price_tier, PriceTier::Affordable);
    }

    #[test]
    fn test_card_without_price() {
        let html = page(&[card("/products/x", "x.jpg", "Mystery Item", "")]);

        let listing =
            Parser::new(BASE).parse_listing(&html, "k", Category::Clothing, Gender::Unisex).unwrap();

        let product = &listing.products[0];
        assert!(product.price.is_none());
        assert!(product.discounted_price.is_none());
        assert_eq!(product.price_tier, PriceTier::Unknown);
    }

    #[test]
    fn test_card_without_image() {
        let html = r#"<a class="flex flex-col gap-3 w-full" href="/products/y">
            <div class="flex items-baseline gap-1"><span>₹9,000</span></div></a>"#;

        let listing =
            Parser::new(BASE).parse_listing(html, "k", Category::Bags, Gender::Men).unwrap();

        let product = &listing.products[0];
        assert!(product.name.is_empty());
        assert!(product.brand.is_empty());
        assert!(product.image_url.is_empty());
        assert_eq!(product.price_tier, PriceTier::Expensive);
    }

    #[test]
    fn test_placeholder_cards_skipped() {
        let html = page(&[
            r#"<a class="flex flex-col gap-3 w-full"><div>loading</div></a>"#.to_string(),
            card("/products/a", "a.jpg", "Adidas Samba", "<span>₹7,999</span>"),
        ]);

        let listing =
            Parser::new(BASE).parse_listing(&html, "k", Category::Shoes, Gender::Unisex).unwrap();

        assert_eq!(listing.count(), 1);
        assert_eq!(listing.products[0].brand, "Adidas");
    }

    #[test]
    fn test_empty_page() {
        let listing = Parser::new(BASE)
            .parse_listing("<html><body>No results</body></html>", "k", Category::Shoes, Gender::Men)
            .unwrap();
        assert!(listing.is_empty());
        assert_eq!(listing.keyword, "k");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let parser = Parser::new("http://localhost:9000/");
        assert_eq!(parser.absolute_url("/products/a"), "http://localhost:9000/products/a");
        assert_eq!(parser.absolute_url(""), "");
    }
}
