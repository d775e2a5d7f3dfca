//! CSS selectors for Culture Circle listing pages.
//!
//! The site is a Tailwind app, so cards are matched by utility classes.
//! Update this file when the markup changes.

use scraper::Selector;
use std::sync::LazyLock;

/// Product card anchor on search listings.
pub const CARD: &str = "a.flex.flex-col.gap-3.w-full";

/// Product card anchor, parsed.
pub static CARD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse(CARD).unwrap());

/// Card image; `src` is the image URL and `alt` the product name.
pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

/// Price spans. The struck-through one is the original price.
pub static PRICE_SPANS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.flex.items-baseline.gap-1 span").unwrap());

/// Class marking the original (pre-discount) price.
pub const STRIKE_CLASS: &str = "line-through";

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*CARD_SELECTOR;
        let _ = &*IMAGE;
        let _ = &*PRICE_SPANS;
    }

    #[test]
    fn test_card_matching() {
        let html = Html::parse_document(
            r#"<div>
                <a class="flex flex-col gap-3 w-full" href="/p/1"><img src="a.jpg" alt="A"></a>
                <a class="flex flex-col w-full" href="/p/2">not a card</a>
            </div>"#,
        );

        let cards: Vec<_> = html.select(&CARD_SELECTOR).collect();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].value().attr("href"), Some("/p/1"));
    }
}
