//! Output formatting for command reports (table, JSON, markdown).

use crate::commands::embed::EmbedReport;
use crate::commands::images::ImageInventory;
use crate::commands::scrape::ScrapeReport;
use crate::commands::similar::SimilarReport;
use crate::config::OutputFormat;
use crate::site::catalog::Section;
use serde::Serialize;

/// Formats command reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the summary of a scrape run.
    pub fn format_scrape_report(&self, report: &ScrapeReport) -> String {
        match self.format {
            OutputFormat::Json => Self::json(report),
            OutputFormat::Table => self.table_scrape(report),
            OutputFormat::Markdown => self.markdown_scrape(report),
        }
    }

    /// Formats the section catalog.
    pub fn format_sections(&self, sections: &[Section]) -> String {
        match self.format {
            OutputFormat::Json => Self::json(sections),
            OutputFormat::Table => self.table_sections(sections),
            OutputFormat::Markdown => self.markdown_sections(sections),
        }
    }

    /// Formats ranked similarity matches.
    pub fn format_similar(&self, report: &SimilarReport) -> String {
        match self.format {
            OutputFormat::Json => Self::json(report),
            OutputFormat::Table => self.table_similar(report),
            OutputFormat::Markdown => self.markdown_similar(report),
        }
    }

    /// Formats the result of an embedding pass.
    pub fn format_embed_report(&self, report: &EmbedReport) -> String {
        match self.format {
            OutputFormat::Json => Self::json(report),
            OutputFormat::Table => self.table_embed(report),
            OutputFormat::Markdown => self.markdown_embed(report),
        }
    }

    /// Formats an image inventory.
    pub fn format_inventory(&self, inventory: &ImageInventory) -> String {
        match self.format {
            OutputFormat::Json => Self::json(inventory),
            OutputFormat::Table => self.table_inventory(inventory),
            OutputFormat::Markdown => self.markdown_inventory(inventory),
        }
    }

    // JSON formatting

    fn json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_scrape(&self, report: &ScrapeReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Run:       {}", report.run_dir.display()));
        lines.push(format!(
            "Sections:  {} ({} failed)",
            report.sections.len(),
            report.failed_sections()
        ));
        lines.push(format!("Products:  {}", report.total_products));
        lines.push(format!(
            "Images:    {} downloaded, {} already present, {} failed, {} without URL",
            report.images.downloaded,
            report.images.already_present,
            report.images.failed,
            report.images.no_url
        ));

        lines.push(format!("CSV:       {}", report.dataset.csv.display()));
        lines.push(format!("JSON:      {}", report.dataset.json.display()));

        if report.sections.is_empty() {
            return lines.join("\n");
        }

        lines.push(String::new());
        lines.push(format!(
            "{:<12}  {:<7}  {:>8}  {:>6}  {}",
            "Category", "Gender", "Products", "Images", "Keyword"
        ));
        lines.push(format!("{:-<12}  {:-<7}  {:->8}  {:->6}  {:-<30}", "", "", "", "", ""));

        for section in &report.sections {
            let keyword = match &section.error {
                Some(error) => format!("{} (error: {})", section.keyword, truncate(error, 60)),
                None => section.keyword.clone(),
            };

            lines.push(format!(
                "{:<12}  {:<7}  {:>8}  {:>6}  {}",
                section.category.as_str(),
                section.gender.as_str(),
                section.products,
                section.images,
                keyword
            ));
        }

        lines.join("\n")
    }

    fn table_sections(&self, sections: &[Section]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{:<12}  {:<7}  {}", "Category", "Gender", "Keyword"));
        lines.push(format!("{:-<12}  {:-<7}  {:-<30}", "", "", ""));

        for section in sections {
            lines.push(format!(
                "{:<12}  {:<7}  {}",
                section.category.as_str(),
                section.gender.as_str(),
                section.keyword
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} sections", sections.len()));

        lines.join("\n")
    }

    fn table_similar(&self, report: &SimilarReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Query:    {}", report.query));
        if !report.filters.is_empty() {
            lines.push(format!("Filters:  {}", report.filters.join(", ")));
        }

        if report.matches.is_empty() {
            lines.push(String::new());
            lines.push("No similar products found.".to_string());
            return lines.join("\n");
        }

        let name_width = 40;

        lines.push(String::new());
        lines.push(format!(
            "{:>4}  {:>5}  {:>6}  {:>9}  {:>4}  {:<10}  {:<12}  {}",
            "Rank", "Row", "Score", "Price", "Off", "Tier", "Category", "Name"
        ));
        lines.push(format!(
            "{:->4}  {:->5}  {:->6}  {:->9}  {:->4}  {:-<10}  {:-<12}  {:-<name_width$}",
            "", "", "", "", "", "", "", ""
        ));

        for m in &report.matches {
            lines.push(format!(
                "{:>4}  {:>5}  {:>6.3}  {:>9}  {:>4}  {:<10}  {:<12}  {}",
                m.rank,
                m.row,
                m.score,
                format_price(m.product.effective_price()),
                format_discount(m.product.discount_percent()),
                m.product.price_tier.as_str(),
                m.product.category.as_str(),
                truncate(&m.product.name, name_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} of {} candidates", report.matches.len(), report.candidates));

        lines.join("\n")
    }

    fn table_embed(&self, report: &EmbedReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Dataset:   {}", report.dataset.display()));
        lines.push(format!("Rows:      {}", report.rows));
        lines.push(format!("Embedded:  {}", report.summary.embedded));
        lines.push(format!("Existing:  {}", report.summary.already_embedded));
        lines.push(format!("No image:  {}", report.summary.missing_image));
        lines.push(format!("Failed:    {}", report.summary.failed));

        if let Some(json) = &report.json {
            lines.push(format!("JSON:      {}", json.display()));
        }

        lines.join("\n")
    }

    fn table_inventory(&self, inventory: &ImageInventory) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Root: {}", inventory.root.display()));
        lines.push(String::new());

        for (ext, count) in &inventory.by_extension {
            lines.push(format!("  .{:<6} {}", ext, count));
        }

        for folder in &inventory.folders {
            lines.push(String::new());
            lines.push(format!("{}/ ({} images)", folder.path, folder.images));
            for sample in &folder.samples {
                lines.push(format!("  {}", sample));
            }
            if folder.images > folder.samples.len() {
                lines.push(format!("  ... {} more", folder.images - folder.samples.len()));
            }
        }

        lines.push(String::new());
        lines.push(format!("Total: {} images", inventory.total));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_scrape(&self, report: &ScrapeReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## Scrape {}", report.timestamp));
        lines.push(String::new());
        lines.push(format!("- **Run directory:** `{}`", report.run_dir.display()));
        lines.push(format!("- **Products:** {}", report.total_products));
        lines.push(format!(
            "- **Images:** {} downloaded, {} already present, {} failed",
            report.images.downloaded, report.images.already_present, report.images.failed
        ));
        lines.push(format!("- **CSV:** `{}`", report.dataset.csv.display()));
        lines.push(format!("- **JSON:** `{}`", report.dataset.json.display()));

        lines.push(String::new());
        lines.push("| Category | Gender | Keyword | Products | Images |".to_string());
        lines.push("|----------|--------|---------|----------|--------|".to_string());

        for section in &report.sections {
            let keyword = if section.error.is_some() {
                format!("~~{}~~", section.keyword)
            } else {
                section.keyword.clone()
            };

            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                section.category, section.gender, keyword, section.products, section.images
            ));
        }

        lines.join("\n")
    }

    fn markdown_sections(&self, sections: &[Section]) -> String {
        let mut lines = Vec::new();

        lines.push("| Category | Gender | Keyword |".to_string());
        lines.push("|----------|--------|---------|".to_string());

        for section in sections {
            lines.push(format!(
                "| {} | {} | {} |",
                section.category, section.gender, section.keyword
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} sections*", sections.len()));

        lines.join("\n")
    }

    fn markdown_similar(&self, report: &SimilarReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## Similar to {}", report.query));
        lines.push(String::new());

        if report.matches.is_empty() {
            lines.push("No similar products found.".to_string());
            return lines.join("\n");
        }

        lines.push("| # | Score | Price | Off | Tier | Name |".to_string());
        lines.push("|---|-------|-------|-----|------|------|".to_string());

        for m in &report.matches {
            let name = truncate(&m.product.name, 40);
            let name = if m.product.product_url.is_empty() {
                name
            } else {
                format!("[{}]({})", name, m.product.product_url)
            };

            lines.push(format!(
                "| {} | {:.3} | {} | {} | {} | {} |",
                m.rank,
                m.score,
                format_price(m.product.effective_price()),
                format_discount(m.product.discount_percent()),
                m.product.price_tier,
                name
            ));
        }

        lines.join("\n")
    }

    fn markdown_embed(&self, report: &EmbedReport) -> String {
        format!(
            "## Embeddings for `{}`\n\n- **Rows:** {}\n- **Embedded:** {}\n- **Existing:** {}\n- **No image:** {}\n- **Failed:** {}",
            report.dataset.display(),
            report.rows,
            report.summary.embedded,
            report.summary.already_embedded,
            report.summary.missing_image,
            report.summary.failed
        )
    }

    fn markdown_inventory(&self, inventory: &ImageInventory) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## Images in `{}`", inventory.root.display()));
        lines.push(String::new());
        lines.push("| Folder | Images | Sample |".to_string());
        lines.push("|--------|--------|--------|".to_string());

        for folder in &inventory.folders {
            lines.push(format!(
                "| {} | {} | {} |",
                folder.path,
                folder.images,
                folder.samples.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} images*", inventory.total));

        lines.join("\n")
    }
}

/// Rupee price without decimals, or "N/A".
fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("₹{:.0}", p),
        None => "N/A".to_string(),
    }
}

/// Discount as "27%", or "-" when not on sale.
fn format_discount(percent: Option<u8>) -> String {
    percent.map(|p| format!("{}%", p)).unwrap_or_else(|| "-".to_string())
}

/// Shortens to at most `max` characters, ending in "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
