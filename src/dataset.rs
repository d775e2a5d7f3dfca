//! Dataset persistence: one CSV and one JSON file per run.

use crate::site::catalog::{Category, Gender};
use crate::site::models::{PriceTier, Product, EMBEDDING_DIM};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fixed leading columns of every dataset CSV.
pub const COLUMNS: [&str; 10] = [
    "name",
    "brand",
    "price",
    "discounted_price",
    "category",
    "gender",
    "product_url",
    "image_url",
    "price_tier",
    "image_path",
];

/// Timestamp used in run directory and file names, e.g. `20250101_120000`.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Directory holding one run's dataset and images.
pub fn run_dir(output_dir: &Path, prefix: &str, timestamp: &str) -> PathBuf {
    output_dir.join(format!("{}_scrape_{}", prefix, timestamp))
}

/// Paths of a written dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Writes the product table of a run.
pub struct DatasetWriter {
    dir: PathBuf,
    prefix: String,
}

impl DatasetWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into() }
    }

    /// Writes `<prefix>_products_<timestamp>.csv` and `.json`.
    pub fn write(&self, products: &[Product], timestamp: &str) -> Result<DatasetPaths> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let stem = format!("{}_products_{}", self.prefix, timestamp);
        let paths = DatasetPaths {
            csv: self.dir.join(format!("{}.csv", stem)),
            json: self.dir.join(format!("{}.json", stem)),
        };

        write_csv(&paths.csv, products)?;
        write_json(&paths.json, products)?;

        info!("Saved {} products to {}", products.len(), paths.csv.display());

        Ok(paths)
    }
}

/// Writes products as CSV. Embedding columns `emb_0..emb_511` are added only
/// when at least one product has an embedding.
pub fn write_csv(path: &Path, products: &[Product]) -> Result<()> {
    let with_embeddings = products.iter().any(|p| p.embedding.is_some());

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    if with_embeddings {
        header.extend((0..EMBEDDING_DIM).map(|i| format!("emb_{}", i)));
    }
    writer.write_record(&header)?;

    for product in products {
        let mut record = vec![
            product.name.clone(),
            product.brand.clone(),
            format_number(product.price),
            format_number(product.discounted_price),
            product.category.to_string(),
            product.gender.to_string(),
            product.product_url.clone(),
            product.image_url.clone(),
            product.price_tier.to_string(),
            product.image_path.clone(),
        ];

        if with_embeddings {
            match &product.embedding {
                Some(embedding) => record.extend(embedding.iter().map(|v| v.to_string())),
                None => record.extend(std::iter::repeat_n(String::new(), EMBEDDING_DIM)),
            }
        }

        writer.write_record(&record)?;
    }

    writer.flush()?;
    debug!("Wrote {} rows to {}", products.len(), path.display());

    Ok(())
}

/// Writes products as a pretty-printed JSON array.
pub fn write_json(path: &Path, products: &[Product]) -> Result<()> {
    let json = serde_json::to_string_pretty(products)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Reads a dataset CSV written by [`write_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<Product>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

    for column in ["name", "category", "gender"] {
        if !index.contains_key(column) {
            bail!("Dataset {} is missing column '{}'", path.display(), column);
        }
    }

    let embedding_columns: Vec<usize> = (0..EMBEDDING_DIM)
        .map_while(|i| index.get(format!("emb_{}", i).as_str()).copied())
        .collect();

    let mut products = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |name: &str| {
            index.get(name).and_then(|&i| record.get(i)).unwrap_or_default().to_string()
        };

        let category: Category = field("category")
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Row {}: {}", row + 1, e))?;
        let gender: Gender = field("gender")
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Row {}: {}", row + 1, e))?;

        let mut product = Product::new(category, gender);
        product.name = field("name");
        product.brand = field("brand");
        product.price = parse_number(&field("price"));
        product.discounted_price = parse_number(&field("discounted_price"));
        product.product_url = field("product_url");
        product.image_url = field("image_url");
        product.image_path = field("image_path");
        product.price_tier = field("price_tier").parse().unwrap_or(PriceTier::Unknown);

        if embedding_columns.len() == EMBEDDING_DIM {
            product.embedding = parse_embedding(&record, &embedding_columns);
        }

        products.push(product);
    }

    debug!("Read {} products from {}", products.len(), path.display());

    Ok(products)
}

/// Returns `None` unless every embedding cell holds a number.
fn parse_embedding(record: &csv::StringRecord, columns: &[usize]) -> Option<Vec<f32>> {
    columns
        .iter()
        .map(|&i| record.get(i).and_then(|v| v.trim().parse::<f32>().ok()))
        .collect()
}

fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(name: &str, price: Option<f64>, discounted: Option<f64>) -> Product {
        let mut product = Product::new(Category::Shoes, Gender::Women);
        product.name = name.to_string();
        product.brand = name.split_whitespace().next().unwrap_or_default().to_string();
        product.price = price;
        product.discounted_price = discounted;
        product.product_url = format!("https://culture-circle.com/products/{}", name.len());
        product.image_url = "https://cdn.example/img.jpg".to_string();
        product.classify();
        product
    }

    #[test]
    fn test_run_paths() {
        let dir = run_dir(Path::new("out"), "culturecircle", "20250101_120000");
        assert_eq!(dir, Path::new("out/culturecircle_scrape_20250101_120000"));

        let ts = run_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut products = vec![
            make_product("Nike Air Max", Some(12999.0), Some(7499.0)),
            make_product("Crocs Classic Clog", Some(2999.5), None),
            make_product("Sans Prix", None, None),
        ];
        products[0].image_path = "images/Shoes/Women/nike-air-max-nike.jpg".to_string();
        products[1].name = "Crocs \"Classic\", Clog".to_string();

        let writer = DatasetWriter::new(dir.path(), "culturecircle");
        let paths = writer.write(&products, "20250101_120000").unwrap();

        assert_eq!(paths.csv, dir.path().join("culturecircle_products_20250101_120000.csv"));
        assert_eq!(paths.json, dir.path().join("culturecircle_products_20250101_120000.json"));

        let csv_text = std::fs::read_to_string(&paths.csv).unwrap();
        assert_eq!(csv_text.lines().count(), 4);
        assert!(csv_text.starts_with(
            "name,brand,price,discounted_price,category,gender,product_url,image_url,price_tier,image_path"
        ));
        assert!(!csv_text.contains("emb_0"));

        let from_csv = read_csv(&paths.csv).unwrap();
        assert_eq!(from_csv, products);

        let from_json: Vec<Product> =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(from_json, products);
    }

    #[test]
    fn test_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        let products = vec![make_product("Onitsuka Mexico 66 – Kill Bill", Some(9999.0), None)];

        let paths = DatasetWriter::new(dir.path(), "cc").write(&products, "ts").unwrap();
        let text = std::fs::read_to_string(&paths.json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        let obj = &value[0];
        assert_eq!(obj["category"], "Shoes");
        assert_eq!(obj["gender"], "Women");
        assert_eq!(obj["price_tier"], "expensive");
        assert_eq!(obj["discounted_price"], serde_json::Value::Null);
        assert!(obj.get("embedding").is_none());
        assert!(text.contains("–"));
    }

    #[test]
    fn test_embedding_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with_emb.csv");

        let mut embedded = make_product("Adidas Samba", Some(8999.0), None);
        embedded.embedding = Some((0..EMBEDDING_DIM).map(|i| i as f32 / 1000.0).collect());
        let plain = make_product("Puma Speedcat", Some(6999.0), None);

        write_csv(&path, &[embedded.clone(), plain.clone()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header.split(',').count(), COLUMNS.len() + EMBEDDING_DIM);
        assert!(header.ends_with("emb_511"));

        let products = read_csv(&path).unwrap();
        assert_eq!(products[0].embedding, embedded.embedding);
        assert!(products[1].embedding.is_none());
    }

    #[test]
    fn test_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DatasetWriter::new(dir.path().join("nested"), "cc").write(&[], "ts").unwrap();

        assert!(read_csv(&paths.csv).unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&paths.json).unwrap(), "[]");
    }

    #[test]
    fn test_read_rejects_unknown_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "name,category,gender\nX,Hats,Men\n").unwrap();

        let err = read_csv(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown category"));
    }

    #[test]
    fn test_read_rejects_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "title,price\nX,1\n").unwrap();

        assert!(read_csv(&path).is_err());
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_csv(Path::new("/nonexistent/data.csv")).is_err());
    }
}
