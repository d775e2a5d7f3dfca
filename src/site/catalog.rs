//! Culture Circle catalog sections: categories, genders and search keywords.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product category, used as the top-level image folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Shoes,
    Bags,
    Accessories,
    Clothing,
}

impl Category {
    /// Returns all categories in catalog order.
    pub fn all() -> &'static [Category] {
        &[Category::Shoes, Category::Bags, Category::Accessories, Category::Clothing]
    }

    /// Returns the display/folder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Shoes => "Shoes",
            Category::Bags => "Bags",
            Category::Accessories => "Accessories",
            Category::Clothing => "Clothing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shoes" => Ok(Category::Shoes),
            "bags" => Ok(Category::Bags),
            "accessories" => Ok(Category::Accessories),
            "clothing" => Ok(Category::Clothing),
            _ => Err(format!(
                "Unknown category: {}. Use: shoes, bags, accessories, clothing",
                s
            )),
        }
    }
}

/// Target gender of a catalog section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Women,
    Men,
    Unisex,
}

impl Gender {
    /// Returns all genders in catalog order.
    pub fn all() -> &'static [Gender] {
        &[Gender::Women, Gender::Men, Gender::Unisex]
    }

    /// Returns the display/folder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Women => "Women",
            Gender::Men => "Men",
            Gender::Unisex => "Unisex",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "women" | "woman" | "w" => Ok(Gender::Women),
            "men" | "man" | "m" => Ok(Gender::Men),
            "unisex" | "u" => Ok(Gender::Unisex),
            _ => Err(format!("Unknown gender: {}. Use: women, men, unisex", s)),
        }
    }
}

/// One search to run: a keyword under a category/gender pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    pub category: Category,
    pub gender: Gender,
    /// Search keyword with `+` between words, as the site expects.
    pub keyword: &'static str,
}

/// Search keywords per category and gender.
///
/// Keep this table in sync with the site's catalog; it drives every run.
pub fn keywords(category: Category, gender: Gender) -> &'static [&'static str] {
    use Category::*;
    use Gender::*;

    match (category, gender) {
        (Shoes, Women) => &[
            "women+high+heels+designer",
            "women+sneakers+athletic",
            "women+boots+ankle",
            "women+sandals+summer",
            "women+loafers+formal",
            "women+wedges+casual",
            "women+flats+ballet",
            "women+platform+shoes",
            "women+espadrilles",
            "women+athletic+running",
            "women+hiking+boots",
            "women+rain+boots",
            "women+dress+shoes",
            "women+work+shoes",
            "women+dance+shoes",
            "women+wide+width+shoes",
            "women+orthopedic+shoes",
            "women+skate+shoes",
        ],
        (Shoes, Men) => &[
            "men+sneakers+casual",
            "men+dress+shoes+formal",
            "men+boots+work",
            "men+sandals+slide",
            "men+loafers+driving",
            "men+oxfords",
            "men+derby+shoes",
            "men+trainers+gym",
            "men+hiking+shoes",
            "men+running+shoes",
            "men+boat+shoes",
            "men+chukka+boots",
            "men+chelsea+boots",
            "men+work+boots",
            "men+climbing+shoes",
            "men+wide+width+shoes",
            "men+orthopedic+shoes",
            "men+skate+shoes",
        ],
        (Shoes, Unisex) => &[
            "unisex+sneakers",
            "unisex+slip+on",
            "unisex+canvas+shoes",
            "unisex+water+shoes",
            "unisex+skateboarding",
            "unisex+minimalist+shoes",
            "unisex+barefoot+shoes",
        ],
        (Bags, Women) => &[
            "women+designer+handbags",
            "women+tote+bags+leather",
            "women+clutch+evening",
            "women+shoulder+bags",
            "women+backpack+travel",
            "women+crossbody+sling",
            "women+satchel+work",
            "women+belt+bags",
            "women+beach+bags",
            "women+laptop+backpacks",
            "women+minaudiere",
            "women+top+handle",
            "women+drawstring+bags",
            "women+evening+clutches",
            "women+quilted+bags",
        ],
        (Bags, Men) => &[
            "men+leather+messenger",
            "men+backpack+laptop",
            "men+briefcase+professional",
            "men+duffle+travel",
            "men+sling+bag",
            "men+gym+duffel",
            "men+shoulder+bag",
            "men+waist+pack",
            "men+tote+bag",
            "men+garment+bag",
            "men+tech+backpack",
            "men+travel+backpack",
            "men+camera+bag",
            "men+cycling+backpack",
            "men+fishing+vest",
        ],
        (Bags, Unisex) => &[
            "luggage+sets",
            "carry+on+luggage",
            "checked+luggage",
            "travel+backpacks",
            "duffel+bags+large",
            "laptop+backpacks+waterproof",
            "gym+duffels",
            "cooler+bags",
            "picnic+baskets",
            "compression+sacks",
            "dry+bags",
            "camera+backpacks",
            "hydration+packs",
            "tactical+backpacks",
            "rolling+backpacks",
        ],
        (Accessories, Women) => &[
            "women+designer+sunglasses",
            "women+belts+leather",
            "women+scarves+silk",
            "women+statement+necklace",
            "women+designer+watches",
            "women+designer+wallets",
            "women+hair+accessories",
            "women+jewelry+sets",
            "women+brooches",
            "women+gloves",
            "women+hats+fashion",
            "women+stockings",
            "women+ties+scarves",
            "women+keychains",
            "women+tech+accessories",
        ],
        (Accessories, Men) => &[
            "men+aviator+sunglasses",
            "men+leather+belts",
            "men+automatic+watches",
            "men+bifold+wallets",
            "men+designer+ties",
            "men+cufflinks+set",
            "men+pocket+squares",
            "men+hats+caps",
            "men+gloves+leather",
            "men+socks+dress",
            "men+tech+accessories",
            "men+keychains",
            "men+bracelets",
            "men+suspenders",
            "men+arm+sleeves",
        ],
        (Accessories, Unisex) => &[
            "luxury+sunglasses",
            "designer+eyeglasses",
            "fitness+trackers",
            "smart+watches",
            "phone+cases+premium",
            "laptop+sleeves",
            "umbrellas+windproof",
            "travel+pillows",
            "blankets+throws",
            "gadget+accessories",
            "cables+organizers",
            "chargers+premium",
            "power+banks+fast",
            "headphones+wireless",
            "earbuds+premium",
        ],
        (Clothing, Women) => &[
            "women+designer+dresses",
            "women+jackets+designer",
            "women+blouses+silk",
            "women+designer+jeans",
            "women+skirts+pleated",
            "women+sweaters+cashmere",
            "women+suits+pantsuits",
            "women+activewear+sets",
            "women+swimwear+designer",
            "women+lingerie+luxury",
            "women+coats+wool",
            "women+cardigans",
            "women+pajamas+silk",
            "women+shapewear",
            "women+maternity+dresses",
        ],
        (Clothing, Men) => &[
            "men+designer+shirts",
            "men+jackets+bomber",
            "men+jeans+designer",
            "men+designer+t-shirts",
            "men+suits+designer",
            "men+sweaters+merino",
            "men+activewear+sets",
            "men+swim+trunks",
            "men+underwear+premium",
            "men+coats+overcoats",
            "men+vests+sleeveless",
            "men+pajamas",
            "men+robes",
            "men+base+layers",
            "men+formal+waistcoats",
        ],
        (Clothing, Unisex) => &[
            "luxury+hoodies",
            "premium+sweatshirts",
            "designer+track+pants",
            "cashmere+robes",
            "silk+pajamas",
            "thermal+underwear",
            "rain+jackets",
            "down+jackets",
            "fleece+jackets",
            "performance+tees",
            "yoga+pants",
            "compression+wear",
            "sun+protective+clothing",
            "sports+bras",
            "cycling+shorts",
        ],
    }
}

/// Narrows which sections a run visits.
#[derive(Debug, Clone, Default)]
pub struct SectionSelection {
    /// Only visit this category.
    pub category: Option<Category>,
    /// Only visit this gender.
    pub gender: Option<Gender>,
    /// Cap on keywords per category/gender pair.
    pub max_keywords: Option<usize>,
}

impl SectionSelection {
    /// Selection that visits the whole catalog.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns the sections this selection visits, in catalog order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        for &category in Category::all() {
            if self.category.is_some_and(|c| c != category) {
                continue;
            }

            for &gender in Gender::all() {
                if self.gender.is_some_and(|g| g != gender) {
                    continue;
                }

                let words = keywords(category, gender);
                let take = self.max_keywords.unwrap_or(words.len());

                sections.extend(
                    words.iter().take(take).map(|&keyword| Section { category, gender, keyword }),
                );
            }
        }

        sections
    }
}

/// Returns every section of the catalog.
pub fn sections() -> Vec<Section> {
    SectionSelection::all().sections()
}

/// Builds the search URL for a `+`-separated keyword.
pub fn search_url(base_url: &str, keyword: &str) -> String {
    let query = keyword
        .split('+')
        .filter(|term| !term.is_empty())
        .map(|term| urlencoding::encode(term).into_owned())
        .collect::<Vec<_>>()
        .join("+");

    format!("{}/search?q={}", base_url.trim_end_matches('/'), query)
}
