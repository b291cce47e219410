//! Filter options offered alongside results: models, colours, sizes,
//! materials, brands and per-category specifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ai::ProductInsight;
use crate::candidate::PriceCandidate;
use crate::locale::{find_word, LocaleError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableFilters {
    pub models: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub materials: Vec<String>,
    pub brands: Vec<String>,
    pub specifications: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug, Clone)]
struct CategoryFilters {
    key: String,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    specifications: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct FilterFile {
    palette: Vec<String>,
    categories: Vec<CategoryFilters>,
}

/// Per-category filter tables.
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    palette: Vec<String>,
    /// In match order.
    categories: Vec<CategoryFilters>,
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

impl FilterCatalog {
    pub fn parse(yaml_content: &str) -> Result<Self, LocaleError> {
        let mut file: FilterFile = serde_yml::from_str(yaml_content)?;
        for category in file.categories.iter_mut() {
            category.key = category.key.to_lowercase();
        }
        for (i, category) in file.categories.iter().enumerate() {
            if file.categories[..i].iter().any(|c| c.key == category.key) {
                return Err(LocaleError::Duplicate(category.key.clone()));
            }
        }
        Ok(Self {
            palette: file.palette,
            categories: file.categories,
        })
    }

    pub fn load() -> Result<Self, LocaleError> {
        Self::parse(include_str!("../../seed_data/filters.yml"))
    }

    fn category_for(&self, query: &str, category: &str) -> Option<&CategoryFilters> {
        let haystack = format!("{} {}", query, category).to_lowercase();
        self.categories.iter().find(|c| haystack.contains(&c.key))
    }

    /// Builds the filter options for a search. Category tables supply sizes,
    /// materials and specifications; models and brands come from the product
    /// insight; colours named in result titles are added to the table's.
    pub fn available_filters(&self, query: &str, insight: &ProductInsight, results: &[PriceCandidate]) -> AvailableFilters {
        let mut filters = AvailableFilters::default();
        if let Some(table) = self.category_for(query, &insight.category) {
            filters.colors = table.colors.clone();
            filters.sizes = table.sizes.clone();
            filters.materials = table.materials.clone();
            filters.specifications = table.specifications.clone();
        }
        for model in &insight.products {
            push_unique(&mut filters.models, model);
        }
        for brand in &insight.brands {
            push_unique(&mut filters.brands, brand);
        }
        for result in results {
            let name = result.name.to_lowercase();
            for color in &self.palette {
                if find_word(&name, &color.to_lowercase()).is_some() {
                    push_unique(&mut filters.colors, color);
                }
            }
        }
        filters
    }
}
