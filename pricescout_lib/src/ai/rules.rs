//! Keyword-table product detection used when no LLM is configured or the
//! LLM call fails.

use super::types::ProductInsight;

struct CategoryRule {
    key: &'static str,
    products: &'static [&'static str],
    brands: &'static [&'static str],
    price_range: (f64, f64),
}

/// Checked in order, so "headphone" must precede "phone".
const RULES: &[CategoryRule] = &[
    CategoryRule {
        key: "laptop",
        products: &["Gaming Laptop 15.6\"", "Business Ultrabook 14\"", "Student Laptop 13\"", "2-in-1 Convertible"],
        brands: &["Dell", "HP", "Lenovo", "ASUS", "Acer"],
        price_range: (25_000.0, 150_000.0),
    },
    CategoryRule {
        key: "headphone",
        products: &["Wireless ANC", "Gaming Headset", "True Wireless Earbuds", "Sports Earphones"],
        brands: &["Sony", "Bose", "JBL", "Sennheiser", "Apple"],
        price_range: (2_000.0, 40_000.0),
    },
    CategoryRule {
        key: "phone",
        products: &["Pro Max 256GB", "Standard 128GB", "Lite 64GB", "Plus 256GB"],
        brands: &["Apple", "Samsung", "OnePlus", "Xiaomi", "Google"],
        price_range: (10_000.0, 150_000.0),
    },
    CategoryRule {
        key: "tv",
        products: &["55-inch 4K LED", "65-inch OLED", "43-inch Smart TV", "50-inch Android TV"],
        brands: &["Samsung", "LG", "Sony", "TCL", "Mi"],
        price_range: (20_000.0, 300_000.0),
    },
    CategoryRule {
        key: "shoe",
        products: &["Running Shoes", "Casual Sneakers", "Training Shoes", "Lifestyle Sneakers"],
        brands: &["Nike", "Adidas", "Puma", "Reebok", "New Balance"],
        price_range: (2_000.0, 25_000.0),
    },
];

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Detects the product category from fixed keywords. Unknown products are
/// treated as searchable in the "General" category.
pub fn detect_product_by_rules(query: &str) -> ProductInsight {
    let lower = query.to_lowercase();
    let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    if let Some(rule) = RULES.iter().find(|r| lower.contains(r.key)) {
        let name = title_case(rule.key);
        return ProductInsight {
            is_searchable: true,
            product_name: name.clone(),
            products: to_strings(rule.products),
            brands: to_strings(rule.brands),
            category: name,
            price_range_min: Some(rule.price_range.0),
            price_range_max: Some(rule.price_range.1),
        };
    }

    ProductInsight {
        is_searchable: true,
        product_name: title_case(query),
        products: Vec::new(),
        brands: Vec::new(),
        category: "General".to_string(),
        price_range_min: None,
        price_range_max: None,
    }
}
