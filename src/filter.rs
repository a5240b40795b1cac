//! Chain, product and category filtering of a shop snapshot.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use shopmap_types::{Product, ShopPoint};

/// User-selected filters. Empty selections let every shop through.
///
/// # Example
///
/// ```rust
/// use shopmap::ShopFilter;
/// use shopmap_types::ShopPoint;
///
/// let shops = vec![
///     ShopPoint::new("Lidl", "lidl", "", 52.2, 21.0),
///     ShopPoint::new("Dino", "dino", "", 52.4, 16.9),
/// ];
/// let filter = ShopFilter::default().with_chain("LID");
/// assert_eq!(filter.apply(&shops).len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopFilter {
    /// Chain fragments, matched case-insensitively against the shop chain
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub product_ids: Vec<u64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ShopFilter {
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chains.push(chain.into());
        self
    }

    pub fn with_product(mut self, product_id: u64) -> Self {
        self.product_ids.push(product_id);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty() && self.product_ids.is_empty() && self.categories.is_empty()
    }

    pub fn matches(&self, shop: &ShopPoint) -> bool {
        if !self.chains.is_empty() {
            let chain = shop.chain.to_lowercase();
            if !self
                .chains
                .iter()
                .any(|wanted| chain.contains(&wanted.to_lowercase()))
            {
                return false;
            }
        }

        if !self.product_ids.is_empty()
            && !shop.products.iter().any(|p| self.product_ids.contains(&p.id))
        {
            return false;
        }

        if !self.categories.is_empty()
            && !shop
                .products
                .iter()
                .any(|p| self.categories.contains(&p.category))
        {
            return false;
        }

        true
    }

    /// Shops passing every active filter, in input order.
    pub fn apply(&self, shops: &[ShopPoint]) -> Vec<ShopPoint> {
        shops.iter().filter(|shop| self.matches(shop)).cloned().collect()
    }

    /// Product ids as the comma-separated list the shop service expects.
    pub fn product_query(&self) -> Option<String> {
        if self.product_ids.is_empty() {
            return None;
        }
        Some(
            self.product_ids
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// A chain that can be selected in the filter panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainFacet {
    pub chain: String,
    /// Human readable name
    pub name: String,
    pub logo_url: Option<String>,
}

/// Selectable chains and products found in a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterFacets {
    pub chains: Vec<ChainFacet>,
    pub products: Vec<Product>,
}

impl FilterFacets {
    /// Unique chains and products in first-seen order.
    pub fn collect(shops: &[ShopPoint]) -> Self {
        let mut seen_chains: FxHashSet<&str> = FxHashSet::default();
        let mut seen_products: FxHashSet<u64> = FxHashSet::default();
        let mut facets = Self::default();

        for shop in shops {
            if seen_chains.insert(shop.chain.as_str()) {
                facets.chains.push(ChainFacet {
                    chain: shop.chain.clone(),
                    name: chain_display_name(&shop.chain),
                    logo_url: shop.logo_url.clone(),
                });
            }

            for product in &shop.products {
                if seen_products.insert(product.id) {
                    facets.products.push(product.clone());
                }
            }
        }

        facets
    }

    /// Distinct product categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty() && seen.insert(*c))
            .collect()
    }
}

/// Display name of a chain key: `twoj_market` becomes `Twoj Market`.
pub fn chain_display_name(chain: &str) -> String {
    if chain == "inter" {
        return "Intermarché".to_string();
    }

    chain
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shops() -> Vec<ShopPoint> {
        vec![
            ShopPoint::new("Żabka", "zabka", "", 52.23, 21.01).with_products(vec![
                Product::new(1, "Tiger", "energy_drink"),
                Product::new(2, "Kinder", "sweets"),
            ]),
            ShopPoint::new("Carrefour Express", "carrefour", "", 52.24, 21.02)
                .with_products(vec![Product::new(2, "Kinder", "sweets")]),
            ShopPoint::new("Twój Market", "twoj_market", "", 52.25, 21.03)
                .with_logo_url("https://example.com/tm.png"),
            ShopPoint::new("Intermarché", "inter", "", 52.26, 21.04),
        ]
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = ShopFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&shops()).len(), 4);
    }

    #[test]
    fn test_chain_substring_case_insensitive() {
        let filter = ShopFilter::default().with_chain("MARKET");
        let result = filter.apply(&shops());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chain, "twoj_market");
    }

    #[test]
    fn test_product_and_category_filters() {
        let by_product = ShopFilter::default().with_product(2);
        assert_eq!(by_product.apply(&shops()).len(), 2);

        let combined = ShopFilter::default()
            .with_product(2)
            .with_category("energy_drink");
        let result = combined.apply(&shops());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chain, "zabka");
    }

    #[test]
    fn test_product_query() {
        assert_eq!(ShopFilter::default().product_query(), None);
        let filter = ShopFilter::default().with_product(4).with_product(11);
        assert_eq!(filter.product_query().as_deref(), Some("4,11"));
    }

    #[test]
    fn test_facets_first_seen_order() {
        let facets = FilterFacets::collect(&shops());
        let names: Vec<_> = facets.chains.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Zabka", "Carrefour", "Twoj Market", "Intermarché"]);
        assert_eq!(
            facets.chains[2].logo_url.as_deref(),
            Some("https://example.com/tm.png")
        );

        let ids: Vec<_> = facets.products.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(facets.categories(), ["energy_drink", "sweets"]);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(chain_display_name("circle_k"), "Circle K");
        assert_eq!(chain_display_name("inter"), "Intermarché");
        assert_eq!(chain_display_name("lidl"), "Lidl");
    }
}
