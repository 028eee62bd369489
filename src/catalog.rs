//! Catalog and cart collaborators, plus the sidebar's filter and sort.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::CatalogItem;

/// Furniture offered by a shop
pub trait CatalogProvider {
    fn list(&self, shop_id: &str) -> Vec<CatalogItem>;
}

/// Fixed catalog per shop. Shops without an entry fall back to `shared`.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    shops: HashMap<String, Vec<CatalogItem>>,
    shared: Vec<CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            shops: HashMap::new(),
            shared: items,
        }
    }

    pub fn with_shop(mut self, shop_id: impl Into<String>, items: Vec<CatalogItem>) -> Self {
        self.shops.insert(shop_id.into(), items);
        self
    }

    /// A JSON array of catalog items, shared by every shop
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
        let items: Vec<CatalogItem> =
            serde_json::from_str(&text).with_context(|| format!("Invalid catalog file: {:?}", path))?;
        log::info!("Loaded {} catalog items from {:?}", items.len(), path);
        Ok(Self::new(items))
    }
}

impl CatalogProvider for StaticCatalog {
    fn list(&self, shop_id: &str) -> Vec<CatalogItem> {
        self.shops.get(shop_id).unwrap_or(&self.shared).clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
}

/// Category filter and ordering over a shop's catalog
#[derive(Debug, Clone)]
pub struct CatalogView {
    items: Vec<CatalogItem>,
    active: BTreeSet<String>,
    sort: SortOrder,
}

impl CatalogView {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            active: BTreeSet::new(),
            sort: SortOrder::default(),
        }
    }

    /// Every category any item carries, sorted
    pub fn categories(&self) -> BTreeSet<String> {
        self.items.iter().flat_map(|item| item.categories.iter().cloned()).collect()
    }

    pub fn active_categories(&self) -> &BTreeSet<String> {
        &self.active
    }

    /// Switch a category filter on or off; returns whether it is now on
    pub fn toggle_category(&mut self, category: &str) -> bool {
        if self.active.remove(category) {
            false
        } else {
            self.active.insert(category.to_string());
            true
        }
    }

    pub fn clear_filters(&mut self) {
        self.active.clear();
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Items matching any active category (all items when none is active)
    pub fn visible(&self) -> Vec<&CatalogItem> {
        let mut items: Vec<&CatalogItem> = self
            .items
            .iter()
            .filter(|item| self.active.is_empty() || !item.categories.is_disjoint(&self.active))
            .collect();

        match self.sort {
            SortOrder::Name => items.sort_by(|a, b| a.display_name.cmp(&b.display_name)),
            SortOrder::PriceLow => items.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal)),
            SortOrder::PriceHigh => items.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal)),
        }
        items
    }

    pub fn find(&self, product_id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// One cart entry as handed to the cart service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
}

pub trait CartSink {
    fn add(&self, line: CartLine);
}

/// In-memory cart; repeated ids bump the quantity
#[derive(Debug, Default)]
pub struct MemoryCart {
    lines: RefCell<Vec<(CartLine, u32)>>,
}

impl MemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(CartLine, u32)> {
        self.lines.borrow().clone()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.borrow().iter().map(|(_, quantity)| quantity).sum()
    }

    pub fn subtotal(&self) -> f64 {
        self.lines
            .borrow()
            .iter()
            .map(|(line, quantity)| line.price * f64::from(*quantity))
            .sum()
    }
}

impl CartSink for MemoryCart {
    fn add(&self, line: CartLine) {
        let mut lines = self.lines.borrow_mut();
        if let Some((_, quantity)) = lines.iter_mut().find(|(existing, _)| existing.id == line.id) {
            *quantity += 1;
        } else {
            lines.push((line, 1));
        }
    }
}
