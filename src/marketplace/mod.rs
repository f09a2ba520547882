//! Ad marketplace: products publishers sell directly
//!
//! A product bundles a price with the placements it targets and the ad sizes
//! a creative must provide. Products live in a [`DocumentStore`]; their title
//! is derived from the placement names.

mod placements;
mod store;

pub use placements::{Placement, PlacementCatalog};
pub use store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};

use crate::coerce;
use crate::error::{Error, Result};

use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use time::OffsetDateTime;

static AD_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+x[0-9]+$").expect("valid ad size pattern"));

/// A marketplace product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub title: String,
    /// Decimal price, kept as submitted ("5", "10.50")
    pub price: String,
    /// Placement ids
    pub placements: Vec<String>,
    /// Sizes a creative must provide, `WIDTHxHEIGHT`
    pub required_sizes: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
}

impl Product {
    fn into_document(self) -> Result<Value> {
        let mut document = serde_json::to_value(self)?;
        if let Some(map) = document.as_object_mut() {
            map.remove("id");
        }
        Ok(document)
    }

    fn from_document(id: u64, mut document: Value) -> Result<Self> {
        let map = document
            .as_object_mut()
            .ok_or_else(|| Error::Parse(format!("product {id} is not an object")))?;
        map.insert("id".to_string(), Value::from(id));
        Ok(serde_json::from_value(document)?)
    }
}

/// Fields submitted to create or update a product; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductInput {
    pub price: Option<String>,
    pub placements: Option<Vec<String>>,
    pub required_sizes: Option<Vec<String>>,
}

impl ProductInput {
    #[must_use]
    pub fn price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    #[must_use]
    pub fn placements(mut self, placements: &[&str]) -> Self {
        self.placements = Some(placements.iter().map(|s| (*s).to_string()).collect());
        self
    }

    #[must_use]
    pub fn required_sizes(mut self, sizes: &[&str]) -> Self {
        self.required_sizes = Some(sizes.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// Read a request body.
    ///
    /// `price` may be a number or a string; `placements` and `required_sizes`
    /// may be arrays or a single string. `null` and unknown members (such as
    /// an echoed `id` or `title`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidProduct` if the body is not a JSON object.
    pub fn from_body(body: &Value) -> Result<Self> {
        let map = match body {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(Error::invalid_product(
                    "body",
                    "request body must be an object",
                ));
            }
        };
        let present = |key: &str| map.get(key).filter(|v| !v.is_null());

        Ok(Self {
            price: present("price").map(coerce::to_text),
            placements: present("placements").map(coerce::to_string_list),
            required_sizes: present("required_sizes").map(coerce::to_string_list),
        })
    }
}

/// CRUD over products
pub struct ProductService {
    store: Arc<dyn DocumentStore>,
    placements: PlacementCatalog,
}

impl ProductService {
    /// Products kept in `store`, with the default placement catalog
    pub fn new(store: impl DocumentStore + 'static) -> Self {
        Self::with_catalog(store, PlacementCatalog::default())
    }

    pub fn with_catalog(store: impl DocumentStore + 'static, placements: PlacementCatalog) -> Self {
        info!("Initialized product service ({} store)", store.backend_name());
        Self {
            store: Arc::new(store),
            placements,
        }
    }

    /// Products kept in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryDocumentStore::new())
    }

    pub fn placements(&self) -> &PlacementCatalog {
        &self.placements
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidProduct` if a field is missing or invalid, or a
    /// storage error.
    pub fn create(&self, input: ProductInput) -> Result<Product> {
        let price = input
            .price
            .ok_or_else(|| Error::invalid_product("price", "price is required"))?;
        let placements = input
            .placements
            .ok_or_else(|| Error::invalid_product("placements", "placements are required"))?;
        let required_sizes = input.required_sizes.ok_or_else(|| {
            Error::invalid_product("required_sizes", "required sizes are required")
        })?;

        let now = OffsetDateTime::now_utc();
        let mut product = Product {
            id: 0,
            title: self.placements.title_for(&placements),
            price,
            placements,
            required_sizes,
            created: now,
            modified: now,
        };
        self.validate(&product)?;

        product.id = self.store.insert(product.clone().into_document()?)?;
        info!("Created product {} ({})", product.id, product.title);
        Ok(product)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductNotFound` for an unknown id, or a storage error.
    pub fn get(&self, id: u64) -> Result<Product> {
        let document = self.store.get(id)?.ok_or(Error::ProductNotFound(id))?;
        Product::from_document(id, document)
    }

    /// All products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list(&self) -> Result<Vec<Product>> {
        self.store
            .ids()?
            .into_iter()
            .filter_map(|id| match self.get(id) {
                Err(Error::ProductNotFound(_)) => None,
                other => Some(other),
            })
            .collect()
    }

    /// Update the submitted fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductNotFound` for an unknown id,
    /// `Error::InvalidProduct` for invalid fields, or a storage error.
    pub fn update(&self, id: u64, input: ProductInput) -> Result<Product> {
        let mut product = self.get(id)?;

        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(placements) = input.placements {
            product.title = self.placements.title_for(&placements);
            product.placements = placements;
        }
        if let Some(required_sizes) = input.required_sizes {
            product.required_sizes = required_sizes;
        }
        self.validate(&product)?;

        product.modified = OffsetDateTime::now_utc();
        if !self.store.replace(id, product.clone().into_document()?)? {
            return Err(Error::ProductNotFound(id));
        }
        debug!("Updated product {id}");
        Ok(product)
    }

    /// Delete a product, returning it.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProductNotFound` for an unknown id, or a storage error.
    pub fn delete(&self, id: u64) -> Result<Product> {
        let document = self.store.remove(id)?.ok_or(Error::ProductNotFound(id))?;
        info!("Deleted product {id}");
        Product::from_document(id, document)
    }

    fn validate(&self, product: &Product) -> Result<()> {
        validate_price(&product.price)?;

        if product.placements.is_empty() {
            return Err(Error::invalid_product(
                "placements",
                "at least one placement is required",
            ));
        }
        if let Some(unknown) = product
            .placements
            .iter()
            .find(|id| !self.placements.contains(id))
        {
            return Err(Error::invalid_product(
                "placements",
                format!("unknown placement '{unknown}'"),
            ));
        }

        if let Some(bad) = product.required_sizes.iter().find(|s| !AD_SIZE.is_match(s)) {
            return Err(Error::invalid_product(
                "required_sizes",
                format!("'{bad}' is not a WIDTHxHEIGHT size"),
            ));
        }
        Ok(())
    }
}

fn validate_price(price: &str) -> Result<()> {
    match price.trim().parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Ok(()),
        _ => Err(Error::invalid_product(
            "price",
            format!("'{price}' is not a non-negative number"),
        )),
    }
}
