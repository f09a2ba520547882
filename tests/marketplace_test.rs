//! Marketplace Integration Tests
//!
//! Tests for the product routes of the REST dispatcher.

mod common;

use adconf::{
    FileDocumentStore, JsonStorage, ProductService, Request, Response, RestApi, SettingsManager,
};
use common::init_logging;
use http::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;

struct Marketplace {
    api: RestApi,
}

impl Marketplace {
    fn new() -> Self {
        Self::with_products(ProductService::in_memory())
    }

    fn with_products(products: ProductService) -> Self {
        init_logging();
        let settings = Arc::new(SettingsManager::builder("test-app").in_memory().build().unwrap());
        Self {
            api: RestApi::new(settings, Arc::new(products)),
        }
    }

    fn get_product(&self, id: &Value) -> Response {
        self.api.dispatch(&Request::get(format!("/ads/v1/products/{id}")))
    }

    fn create_product(&self, params: Option<Value>) -> Response {
        let params = params.unwrap_or_else(|| {
            json!({
                "placements": ["global_below_header"],
                "required_sizes": ["920x250"],
                "price": "5",
            })
        });
        self.api.dispatch(&Request::post("/ads/v1/products", params))
    }

    fn update_product(&self, id: &Value, params: Value) -> Response {
        self.api
            .dispatch(&Request::put(format!("/ads/v1/products/{id}"), params))
    }

    fn delete_product(&self, id: &Value) -> Response {
        self.api
            .dispatch(&Request::delete(format!("/ads/v1/products/{id}")))
    }
}

#[test]
fn test_create_product() {
    let market = Marketplace::new();
    let response = market.create_product(None);
    assert_eq!(response.status, StatusCode::OK);

    let data = response.data;
    assert_eq!(data["price"], json!("5"));
    assert_eq!(data["required_sizes"], json!(["920x250"]));
    assert_eq!(data["placements"], json!(["global_below_header"]));
    assert_eq!(data["title"], json!("Ad – Below Header"));
}

#[test]
fn test_update_product() {
    let market = Marketplace::new();
    let mut product = market.create_product(None).data;

    // the full product is sent back with a new price
    product["price"] = json!("10");
    let response = market.update_product(&product["id"], product.clone());
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data["price"], json!("10"));
    assert_eq!(response.data["created"], product["created"]);
}

#[test]
fn test_get_product() {
    let market = Marketplace::new();
    let product = market.create_product(None).data;

    let response = market.get_product(&product["id"]);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data["id"], product["id"]);
    for field in ["price", "placements", "required_sizes", "title", "created"] {
        assert_eq!(response.data[field], product[field], "{field}");
    }
    assert_eq!(response.data["price"], json!("5"));
    assert_eq!(response.data["placements"], json!(["global_below_header"]));
    assert_eq!(response.data["required_sizes"], json!(["920x250"]));
}

#[test]
fn test_delete_product() {
    let market = Marketplace::new();
    let product = market.create_product(None).data;

    let response = market.delete_product(&product["id"]);
    assert_eq!(response.status, StatusCode::OK);

    let response = market.get_product(&product["id"]);
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_invalid_products_rejected() {
    let market = Marketplace::new();

    for params in [
        json!({ "placements": ["sidebar"], "required_sizes": ["300x250"], "price": "-5" }),
        json!({ "placements": ["sidebar"], "required_sizes": ["wide"], "price": "5" }),
        json!({ "placements": ["nowhere"], "required_sizes": ["300x250"], "price": "5" }),
        json!({ "required_sizes": ["300x250"], "price": "5" }),
    ] {
        let response = market.create_product(Some(params.clone()));
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{params}");
        assert_eq!(response.data["status"], json!(400));
    }

    let listed = market.api.dispatch(&Request::get("/ads/v1/products"));
    assert_eq!(listed.data, json!([]));
}

#[test]
fn test_update_missing_product() {
    let market = Marketplace::new();
    let response = market.update_product(&json!(42), json!({ "price": "1" }));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_wrong_method() {
    let market = Marketplace::new();
    let response = market
        .api
        .dispatch(&Request::put("/ads/v1/products", json!({})));
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_products_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        Marketplace::with_products(ProductService::new(FileDocumentStore::new(
            dir.path(),
            "products",
            JsonStorage::new(),
        )))
    };

    let id = open().create_product(None).data["id"].clone();

    let market = open();
    let response = market.get_product(&id);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data["title"], json!("Ad – Below Header"));
}
