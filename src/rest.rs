//! REST-style surface over settings, bidders and products
//!
//! [`RestApi::dispatch`] routes an in-process [`Request`] to the registries and
//! turns the result into a JSON [`Response`]. Routes are mounted under the
//! namespace configured on the settings manager (`/ads/v1` by default):
//!
//! | Method            | Path                  |
//! |-------------------|-----------------------|
//! | GET, POST         | `/products`           |
//! | GET, PUT, DELETE  | `/products/{id}`      |
//! | GET, POST         | `/settings/{section}` |
//! | GET               | `/bidders`            |

use crate::bidding::Bidding;
use crate::error::Error;
use crate::manager::SettingsManager;
use crate::marketplace::{ProductInput, ProductService};

use http::{Method, StatusCode};
use log::{debug, error};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// An incoming request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// JSON body, `Value::Null` when there is none
    pub body: Value,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Value::Null,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// A JSON response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub data: Value,
}

impl Response {
    fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: StatusCode::OK,
                data,
            },
            Err(e) => Self::from_error(&Error::from(e)),
        }
    }

    fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            data: json!({
                "code": code,
                "message": message.into(),
                "status": status.as_u16(),
            }),
        }
    }

    fn from_error(err: &Error) -> Self {
        if err.is_not_found() {
            Self::error(StatusCode::NOT_FOUND, "rest_not_found", err.to_string())
        } else if err.is_validation() {
            Self::error(StatusCode::BAD_REQUEST, "rest_invalid_param", err.to_string())
        } else {
            error!("Request failed: {err}");
            Self::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "rest_internal_error",
                err.to_string(),
            )
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

enum Route<'a> {
    Products,
    Product(&'a str),
    Settings(&'a str),
    Bidders,
}

impl<'a> Route<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["products"] => Some(Route::Products),
            ["products", id] => Some(Route::Product(id)),
            ["settings", section] => Some(Route::Settings(section)),
            ["bidders"] => Some(Route::Bidders),
            _ => None,
        }
    }
}

/// Request dispatcher
pub struct RestApi {
    namespace: String,
    settings: Arc<SettingsManager>,
    bidding: Option<Arc<Bidding>>,
    products: Arc<ProductService>,
}

impl RestApi {
    /// Serve `settings` and `products` under the manager's REST namespace
    pub fn new(settings: Arc<SettingsManager>, products: Arc<ProductService>) -> Self {
        Self {
            namespace: settings.config().rest_namespace.clone(),
            settings,
            bidding: None,
            products,
        }
    }

    /// Serve the bidders of `bidding` on `/bidders`
    #[must_use]
    pub fn with_bidding(mut self, bidding: Arc<Bidding>) -> Self {
        self.bidding = Some(bidding);
        self
    }

    /// Namespace all routes are mounted under
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn dispatch(&self, request: &Request) -> Response {
        debug!("{} {}", request.method, request.path);

        let Some(route) = request
            .path
            .strip_prefix(self.namespace.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .and_then(Route::parse)
        else {
            return no_route(request);
        };

        match (&request.method, route) {
            (&Method::GET, Route::Products) => self.products.list().map_or_else(
                |e| Response::from_error(&e),
                Response::ok,
            ),
            (&Method::POST, Route::Products) => self.create_product(&request.body),
            (&Method::GET, Route::Product(id)) => {
                self.with_product_id(id, |id| self.products.get(id).map(Response::ok))
            }
            (&Method::PUT, Route::Product(id)) => self.with_product_id(id, |id| {
                let input = ProductInput::from_body(&request.body)?;
                self.products.update(id, input).map(Response::ok)
            }),
            (&Method::DELETE, Route::Product(id)) => self.with_product_id(id, |id| {
                let previous = self.products.delete(id)?;
                Ok(Response::ok(json!({ "deleted": true, "previous": previous })))
            }),
            (&Method::GET, Route::Settings(section)) => self
                .settings
                .get_settings(section, true)
                .map_or_else(|e| Response::from_error(&e), Response::ok),
            (&Method::POST, Route::Settings(section)) => {
                self.update_settings(section, &request.body)
            }
            (&Method::GET, Route::Bidders) => match &self.bidding {
                Some(bidding) => bidding
                    .get_bidders()
                    .map_or_else(|e| Response::from_error(&e), Response::ok),
                None => Response::ok(Vec::<Value>::new()),
            },
            (method, _) => Response::error(
                StatusCode::METHOD_NOT_ALLOWED,
                "rest_method_not_allowed",
                format!("Method {method} is not allowed on {}", request.path),
            ),
        }
    }

    fn create_product(&self, body: &Value) -> Response {
        ProductInput::from_body(body)
            .and_then(|input| self.products.create(input))
            .map_or_else(|e| Response::from_error(&e), Response::ok)
    }

    fn update_settings(&self, section: &str, body: &Value) -> Response {
        let Some(values) = body.as_object() else {
            return Response::error(
                StatusCode::BAD_REQUEST,
                "rest_invalid_param",
                "Settings must be sent as an object",
            );
        };
        // Private fields never leave through REST, even right after a write.
        self.settings
            .update_section(section, values)
            .and_then(|_| self.settings.get_settings(section, true))
            .map_or_else(|e| Response::from_error(&e), Response::ok)
    }

    fn with_product_id(
        &self,
        id: &str,
        handler: impl FnOnce(u64) -> crate::Result<Response>,
    ) -> Response {
        match id.parse::<u64>() {
            Ok(id) => handler(id).unwrap_or_else(|e| Response::from_error(&e)),
            Err(_) => Response::error(
                StatusCode::BAD_REQUEST,
                "rest_invalid_param",
                format!("'{id}' is not a product id"),
            ),
        }
    }
}

fn no_route(request: &Request) -> Response {
    Response::error(
        StatusCode::NOT_FOUND,
        "rest_no_route",
        format!("No route was found matching {} {}", request.method, request.path),
    )
}
