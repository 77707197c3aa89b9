use std::sync::Arc;

use tracing::debug;

use super::{ApiError, ApiRequest, Gateway};
use crate::models::{Envelope, NewProduct, Product, ProductPage, ProductPatch, ProductQuery};

const PRODUCTS_PATH: &str = "/products/";

fn product_path(id: i64) -> String {
    format!("{}{}/", PRODUCTS_PATH, id)
}

fn require_data<T>(envelope: Envelope<T>, what: &str) -> Result<T, ApiError> {
    envelope
        .into_data()
        .ok_or_else(|| ApiError::InvalidResponse(format!("{} response has no data", what)))
}

/// Product catalog CRUD.
#[derive(Clone)]
pub struct ProductsApi {
    gateway: Arc<Gateway>,
}

impl ProductsApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Fetch one page of products matching the query.
    /// A response without data is an empty page.
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let request = ApiRequest::get(PRODUCTS_PATH).query(query.to_params());
        let envelope: Envelope<ProductPage> = self.gateway.send(request).await?;
        let page = envelope.into_data().unwrap_or_default();
        debug!(count = page.count, returned = page.results.len(), "Fetched products");
        Ok(page)
    }

    pub async fn get(&self, id: i64) -> Result<Product, ApiError> {
        let envelope: Envelope<Product> =
            self.gateway.send(ApiRequest::get(product_path(id))).await?;
        require_data(envelope, "product")
    }

    pub async fn create(&self, product: &NewProduct) -> Result<Product, ApiError> {
        let request = ApiRequest::post(PRODUCTS_PATH).json(product)?;
        let envelope: Envelope<Product> = self.gateway.send(request).await?;
        require_data(envelope, "create product")
    }

    /// Partial update; fields left unset are untouched on the server.
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> Result<Product, ApiError> {
        if patch.is_empty() {
            return Err(ApiError::InvalidRequest("nothing to update".to_string()));
        }
        let request = ApiRequest::patch(product_path(id)).json(patch)?;
        let envelope: Envelope<Product> = self.gateway.send(request).await?;
        require_data(envelope, "update product")
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.gateway
            .send_empty(ApiRequest::delete(product_path(id)))
            .await
    }
}
