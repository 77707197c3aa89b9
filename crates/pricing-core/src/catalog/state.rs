use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::api::{ApiError, ProductsApi};
use crate::models::{NewProduct, Product, ProductPatch, ProductQuery, ALL_CATEGORIES};

/// Maximum concurrent product detail requests.
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Page size assumed before the first fetch.
const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub current_page: u32,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub search_query: String,
    pub category: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            category: ALL_CATEGORIES.to_string(),
        }
    }
}

pub struct ProductCatalog {
    api: ProductsApi,
    pub products: Vec<Product>,
    pub pagination: Pagination,
    pub filters: Filters,
    pub error: Option<String>,
}

/// Message to show for a failed call: what the server said when it said
/// something, otherwise the per-operation fallback.
fn failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::UpstreamError { message, .. } | ApiError::Unauthenticated(message) => {
            message.clone()
        }
        _ => fallback.to_string(),
    }
}

impl ProductCatalog {
    pub fn new(api: ProductsApi) -> Self {
        Self {
            api,
            products: Vec::new(),
            pagination: Pagination::default(),
            filters: Filters::default(),
            error: None,
        }
    }

    /// Update the filters. Empty values leave the current filter alone.
    pub fn set_filters(&mut self, search_query: Option<&str>, category: Option<&str>) {
        if let Some(q) = search_query.filter(|q| !q.is_empty()) {
            self.filters.search_query = q.to_string();
        }
        if let Some(c) = category.filter(|c| !c.is_empty()) {
            self.filters.category = c.to_string();
        }
    }

    fn record<T>(&mut self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ApiError> {
        match result {
            Ok(v) => {
                self.error = None;
                Ok(v)
            }
            Err(e) => {
                warn!(error = %e, "{}", fallback);
                self.error = Some(failure_message(&e, fallback));
                Err(e)
            }
        }
    }

    /// Load one page using the current filters.
    pub async fn fetch(&mut self, page: u32) -> Result<(), ApiError> {
        let query = ProductQuery {
            name: self.filters.search_query.clone(),
            category: self.filters.category.clone(),
            page: page.max(1),
            page_size: None,
        };
        let result = self.api.list(&query).await;
        let listing = self.record(result, "Failed to fetch products")?;

        self.pagination = Pagination {
            count: listing.count,
            next: listing.next,
            previous: listing.previous,
            current_page: query.page,
            page_size: listing.results.len(),
        };
        self.products = listing.results;
        Ok(())
    }

    pub async fn add(&mut self, product: &NewProduct) -> Result<Product, ApiError> {
        let result = self.api.create(product).await;
        let created = self.record(result, "Failed to add product")?;
        self.products.push(created.clone());
        Ok(created)
    }

    pub async fn update(&mut self, id: i64, patch: &ProductPatch) -> Result<Product, ApiError> {
        let result = self.api.update(id, patch).await;
        let updated = self.record(result, "Failed to update product")?;
        if let Some(slot) = self.products.iter_mut().find(|p| p.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        let result = self.api.delete(id).await;
        self.record(result, "Failed to delete product")?;
        self.products.retain(|p| p.id != id);
        Ok(())
    }

    /// Fetch several products concurrently. Results come back in the
    /// order of `ids`.
    pub async fn load_details(&self, ids: &[i64]) -> Vec<(i64, Result<Product, ApiError>)> {
        debug!(
            count = ids.len(),
            "Fetching product details with max {} concurrent requests", MAX_CONCURRENT_REQUESTS
        );
        stream::iter(ids.iter().copied())
            .map(|id| {
                let api = self.api.clone();
                async move { (id, api.get(id).await) }
            })
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await
    }

    pub fn find(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
