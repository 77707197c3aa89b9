use serde::{Deserialize, Deserializer, Serialize};

/// Category filter value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// A product record as stored by the catalog API.
/// Prices are fixed-point decimal strings (e.g. "12.50") on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(deserialize_with = "decimal_string")]
    pub cost_price: String,
    #[serde(deserialize_with = "decimal_string")]
    pub selling_price: String,
    pub stock_available: i64,
    pub units_sold: i64,
    pub customer_rating: i32,
    #[serde(default)]
    pub demand_forecast: Option<i64>,
    #[serde(default = "zero_price", deserialize_with = "decimal_string")]
    pub optimized_price: String,
}

impl Product {
    pub fn selling_price_value(&self) -> Option<f64> {
        self.selling_price.trim().parse().ok()
    }

    /// Margin between selling and cost price, if both parse.
    pub fn margin(&self) -> Option<f64> {
        let cost: f64 = self.cost_price.trim().parse().ok()?;
        Some(self.selling_price_value()? - cost)
    }
}

fn zero_price() -> String {
    "0.00".to_string()
}

/// Accept prices serialized either as strings or as bare JSON numbers.
fn decimal_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => format!("{:.2}", n),
    })
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub cost_price: String,
    pub selling_price: String,
    pub description: String,
    pub stock_available: i64,
    pub units_sold: i64,
    pub customer_rating: i32,
    pub demand_forecast: i64,
    pub optimized_price: String,
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_sold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_forecast: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_price: Option<String>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this patch to a local copy, mirroring what the server does.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(ref v) = self.name {
            product.name = v.clone();
        }
        if let Some(ref v) = self.category {
            product.category = v.clone();
        }
        if let Some(ref v) = self.cost_price {
            product.cost_price = v.clone();
        }
        if let Some(ref v) = self.selling_price {
            product.selling_price = v.clone();
        }
        if let Some(ref v) = self.description {
            product.description = v.clone();
        }
        if let Some(v) = self.stock_available {
            product.stock_available = v;
        }
        if let Some(v) = self.units_sold {
            product.units_sold = v;
        }
        if let Some(v) = self.customer_rating {
            product.customer_rating = v;
        }
        if let Some(v) = self.demand_forecast {
            product.demand_forecast = Some(v);
        }
        if let Some(ref v) = self.optimized_price {
            product.optimized_price = v.clone();
        }
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Product>,
}

/// Filters for the product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub name: String,
    pub category: String,
    pub page: u32,
    pub page_size: Option<u32>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: ALL_CATEGORIES.to_string(),
            page: 1,
            page_size: None,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs. Empty filters are left out.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.name.is_empty() {
            params.push(("name".to_string(), self.name.clone()));
        }
        if !self.category.is_empty() {
            params.push(("category".to_string(), self.category.clone()));
        }
        if self.page > 1 {
            params.push(("page".to_string(), self.page.to_string()));
        }
        if let Some(size) = self.page_size {
            params.push(("page_size".to_string(), size.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "id": 7,
        "name": "Eco Bottle",
        "description": "Reusable",
        "category": "Outdoor",
        "cost_price": "4.10",
        "selling_price": 9.5,
        "stock_available": 120,
        "units_sold": 300,
        "customer_rating": 4,
        "demand_forecast": null,
        "optimized_price": "8.99"
    }"#;

    #[test]
    fn test_parse_product_with_mixed_price_encodings() {
        let p: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        assert_eq!(p.cost_price, "4.10");
        assert_eq!(p.selling_price, "9.50");
        assert_eq!(p.demand_forecast, None);
        let margin = p.margin().unwrap();
        assert!((margin - 5.4).abs() < 1e-9);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProductPatch {
            selling_price: Some("10.00".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"selling_price": "10.00"}));
        assert!(ProductPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_apply() {
        let mut p: Product = serde_json::from_str(PRODUCT_JSON).unwrap();
        ProductPatch {
            name: Some("Eco Bottle XL".to_string()),
            demand_forecast: Some(42),
            ..Default::default()
        }
        .apply_to(&mut p);
        assert_eq!(p.name, "Eco Bottle XL");
        assert_eq!(p.demand_forecast, Some(42));
        assert_eq!(p.category, "Outdoor");
    }

    #[test]
    fn test_query_params() {
        let q = ProductQuery::default();
        assert_eq!(q.to_params(), vec![("category".to_string(), "all".to_string())]);

        let q = ProductQuery {
            name: "bottle".to_string(),
            category: "Outdoor".to_string(),
            page: 3,
            page_size: Some(10),
        };
        let params = q.to_params();
        assert_eq!(params.len(), 4);
        assert!(params.contains(&("page".to_string(), "3".to_string())));
    }
}
