use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Roles y estados ---

/// Dashboard role. Unknown strings collapse to `User`, the least privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Manager => "manager",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            _ => Role::User,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::parse(&raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductStatus {
    Disponible,
    BajoStock,
    Agotado,
    /// Estado que el backend envía pero que no conocemos.
    Other(String),
}

impl From<String> for ProductStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "disponible" => ProductStatus::Disponible,
            "bajo_stock" => ProductStatus::BajoStock,
            "agotado" => ProductStatus::Agotado,
            _ => ProductStatus::Other(raw),
        }
    }
}

impl From<ProductStatus> for String {
    fn from(status: ProductStatus) -> Self {
        match status {
            ProductStatus::Disponible => "disponible".to_string(),
            ProductStatus::BajoStock => "bajo_stock".to_string(),
            ProductStatus::Agotado => "agotado".to_string(),
            ProductStatus::Other(raw) => raw,
        }
    }
}

// --- Domain Models (propiedad del backend) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub name: String,
    pub sku: String,
    pub category: String,
    /// Llega como string ("12.50") o número según el backend.
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
    pub stock: u32,
    #[schema(value_type = String, example = "disponible")]
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// A page of products as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub data: Vec<Product>,
    pub pagination: PaginationInfo,
}

/// Pagination as the backend may send it; every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawPagination {
    current_page: Option<u32>,
    last_page: Option<u32>,
    per_page: Option<u32>,
    total: Option<u64>,
}

/// Product listing as returned by `GET /products/`.
///
/// Either an envelope or a bare array of products. In the envelope,
/// `pagination` is the canonical key and `meta` is accepted as an alias,
/// mapped field by field. Missing values are filled from the requested page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BackendProductPage {
    Envelope {
        #[serde(alias = "products")]
        data: Vec<Product>,
        #[serde(default, alias = "meta")]
        pagination: Option<RawPagination>,
    },
    Bare(Vec<Product>),
}

impl BackendProductPage {
    pub fn into_page(self, requested_page: u32, requested_per_page: u32) -> ProductPage {
        let (data, raw) = match self {
            BackendProductPage::Envelope { data, pagination } => (data, pagination.unwrap_or_default()),
            BackendProductPage::Bare(data) => (data, RawPagination::default()),
        };
        let pagination = PaginationInfo {
            current_page: raw.current_page.unwrap_or(requested_page),
            last_page: raw.last_page.unwrap_or(1).max(1),
            per_page: raw.per_page.unwrap_or(requested_per_page),
            total: raw.total.unwrap_or(data.len() as u64),
        };
        ProductPage { data, pagination }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "admin")]
    pub role: Option<Role>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// --- Request/Response DTOs ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Campos de un producto para crear o editar (JSON).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub status: Option<ProductStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Display object handed to the browser after login. Never carries the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "user")]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
    #[schema(value_type = String)]
    pub role: Role,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub success: bool,
    pub data: Product,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub success: bool,
    pub data: Vec<Product>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserProfile,
}

// Claims del JWT que firma el gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // ID del usuario ("" si el backend no lo envió)
    pub role: Role,
    pub access: String, // Token del backend
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_price_accepts_string_and_number() {
        let from_str: Product = serde_json::from_value(json!({
            "id": 1, "name": "Teclado", "sku": "TK-1", "category": "perifericos",
            "price": "12.50", "stock": 3, "status": "bajo_stock"
        }))
        .unwrap();
        let from_num: Product = serde_json::from_value(json!({
            "id": 1, "name": "Teclado", "sku": "TK-1", "category": "perifericos",
            "price": 12.5, "stock": 3, "status": "bajo_stock"
        }))
        .unwrap();

        assert_eq!(from_str.price, from_num.price);
        assert_eq!(from_str.status, ProductStatus::BajoStock);
        assert!(from_str.image.is_none());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status: ProductStatus = serde_json::from_value(json!("descontinuado")).unwrap();
        assert_eq!(status, ProductStatus::Other("descontinuado".to_string()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("descontinuado"));
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        let role: Role = serde_json::from_value(json!("superuser")).unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
    }

    #[test]
    fn meta_is_mapped_to_pagination() {
        let raw: BackendProductPage = serde_json::from_value(json!({
            "data": [],
            "meta": { "current_page": 3, "last_page": 7, "per_page": 5, "total": 33, "from": 11 }
        }))
        .unwrap();
        let page = raw.into_page(1, 10);
        assert_eq!(
            page.pagination,
            PaginationInfo { current_page: 3, last_page: 7, per_page: 5, total: 33 }
        );
    }

    #[test]
    fn missing_pagination_is_synthesized() {
        let raw: BackendProductPage = serde_json::from_value(json!({
            "data": [{
                "id": 9, "name": "Mouse", "sku": "MS-9", "category": "perifericos",
                "price": "5.00", "stock": 0, "status": "agotado"
            }]
        }))
        .unwrap();
        let page = raw.into_page(2, 10);
        assert_eq!(
            page.pagination,
            PaginationInfo { current_page: 2, last_page: 1, per_page: 10, total: 1 }
        );
    }

    #[test]
    fn bare_array_listing_gets_synthesized_pagination() {
        let raw: BackendProductPage = serde_json::from_value(json!([
            { "id": 1, "name": "Teclado", "sku": "KB-1", "category": "perifericos",
              "price": 20, "stock": 3, "status": "bajo_stock" },
            { "id": 2, "name": "Cable", "sku": "CB-2", "category": "accesorios",
              "price": "1.50", "stock": 40, "status": "disponible" }
        ]))
        .unwrap();
        let page = raw.into_page(1, 10);
        assert_eq!(page.data.len(), 2);
        assert_eq!(
            page.pagination,
            PaginationInfo { current_page: 1, last_page: 1, per_page: 10, total: 2 }
        );
    }
}
