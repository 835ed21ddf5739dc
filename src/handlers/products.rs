use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use reqwest::Method;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    backend::{parse_payload, unwrap_envelope, FormField, Payload},
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::CurrentSession,
    models::{BackendProductPage, MessageResponse, ProductInput, ProductListResponse, ProductResponse},
    state::AppState,
};

pub const DEFAULT_PER_PAGE: u32 = 10;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Product body: JSON, or multipart when an image is attached.
pub enum ProductPayload {
    Json(ProductInput),
    Multipart(Vec<FormField>),
}

#[async_trait]
impl<S> FromRequest<S> for ProductPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let ApiJson(input) = ApiJson::<ProductInput>::from_request(req, state).await?;
            return Ok(ProductPayload::Json(input));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        // Copiar todos los campos tal cual llegan
        let mut fields = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;

            fields.push(FormField {
                name,
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        }

        Ok(ProductPayload::Multipart(fields))
    }
}

impl ProductPayload {
    fn into_backend(self) -> Result<Payload, AppError> {
        match self {
            ProductPayload::Json(input) => serde_json::to_value(input)
                .map(Payload::Json)
                .map_err(|e| AppError::Validation(e.to_string())),
            ProductPayload::Multipart(fields) => Ok(Payload::Multipart(fields)),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ListParams),
    responses(
        (status = 200, description = "One page of products", body = ProductListResponse),
        (status = 401, description = "Unauthenticated")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);

    let body = state
        .backend
        .forward(
            Method::GET,
            &format!("/products/?page={}&per_page={}", page, per_page),
            &session.token,
            Payload::Empty,
            "Error al obtener productos",
        )
        .await?;

    let listing = parse_payload::<BackendProductPage>(body)?.into_page(page, per_page);

    Ok(Json(ProductListResponse {
        success: true,
        data: listing.data,
        pagination: listing.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product details", body = ProductResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Not found; backend message relayed")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProductResponse>, AppError> {
    let body = state
        .backend
        .forward(
            Method::GET,
            &format!("/products/{}/", id),
            &session.token,
            Payload::Empty,
            "Error al obtener el producto",
        )
        .await?;

    Ok(Json(ProductResponse {
        success: true,
        data: parse_payload(unwrap_envelope(body))?,
    }))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body(content = ProductInput, description = "JSON, or multipart/form-data with an `image` file"),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 401, description = "Unauthenticated")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    payload: ProductPayload,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let body = state
        .backend
        .forward(
            Method::POST,
            "/products/",
            &session.token,
            payload.into_backend()?,
            "Error al crear el producto",
        )
        .await?;

    let product = parse_payload(unwrap_envelope(body))?;
    tracing::info!(user_id = ?session.user_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            data: product,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 401, description = "Unauthenticated")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductResponse>, AppError> {
    let payload = ProductPayload::Json(input).into_backend()?;
    let body = state
        .backend
        .forward(
            Method::PUT,
            &format!("/products/{}/", id),
            &session.token,
            payload,
            "Error al actualizar el producto",
        )
        .await?;

    Ok(Json(ProductResponse {
        success: true,
        data: parse_payload(unwrap_envelope(body))?,
    }))
}

/// Update carrying an image. Forwarded as POST because multipart PUT is
/// emulated by the backend with a `_method=PUT` field.
#[utoipa::path(
    post,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    request_body(content = ProductInput, description = "multipart/form-data including `_method=PUT`"),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 401, description = "Unauthenticated")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn update_product_with_image(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
    payload: ProductPayload,
) -> Result<Json<ProductResponse>, AppError> {
    let body = state
        .backend
        .forward(
            Method::POST,
            &format!("/products/{}/", id),
            &session.token,
            payload.into_backend()?,
            "Error al actualizar el producto",
        )
        .await?;

    Ok(Json(ProductResponse {
        success: true,
        data: parse_payload(unwrap_envelope(body))?,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Not found; backend message relayed")
    ),
    security(("session_cookie" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .backend
        .forward(
            Method::DELETE,
            &format!("/products/{}/", id),
            &session.token,
            Payload::Empty,
            "Error al eliminar el producto",
        )
        .await?;

    tracing::info!(product_id = id, user_id = ?session.user_id, "Product deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Producto eliminado".to_string(),
    }))
}
