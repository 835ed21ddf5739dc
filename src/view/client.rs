use std::sync::RwLock;

use axum::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        LoginRequest, LoginResponse, MessageResponse, Product, ProductInput, ProductListResponse, ProductPage,
        ProductResponse, ProfileResponse, RegisterRequest, RegisterResponse, SessionUser, UpdateProfile, UserProfile,
    },
    view::{ProductSource, ProfileSource},
};

/// Image attached to a product create.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Talks to this service's `/api` routes the way the browser does.
///
/// Session cookies live in the client's cookie store. Only the display user
/// returned by login is kept here; the token never is.
pub struct DashboardClient {
    client: Client,
    base_url: String,
    current_user: RwLock<Option<SessionUser>>,
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            current_user: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.current_user.read().ok().and_then(|user| user.clone())
    }

    fn remember(&self, user: Option<SessionUser>) {
        if let Ok(mut slot) = self.current_user.write() {
            *slot = user;
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let response = self
            .client
            .post(self.url("/api/auth"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let login: LoginResponse = read(response, "Credenciales inválidas").await?;
        self.remember(Some(login.user.clone()));
        Ok(login)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<RegisterResponse, AppError> {
        let response = self.client.post(self.url("/api/auth/register")).json(payload).send().await?;
        read(response, "Error al registrar usuario").await
    }

    /// The local user is forgotten even if the request fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.remember(None);
        let response = self.client.post(self.url("/api/auth/logout")).send().await?;
        read::<MessageResponse>(response, "Error al cerrar sesión").await?;
        Ok(())
    }

    pub async fn create_product_with_image(
        &self,
        input: &ProductInput,
        image: ImageUpload,
    ) -> Result<Product, AppError> {
        let mut form = Form::new();
        if let Value::Object(fields) = serde_json::to_value(input).map_err(|e| AppError::Validation(e.to_string()))? {
            for (name, value) in fields {
                let text = match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                form = form.text(name, text);
            }
        }
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|_| AppError::Validation(format!("Tipo de imagen inválido: {}", image.content_type)))?;
        form = form.part("image", part);

        let response = self.client.post(self.url("/api/products")).multipart(form).send().await?;
        Ok(read::<ProductResponse>(response, "Error al crear el producto").await?.data)
    }
}

#[async_trait]
impl ProductSource for DashboardClient {
    async fn list_products(&self, page: u32) -> Result<ProductPage, AppError> {
        let response = self
            .client
            .get(self.url("/api/products"))
            .query(&[("page", page)])
            .send()
            .await?;

        let listing: ProductListResponse = read(response, "Error al cargar productos").await?;
        Ok(ProductPage {
            data: listing.data,
            pagination: listing.pagination,
        })
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        let response = self.client.post(self.url("/api/products")).json(input).send().await?;
        Ok(read::<ProductResponse>(response, "Error al crear el producto").await?.data)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, AppError> {
        let response = self
            .client
            .put(self.url(&format!("/api/products/{}", id)))
            .json(input)
            .send()
            .await?;
        Ok(read::<ProductResponse>(response, "Error al actualizar el producto").await?.data)
    }

    async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        let response = self.client.delete(self.url(&format!("/api/products/{}", id))).send().await?;
        read::<MessageResponse>(response, "Error al eliminar el producto").await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileSource for DashboardClient {
    async fn fetch_profile(&self) -> Result<UserProfile, AppError> {
        let response = self.client.get(self.url("/api/profile")).send().await?;
        Ok(read::<ProfileResponse>(response, "Error al cargar el perfil").await?.data)
    }

    async fn update_profile(&self, changes: &UpdateProfile) -> Result<UserProfile, AppError> {
        let response = self.client.put(self.url("/api/profile")).json(changes).send().await?;
        Ok(read::<ProfileResponse>(response, "Error al actualizar el perfil").await?.data)
    }
}

/// Decodes a success body, or turns an `{error}` envelope into [`AppError::Backend`].
async fn read<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, AppError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());
        return Err(AppError::Backend { status, message });
    }

    serde_json::from_slice(&body).map_err(|e| AppError::Transport(format!("Unexpected response: {}", e)))
}
