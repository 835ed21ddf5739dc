//! Dashboard-side consumers of the `/api` surface: a typed client and the UI
//! state behind the product list, its modals and the profile page.

pub mod catalog;
pub mod client;
pub mod profile;

use std::sync::Arc;

use axum::async_trait;

use crate::{
    error::AppError,
    models::{Product, ProductInput, ProductPage, UpdateProfile, UserProfile},
};

#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn list_products(&self, page: u32) -> Result<ProductPage, AppError>;
    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError>;
    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, AppError>;
    async fn delete_product(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile, AppError>;
    async fn update_profile(&self, changes: &UpdateProfile) -> Result<UserProfile, AppError>;
}

// Una misma sesión (cookies) compartida entre pantallas
#[async_trait]
impl<T: ProductSource + ?Sized> ProductSource for Arc<T> {
    async fn list_products(&self, page: u32) -> Result<ProductPage, AppError> {
        (**self).list_products(page).await
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError> {
        (**self).create_product(input).await
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, AppError> {
        (**self).update_product(id, input).await
    }

    async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        (**self).delete_product(id).await
    }
}

#[async_trait]
impl<T: ProfileSource + ?Sized> ProfileSource for Arc<T> {
    async fn fetch_profile(&self) -> Result<UserProfile, AppError> {
        (**self).fetch_profile().await
    }

    async fn update_profile(&self, changes: &UpdateProfile) -> Result<UserProfile, AppError> {
        (**self).update_profile(changes).await
    }
}
