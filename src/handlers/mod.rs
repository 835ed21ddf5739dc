pub mod auth;
pub mod pages;
pub mod products;
pub mod profile;
