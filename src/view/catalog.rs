use crate::{
    error::AppError,
    models::{PaginationInfo, Product, ProductInput},
    view::ProductSource,
};

/// Which product dialog is open.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Modal {
    #[default]
    Closed,
    Add,
    Edit(Product),
    Delete(Product),
}

/// Cached page of products plus the state of the list screen.
///
/// Failures never escape as panics: they land in [`ProductCatalog::error`] as
/// a notification and the catalog stays usable.
pub struct ProductCatalog<S> {
    source: S,
    products: Vec<Product>,
    pagination: Option<PaginationInfo>,
    current_page: u32,
    loading: bool,
    error: Option<String>,
    modal: Modal,
}

impl<S: ProductSource> ProductCatalog<S> {
    pub fn new(source: S) -> Self {
        Self::starting_at(source, 1)
    }

    pub fn starting_at(source: S, initial_page: u32) -> Self {
        Self {
            source,
            products: Vec::new(),
            pagination: None,
            current_page: initial_page.max(1),
            loading: false,
            error: None,
            modal: Modal::Closed,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn pagination(&self) -> Option<&PaginationInfo> {
        self.pagination.as_ref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_products(&mut self, page: u32) {
        self.loading = true;
        self.error = None;

        match self.source.list_products(page).await {
            Ok(listing) => {
                self.products = listing.data;
                self.pagination = Some(listing.pagination);
            }
            Err(e) => {
                tracing::warn!(page, "Product list fetch failed: {}", e);
                self.error = Some(e.user_message());
            }
        }

        self.loading = false;
    }

    pub async fn refetch(&mut self) {
        self.fetch_products(self.current_page).await;
    }

    pub async fn go_to_page(&mut self, page: u32) {
        self.current_page = page.max(1);
        self.fetch_products(self.current_page).await;
    }

    /// No-op on the last page or before the first fetch.
    pub async fn next_page(&mut self) {
        let has_next = self
            .pagination
            .map(|pagination| self.current_page < pagination.last_page)
            .unwrap_or(false);
        if has_next {
            self.go_to_page(self.current_page + 1).await;
        }
    }

    pub async fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.go_to_page(self.current_page - 1).await;
        }
    }

    pub fn open_add(&mut self) {
        self.modal = Modal::Add;
    }

    pub fn open_edit(&mut self, product: Product) {
        self.modal = Modal::Edit(product);
    }

    pub fn open_delete(&mut self, product: Product) {
        self.modal = Modal::Delete(product);
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    pub async fn submit_add(&mut self, input: &ProductInput) -> Result<Product, AppError> {
        if self.modal != Modal::Add {
            return Err(self.reject("El formulario de alta no está abierto"));
        }
        let result = self.source.create_product(input).await;
        self.settle(result).await
    }

    pub async fn submit_edit(&mut self, input: &ProductInput) -> Result<Product, AppError> {
        let id = match &self.modal {
            Modal::Edit(product) => product.id,
            _ => return Err(self.reject("No hay producto seleccionado para editar")),
        };
        let result = self.source.update_product(id, input).await;
        self.settle(result).await
    }

    pub async fn confirm_delete(&mut self) -> Result<Product, AppError> {
        let product = match &self.modal {
            Modal::Delete(product) => product.clone(),
            _ => return Err(self.reject("No hay producto seleccionado para eliminar")),
        };
        let result = self.source.delete_product(product.id).await.map(|()| product);
        self.settle(result).await
    }

    fn reject(&mut self, message: &str) -> AppError {
        self.error = Some(message.to_string());
        AppError::Validation(message.to_string())
    }

    /// Success closes the dialog and reloads the page; failure keeps it open.
    async fn settle(&mut self, result: Result<Product, AppError>) -> Result<Product, AppError> {
        match result {
            Ok(product) => {
                self.modal = Modal::Closed;
                self.refetch().await;
                Ok(product)
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{async_trait, http::StatusCode};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{ProductPage, ProductStatus};

    const PER_PAGE: usize = 2;

    /// In-memory backend: products are paged two at a time.
    struct FakeSource {
        products: Mutex<Vec<Product>>,
        requested_pages: Mutex<Vec<u32>>,
        fail_listing: bool,
    }

    impl FakeSource {
        fn with(count: i64) -> Self {
            Self {
                products: Mutex::new((1..=count).map(product).collect()),
                requested_pages: Mutex::new(Vec::new()),
                fail_listing: false,
            }
        }

        fn pages(&self) -> Vec<u32> {
            self.requested_pages.lock().unwrap().clone()
        }
    }

    fn product(id: i64) -> Product {
        Product {
            id,
            user_id: None,
            name: format!("Producto {id}"),
            sku: format!("SKU-{id}"),
            category: "general".to_string(),
            price: Decimal::new(1050, 2),
            stock: 4,
            status: ProductStatus::Disponible,
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn list_products(&self, page: u32) -> Result<ProductPage, AppError> {
            self.requested_pages.lock().unwrap().push(page);
            if self.fail_listing {
                return Err(AppError::Transport("connection refused".to_string()));
            }
            let products = self.products.lock().unwrap();
            let total = products.len();
            let last_page = total.div_ceil(PER_PAGE).max(1) as u32;
            let data = products
                .iter()
                .skip((page as usize - 1) * PER_PAGE)
                .take(PER_PAGE)
                .cloned()
                .collect();
            Ok(ProductPage {
                data,
                pagination: PaginationInfo {
                    current_page: page,
                    last_page,
                    per_page: PER_PAGE as u32,
                    total: total as u64,
                },
            })
        }

        async fn create_product(&self, input: &ProductInput) -> Result<Product, AppError> {
            let mut products = self.products.lock().unwrap();
            let mut created = product(products.len() as i64 + 1);
            if let Some(name) = &input.name {
                created.name = name.clone();
            }
            products.push(created.clone());
            Ok(created)
        }

        async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, AppError> {
            let mut products = self.products.lock().unwrap();
            let existing = products.iter_mut().find(|p| p.id == id).ok_or(AppError::Backend {
                status: StatusCode::NOT_FOUND,
                message: "Producto no encontrado".to_string(),
            })?;
            if let Some(stock) = input.stock {
                existing.stock = stock;
            }
            Ok(existing.clone())
        }

        async fn delete_product(&self, id: i64) -> Result<(), AppError> {
            let mut products = self.products.lock().unwrap();
            let before = products.len();
            products.retain(|p| p.id != id);
            if products.len() == before {
                return Err(AppError::Backend {
                    status: StatusCode::NOT_FOUND,
                    message: "Producto no encontrado".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn navigation_stays_within_bounds() {
        let mut catalog = ProductCatalog::new(FakeSource::with(5));

        // Sin datos todavía, next_page no hace nada
        catalog.next_page().await;
        assert!(catalog.source().pages().is_empty());

        catalog.refetch().await;
        catalog.prev_page().await;
        assert_eq!(catalog.current_page(), 1);

        catalog.go_to_page(3).await;
        assert_eq!(catalog.products().len(), 1);
        catalog.next_page().await;
        assert_eq!(catalog.current_page(), 3);

        catalog.prev_page().await;
        assert_eq!(catalog.current_page(), 2);
        assert_eq!(catalog.products()[0].id, 3);
        assert_eq!(catalog.source().pages(), vec![1, 3, 2]);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn listing_failure_becomes_notification() {
        let mut source = FakeSource::with(1);
        source.fail_listing = true;
        let mut catalog = ProductCatalog::new(source);

        catalog.refetch().await;

        assert_eq!(catalog.error(), Some(crate::error::TRANSPORT_MESSAGE));
        assert!(catalog.products().is_empty());
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn edit_requires_a_selected_product() {
        let mut catalog = ProductCatalog::new(FakeSource::with(1));
        let result = catalog.submit_edit(&ProductInput::default()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(catalog.error().is_some());
    }

    #[tokio::test]
    async fn successful_edit_closes_modal_and_refreshes() {
        let mut catalog = ProductCatalog::new(FakeSource::with(2));
        catalog.refetch().await;

        catalog.open_edit(catalog.products()[1].clone());
        let input = ProductInput {
            stock: Some(0),
            ..ProductInput::default()
        };
        let updated = catalog.submit_edit(&input).await.unwrap();

        assert_eq!(updated.stock, 0);
        assert_eq!(catalog.modal(), &Modal::Closed);
        assert_eq!(catalog.products()[1].stock, 0);
    }

    #[tokio::test]
    async fn failed_delete_keeps_modal_open_with_backend_message() {
        let mut catalog = ProductCatalog::new(FakeSource::with(1));
        catalog.open_delete(product(99));

        let result = catalog.confirm_delete().await;

        assert!(matches!(result, Err(AppError::Backend { .. })));
        assert_eq!(catalog.error(), Some("Producto no encontrado"));
        assert!(matches!(catalog.modal(), Modal::Delete(p) if p.id == 99));
    }

    #[tokio::test]
    async fn add_then_delete_round_trip_refreshes_the_page() {
        let mut catalog = ProductCatalog::new(FakeSource::with(1));
        catalog.open_add();
        let created = catalog
            .submit_add(&ProductInput {
                name: Some("Monitor".to_string()),
                ..ProductInput::default()
            })
            .await
            .unwrap();
        assert_eq!(catalog.products().len(), 2);

        catalog.open_delete(created);
        catalog.confirm_delete().await.unwrap();

        assert_eq!(catalog.products().len(), 1);
        assert_eq!(catalog.modal(), &Modal::Closed);
    }
}
