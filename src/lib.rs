use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session;
pub mod state;
pub mod view;


use handlers::{auth, pages, products, profile};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::logout,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::update_product_with_image,
        handlers::products::delete_product,
        handlers::profile::get_profile,
        handlers::profile::update_profile
    ),
    components(
        schemas(
            models::Product,
            models::PaginationInfo,
            models::ProductPage,
            models::ProductInput,
            models::UserProfile,
            models::UpdateProfile,
            models::LoginRequest,
            models::RegisterRequest,
            models::SessionUser,
            models::LoginResponse,
            models::RegisterResponse,
            models::MessageResponse,
            models::ProductResponse,
            models::ProductListResponse,
            models::ProfileResponse,
            handlers::products::ListParams
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "products", description = "Product proxy endpoints"),
        (name = "profile", description = "Profile of the signed-in user")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                utoipa::openapi::security::SecurityScheme::ApiKey(utoipa::openapi::security::ApiKey::Cookie(
                    utoipa::openapi::security::ApiKeyValue::new(session::TOKEN_COOKIE),
                )),
            );
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    // Configurar CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Páginas: el guard corre antes de renderizar
    let pages = Router::new()
        .route("/login", get(pages::login_page))
        .route("/register", get(pages::register_page))
        .route("/dashboard", get(pages::dashboard_page))
        .route("/dashboard/profile", get(pages::profile_page))
        .route_layer(from_fn_with_state(state.clone(), middleware::route_guard));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Rutas públicas
        .route("/", get(pages::landing))
        .route("/health", get(|| async { "ok" }))
        .route("/api/auth", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        // Proxy autenticado
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route(
            "/api/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .post(products::update_product_with_image)
                .delete(products::delete_product),
        )
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))
        .merge(pages)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
