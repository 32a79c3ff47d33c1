use axum::Router;

pub mod discounts;
pub mod orders;
pub mod products;
pub mod reports;
pub mod reviews;
pub mod system;

/// All domain routes (health is wired separately in `app::build_app`).
pub fn router() -> Router {
    Router::new()
        .merge(products::router())
        .merge(discounts::router())
        .merge(reviews::router())
        .merge(orders::router())
        .merge(reports::router())
}
