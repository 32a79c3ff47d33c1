use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use shopworks_catalog::{NewProduct, active_discount, discounted_unit_price};
use shopworks_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route("/products/import", post(import_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/price", put(update_price))
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let new = NewProduct {
        name: body.name,
        price: body.price,
        description: body.description,
        inventory: body.inventory,
    };
    match services.catalog().create_product(new).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(dto::ProductResponse::from(product)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Bulk import: rejects anything that does not match the exact four-column
/// contract before a single row is stored.
pub async fn import_products(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ImportProductsRequest>,
) -> axum::response::Response {
    match services
        .catalog()
        .import_products(&body.header, &body.rows)
        .await
    {
        Ok(products) => {
            let responses: Vec<dto::ProductResponse> =
                products.into_iter().map(dto::ProductResponse::from).collect();
            (StatusCode::CREATED, Json(responses)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Product detail, including the effective price under any
/// currently-active discount.
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let catalog = services.catalog();
    let product = match catalog.get_product(id).await {
        Ok(product) => product,
        Err(e) => return errors::store_error_to_response(e),
    };
    let discounts = match catalog.list_discounts(id).await {
        Ok(discounts) => discounts,
        Err(e) => return errors::store_error_to_response(e),
    };

    let discounted = active_discount(&discounts, Utc::now())
        .map(|d| discounted_unit_price(product.price, Some(d.percentage)));
    Json(dto::ProductResponse::with_discounted_price(product, discounted)).into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().list_products().await {
        Ok(products) => {
            let responses: Vec<dto::ProductResponse> =
                products.into_iter().map(dto::ProductResponse::from).collect();
            Json(responses).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePriceRequest>,
) -> axum::response::Response {
    let id = match parse_product_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services
        .catalog()
        .update_price(id, body.price, Utc::now())
        .await
    {
        Ok(product) => Json(dto::ProductResponse::from(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
