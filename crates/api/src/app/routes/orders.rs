use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use shopworks_core::{OrderId, ProductId, UserId};
use shopworks_infra::Page;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/items", post(add_item))
        .route(
            "/orders/:id/items/:product_id",
            put(update_item).delete(remove_item),
        )
        .route("/orders/:id/confirm", post(confirm))
        .route("/orders/:id/cancel", post(cancel))
        .route("/orders/:id/complete", post(complete))
        .route("/orders/:id/regenerate", post(regenerate))
        .route("/customers/:id/orders", get(customer_orders))
}

fn parse_order_id(id: &str) -> Result<OrderId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"))
}

fn parse_product_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

fn order_response(view: shopworks_infra::OrderView) -> axum::response::Response {
    Json(dto::OrderResponse::from(view)).into_response()
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let customer: UserId = match body.customer_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id");
        }
    };
    match services.orders().create_order(customer, Utc::now()).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::OrderResponse::from(view))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.orders().get_order(id).await {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddLineItemRequest>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let product_id = match parse_product_id(&body.product_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services
        .orders()
        .add_item(order_id, product_id, body.quantity, Utc::now())
        .await
    {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, product_id)): Path<(String, String)>,
    Json(body): Json<dto::LineItemRequest>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let product_id = match parse_product_id(&product_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services
        .orders()
        .update_item(order_id, product_id, body.quantity, Utc::now())
        .await
    {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let product_id = match parse_product_id(&product_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.orders().remove_item(order_id, product_id).await {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.orders().confirm(id).await {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.orders().cancel(id).await {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn complete(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match services.orders().complete(id).await {
        Ok(view) => order_response(view),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn regenerate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RegenerateRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let actor: UserId = match body.actor_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid actor id");
        }
    };
    match services.orders().regenerate(id, actor, Utc::now()).await {
        Ok(view) => (StatusCode::CREATED, Json(dto::OrderResponse::from(view))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn customer_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<dto::PageQuery>,
) -> axum::response::Response {
    let customer: UserId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id");
        }
    };
    let page = Page::new(query.page, query.page_size);
    match services.orders().list_for_customer(customer, page).await {
        Ok(paginated) => {
            let response: dto::PaginatedResponse<dto::OrderResponse> = paginated.into();
            Json(response).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
