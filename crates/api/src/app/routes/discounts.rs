use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use chrono::Utc;

use shopworks_core::{DiscountId, ProductId};
use shopworks_infra::NewDiscount;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/discounts", post(create_discount))
        .route("/discounts/:id", put(update_discount).delete(delete_discount))
}

fn to_new_discount(body: &dto::DiscountRequest) -> NewDiscount {
    NewDiscount {
        percentage: body.percentage,
        starts_at: body.starts_at,
        ends_at: body.ends_at,
        is_active: body.is_active,
    }
}

pub async fn create_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateDiscountRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    match services
        .catalog()
        .create_discount(product_id, to_new_discount(&body.discount), Utc::now())
        .await
    {
        Ok(discount) => (
            StatusCode::CREATED,
            Json(dto::DiscountResponse::from(discount)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::DiscountRequest>,
) -> axum::response::Response {
    let id: DiscountId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid discount id");
        }
    };
    match services
        .catalog()
        .update_discount(id, to_new_discount(&body), Utc::now())
        .await
    {
        Ok(discount) => Json(dto::DiscountResponse::from(discount)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DiscountId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid discount id");
        }
    };
    match services.catalog().delete_discount(id, Utc::now()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
