use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use shopworks_core::{ProductId, ReviewId, UserId};
use shopworks_infra::NewReview;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/:id", put(update_review).delete(delete_review))
        .route("/products/:id/reviews", get(list_reviews))
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateReviewRequest>,
) -> axum::response::Response {
    let product_id: ProductId = match body.product_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    let author: UserId = match body.author_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid author id");
        }
    };
    match services
        .catalog()
        .create_review(NewReview {
            product_id,
            author,
            rating: body.rating,
            comment: body.comment,
        })
        .await
    {
        Ok(review) => {
            (StatusCode::CREATED, Json(dto::ReviewResponse::from(review))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateReviewRequest>,
) -> axum::response::Response {
    let id: ReviewId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid review id");
        }
    };
    match services
        .catalog()
        .update_review(id, body.rating, body.comment)
        .await
    {
        Ok(review) => Json(dto::ReviewResponse::from(review)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ReviewId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid review id");
        }
    };
    match services.catalog().delete_review(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    match services.catalog().list_reviews(product_id).await {
        Ok(reviews) => {
            let responses: Vec<dto::ReviewResponse> =
                reviews.into_iter().map(dto::ReviewResponse::from).collect();
            Json(responses).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
