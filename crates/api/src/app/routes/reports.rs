use std::sync::Arc;

use axum::{Json, Router, extract::Extension, response::IntoResponse, routing::get};
use chrono::Utc;
use serde::Serialize;
use rust_decimal::Decimal;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Row caps mirror the dashboard contract: six best sellers, five top-rated
/// products, five top customers.
const TOP_SELLING_LIMIT: i64 = 6;
const TOP_RATED_LIMIT: i64 = 5;

pub fn router() -> Router {
    Router::new()
        .route("/reports/top-selling", get(top_selling))
        .route("/reports/monthly-income", get(monthly_income))
        .route("/reports/top-rated", get(top_rated))
}

#[derive(Debug, Serialize)]
struct TopSellerResponse {
    product_id: String,
    product_name: String,
    total_quantity: i64,
}

pub async fn top_selling(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders().top_selling(TOP_SELLING_LIMIT).await {
        Ok(rows) => {
            let response: Vec<TopSellerResponse> = rows
                .into_iter()
                .map(|row| TopSellerResponse {
                    product_id: row.product_id.to_string(),
                    product_name: row.product_name,
                    total_quantity: row.total_quantity,
                })
                .collect();
            Json(response).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

#[derive(Debug, Serialize)]
struct CustomerIncomeResponse {
    customer_id: String,
    income: Decimal,
}

#[derive(Debug, Serialize)]
struct MonthlyIncomeResponse {
    total_income: Option<Decimal>,
    top_customers: Vec<CustomerIncomeResponse>,
}

pub async fn monthly_income(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders().monthly_income(Utc::now()).await {
        Ok(report) => Json(MonthlyIncomeResponse {
            total_income: report.total_income,
            top_customers: report
                .top_customers
                .into_iter()
                .map(|c| CustomerIncomeResponse {
                    customer_id: c.customer_id.to_string(),
                    income: c.income,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn top_rated(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().top_rated(TOP_RATED_LIMIT).await {
        Ok(products) => {
            let responses: Vec<dto::ProductResponse> =
                products.into_iter().map(dto::ProductResponse::from).collect();
            Json(responses).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
