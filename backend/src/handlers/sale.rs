//! Sale handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::TenantUser;
use crate::services::sale::{CreateSaleInput, MonthlySales, SaleWithItems, SalesReport, TopProduct};
use crate::services::SaleService;
use crate::AppState;
use shared::DateRange;

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRangeQuery {
    pub fn range(&self) -> AppResult<DateRange> {
        Ok(DateRange::new(self.start_date, self.end_date)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn sale_service(state: AppState) -> SaleService {
    SaleService::new(state.db, state.events)
}

pub async fn create_sale(
    State(state): State<AppState>,
    user: TenantUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<(StatusCode, Json<SaleWithItems>)> {
    let sale = sale_service(state)
        .record_sale(user.company_id, user.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<SaleWithItems>>> {
    let sales = sale_service(state).list_sales(user.company_id).await?;
    Ok(Json(sales))
}

pub async fn get_sale(
    State(state): State<AppState>,
    user: TenantUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let sale = sale_service(state).get_sale(user.company_id, sale_id).await?;
    Ok(Json(sale))
}

pub async fn recent_sales(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<SaleWithItems>>> {
    let sales = sale_service(state).recent_sales(user.company_id).await?;
    Ok(Json(sales))
}

pub async fn sales_stats(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<MonthlySales>>> {
    let stats = sale_service(state).monthly_stats(user.company_id).await?;
    Ok(Json(stats))
}

pub async fn top_products(
    State(state): State<AppState>,
    user: TenantUser,
) -> AppResult<Json<Vec<TopProduct>>> {
    let products = sale_service(state).top_products(user.company_id).await?;
    Ok(Json(products))
}

pub async fn sales_report(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<SalesReport>> {
    let report = sale_service(state)
        .report(user.company_id, query.range()?)
        .await?;
    Ok(Json(report))
}

pub async fn export_sales_report(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<impl IntoResponse> {
    let range = query.range()?;
    let csv = sale_service(state)
        .export_report_csv(user.company_id, range)
        .await?;
    let disposition = format!(
        "attachment; filename=\"sales-{}-{}.csv\"",
        range.start_date, range.end_date
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

pub async fn search_sales(
    State(state): State<AppState>,
    user: TenantUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<SaleWithItems>>> {
    let sales = sale_service(state)
        .search_sales(user.company_id, &query.q)
        .await?;
    Ok(Json(sales))
}
