use crate::error::AppError;
use crate::external::Notifier;
use crate::middlewares::owner_from_request;
use crate::models::*;
use crate::services::GachaService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn require_owner(req: &HttpRequest) -> Result<Owner, AppError> {
    owner_from_request(req).ok_or_else(|| AppError::AuthError("Owner not resolved".to_string()))
}

#[utoipa::path(
    get,
    path = "/gacha/pools",
    tag = "gacha",
    responses(
        (status = 200, description = "All published prize pools with drop tables", body = [PoolResponse]),
        (status = 401, description = "Owner not resolved")
    )
)]
/// List the published prize pools. Entry order and weights are exactly as
/// provisioned; the client renders drop rates from them.
pub async fn get_pools(service: web::Data<GachaService>) -> Result<HttpResponse> {
    let list = service.list_pools();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list })))
}

#[utoipa::path(
    get,
    path = "/gacha/pools/{pool_id}",
    tag = "gacha",
    params(
        ("pool_id" = String, Path, description = "Pool identifier")
    ),
    responses(
        (status = 200, description = "Pool detail", body = PoolResponse),
        (status = 404, description = "Pool not found"),
        (status = 401, description = "Owner not resolved")
    )
)]
pub async fn get_pool(
    service: web::Data<GachaService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.get_pool(&path.into_inner()) {
        Ok(pool) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": pool }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/gacha/draw",
    tag = "gacha",
    request_body = DrawRequest,
    responses(
        (status = 200, description = "Draw outcome (fresh, replayed, or resumed)", body = DrawOutcomeResponse),
        (status = 404, description = "Pool not found"),
        (status = 409, description = "Insufficient balance, or draw incomplete (retry same reference)"),
        (status = 401, description = "Owner not resolved")
    )
)]
/// Perform one paid draw:
/// 1. Debit the pool cost, keyed by the caller's reference
/// 2. Weighted random selection over the pool entries
/// 3. Unlock the won item and record the outcome atomically
///
/// A retried request with the same reference returns the original outcome
/// and never charges or grants twice.
pub async fn draw(
    service: web::Data<GachaService>,
    notifier: web::Data<Notifier>,
    req: HttpRequest,
    body: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    let owner = match require_owner(&req) {
        Ok(o) => o,
        Err(e) => return Ok(e.error_response()),
    };
    let body = body.into_inner();
    match service.draw(owner, &body.pool_id, &body.reference).await {
        Ok(receipt) => {
            let cost = &receipt.cost_transaction;
            notifier.balance_changed(owner, cost.delta, cost.balance_after, cost.reason_code);
            notifier.reward_granted(owner, receipt.outcome.item_type, &receipt.outcome.item_key);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": receipt.outcome })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/outcomes",
    tag = "gacha",
    params(
        ("cursor" = Option<i64>, Query, description = "Return outcomes older than this id"),
        ("limit" = Option<u64>, Query, description = "Page size (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Draw history, newest first", body = DrawOutcomePageResponse),
        (status = 401, description = "Owner not resolved")
    )
)]
pub async fn get_outcomes(
    service: web::Data<GachaService>,
    req: HttpRequest,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    let owner = match require_owner(&req) {
        Ok(o) => o,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_outcomes(owner, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn gacha_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gacha")
            .route("/pools", web::get().to(get_pools))
            .route("/pools/{pool_id}", web::get().to(get_pool))
            .route("/draw", web::post().to(draw))
            .route("/outcomes", web::get().to(get_outcomes)),
    );
}
