use crate::error::AppError;
use crate::external::Notifier;
use crate::middlewares::owner_from_request;
use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn require_owner(req: &HttpRequest) -> Result<Owner, AppError> {
    owner_from_request(req).ok_or_else(|| AppError::AuthError("Owner not resolved".to_string()))
}

#[utoipa::path(
    get,
    path = "/points/balance",
    tag = "points",
    responses(
        (status = 200, description = "Current balance for the resolved owner", body = BalanceResponse),
        (status = 401, description = "Owner not resolved")
    )
)]
/// Current spendable balance. Owners without any transactions read as zero.
pub async fn get_balance(
    service: web::Data<LedgerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let owner = match require_owner(&req) {
        Ok(o) => o,
        Err(e) => return Ok(e.error_response()),
    };
    match service.balance_row_of(owner).await {
        Ok(row) => {
            let data = row.map(BalanceResponse::from).unwrap_or(BalanceResponse {
                owner_kind: owner.kind,
                owner_id: owner.id,
                amount: 0,
                updated_at: None,
            });
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/points/history",
    tag = "points",
    params(
        ("cursor" = Option<i64>, Query, description = "Return transactions older than this id"),
        ("limit" = Option<u64>, Query, description = "Page size (default 20, max 100)")
    ),
    responses(
        (status = 200, description = "Transaction history, newest first", body = TransactionPageResponse),
        (status = 401, description = "Owner not resolved")
    )
)]
/// Paginated ledger history. Cursor-based, so pages stay stable while new
/// transactions are being appended.
pub async fn get_history(
    service: web::Data<LedgerService>,
    req: HttpRequest,
    query: web::Query<CursorQuery>,
) -> Result<HttpResponse> {
    let owner = match require_owner(&req) {
        Ok(o) => o,
        Err(e) => return Ok(e.error_response()),
    };
    match service.history_of(owner, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/points/earn",
    tag = "points",
    request_body = EarnRequest,
    responses(
        (status = 200, description = "Points credited (or idempotent replay)", body = TransactionResponse),
        (status = 400, description = "Non-earnable reason code or invalid amount"),
        (status = 401, description = "Owner not resolved")
    )
)]
/// Credit points for a client-triggered bonus (daily login, share copy,
/// signup seed). Replaying the same reference returns the original
/// transaction without a second award.
pub async fn earn(
    service: web::Data<LedgerService>,
    notifier: web::Data<Notifier>,
    req: HttpRequest,
    body: web::Json<EarnRequest>,
) -> Result<HttpResponse> {
    let owner = match require_owner(&req) {
        Ok(o) => o,
        Err(e) => return Ok(e.error_response()),
    };
    let body = body.into_inner();
    if !body.reason_code.is_earnable() {
        return Ok(AppError::ValidationError(format!(
            "Reason code {} cannot be earned directly",
            body.reason_code
        ))
        .error_response());
    }
    match service
        .credit(owner, body.amount, body.reason_code, body.reference)
        .await
    {
        Ok(tx) => {
            notifier.balance_changed(owner, tx.delta, tx.balance_after, tx.reason_code);
            let data = TransactionResponse::from(tx);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn points_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/points")
            .route("/balance", web::get().to(get_balance))
            .route("/history", web::get().to(get_history))
            .route("/earn", web::post().to(earn)),
    );
}
