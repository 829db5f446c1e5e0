use crate::external::Notifier;
use crate::models::*;
use crate::services::LedgerService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/admin/adjust",
    tag = "admin",
    request_body = AdminAdjustRequest,
    responses(
        (status = 200, description = "Adjustment applied (or idempotent replay)", body = TransactionResponse),
        (status = 409, description = "Debit would take the balance negative"),
        (status = 400, description = "Zero delta")
    )
)]
/// Apply a signed manual correction to any owner's balance. Negative deltas
/// obey the same no-negative-balance rule as every debit; the target owner
/// comes from the body, not the resolved caller.
pub async fn adjust(
    service: web::Data<LedgerService>,
    notifier: web::Data<Notifier>,
    body: web::Json<AdminAdjustRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let owner = Owner {
        kind: body.owner_kind,
        id: body.owner_id,
    };
    match service.adjust(owner, body.delta, body.reference).await {
        Ok(tx) => {
            log::info!(
                "Admin adjustment of {} applied to {owner} (transaction {})",
                tx.delta,
                tx.id
            );
            notifier.balance_changed(owner, tx.delta, tx.balance_after, tx.reason_code);
            let data = TransactionResponse::from(tx);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/admin").route("/adjust", web::post().to(adjust)));
}
