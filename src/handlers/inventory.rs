use crate::error::AppError;
use crate::middlewares::owner_from_request;
use crate::models::*;
use crate::services::RewardService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/inventory",
    tag = "inventory",
    responses(
        (status = 200, description = "Unlocked items for the resolved owner", body = [InventoryItemResponse]),
        (status = 401, description = "Owner not resolved")
    )
)]
/// Everything the owner has unlocked (frames, themes, titles), newest first.
pub async fn get_inventory(
    service: web::Data<RewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let owner = match owner_from_request(&req) {
        Some(o) => o,
        None => {
            return Ok(AppError::AuthError("Owner not resolved".to_string()).error_response());
        }
    };
    match service.list_inventory(owner).await {
        Ok(items) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": items }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn inventory_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/inventory").route("", web::get().to(get_inventory)));
}
