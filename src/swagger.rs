use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        // The session gateway forwards the resolved owner in these headers
        components.add_security_scheme(
            "owner_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Owner-Id"))),
        );
        components.add_security_scheme(
            "owner_kind",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Owner-Kind"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::points::get_balance,
        handlers::points::get_history,
        handlers::points::earn,
        handlers::gacha::get_pools,
        handlers::gacha::get_pool,
        handlers::gacha::draw,
        handlers::gacha::get_outcomes,
        handlers::inventory::get_inventory,
        handlers::admin::adjust,
    ),
    components(
        schemas(
            Owner,
            BalanceResponse,
            TransactionResponse,
            EarnRequest,
            AdminAdjustRequest,
            CursorQuery,
            PoolEntryResponse,
            PoolResponse,
            DrawRequest,
            DrawOutcomeResponse,
            InventoryItemResponse,
            ApiError,
            crate::entities::OwnerKind,
            crate::entities::ReasonCode,
            crate::entities::ItemType,
            crate::entities::Rarity,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "points", description = "Points ledger API"),
        (name = "gacha", description = "Gacha draw API"),
        (name = "inventory", description = "Unlocked item inventory API"),
        (name = "admin", description = "Operational adjustments API"),
    ),
    info(
        title = "Seiman Backend API",
        version = "1.0.0",
        description = "Points/circle-points ledger and gacha reward engine",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
