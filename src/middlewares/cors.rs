use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // Production deployments restrict this behind the gateway
            true
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        // Owner headers are custom, so preflight must allow them
        .allow_any_header()
        .max_age(3600)
}
