use actix_web::web;

use crate::handlers::analyze;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/analyze")
            .route(web::post().to(analyze::analyze_material))
    );
}
