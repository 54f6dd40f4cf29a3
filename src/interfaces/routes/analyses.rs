use actix_web::web;

use crate::handlers::analyses;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analyses")
            .service(
                web::resource("")
                    .route(web::get().to(analyses::get_all_analyses))
            )
            .service(
                web::resource("/{record_id}")
                    .route(web::get().to(analyses::get_analysis_by_id))
            )
    );
}
