use actix_web::{http::StatusCode, web};

use crate::handlers::{home::home, json_error::json_error};

mod admin;
mod analyses;
mod intake;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(intake::config_routes)
            .configure(analyses::config_routes)
            .configure(admin::config_routes)
    );

    cfg.default_service(web::route().to(|| async {
        json_error(StatusCode::NOT_FOUND, "not_found", "The requested resource does not exist")
    }));
}
