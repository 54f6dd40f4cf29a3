use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the MaterialScan API!",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Upload a photo of a material to analyze its environmental impact"
    }))
}
