use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use crate::{errors::AppError, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    10
}

#[instrument(skip(state, query))]
pub async fn get_all_analyses(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    let query = query.into_inner();
    query.validate()?;

    let analyses = state
        .query_handler
        .list_analyses(query.page, query.per_page)
        .await?;

    Ok(HttpResponse::Ok().json(analyses))
}

#[instrument(skip(analysis_id, state))]
pub async fn get_analysis_by_id(
    analysis_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let query_handler = &state.query_handler;

    let analysis = query_handler.get_analysis(&analysis_id).await?;
    Ok(HttpResponse::Ok().json(analysis))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, ResponseError};

    use super::*;

    #[test]
    fn missing_params_fall_back_to_first_page_of_ten() {
        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 10);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn rejects_zero_page_and_oversized_per_page() {
        let query = ListQuery { page: 0, per_page: 10 };
        assert!(query.validate().is_err());

        let query = ListQuery { page: 1, per_page: 200 };
        assert!(query.validate().is_err());
    }

    #[test]
    fn pagination_validation_failure_maps_to_400() {
        let query = ListQuery { page: 0, per_page: 200 };
        let err: AppError = query.validate().unwrap_err().into();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
