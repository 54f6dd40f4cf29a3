mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{db, inference, storage, utils};

use inference::GeminiClient;
use repositories::sqlx_repo::SqlxAnalysisRepo;
use storage::S3Storage;
use use_cases::intake::IntakeHandler;
use use_cases::queries::AnalysisQueryHandler;

pub struct AppState {
    pub intake_handler: AppIntakeHandler,
    pub query_handler: AppQueryHandler,
}

pub type AppIntakeHandler = IntakeHandler<GeminiClient, S3Storage, SqlxAnalysisRepo>;
pub type AppQueryHandler = AnalysisQueryHandler<SqlxAnalysisRepo>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool, storage: S3Storage) -> Self {
        let analyzer = GeminiClient::new(config);
        let analysis_repo = SqlxAnalysisRepo::new(pool);

        let intake_handler = IntakeHandler::new(analyzer, storage, analysis_repo.clone());
        let query_handler = AnalysisQueryHandler::new(analysis_repo);

        AppState {
            intake_handler,
            query_handler,
        }
    }
}
