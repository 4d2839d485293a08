use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod client;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{db, uploads, utils};

use repositories::product::ProductRepository;
use uploads::UploadStore;
use use_cases::product::ProductHandler;

pub struct AppState {
    pub product_handler: AppProductHandler,
}

pub type AppProductHandler = ProductHandler<Arc<dyn ProductRepository>>;

impl AppState {
    pub fn new(config: &settings::AppConfig, product_repo: Arc<dyn ProductRepository>) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
        let product_handler = ProductHandler::new(product_repo, uploads);

        AppState { product_handler }
    }
}
