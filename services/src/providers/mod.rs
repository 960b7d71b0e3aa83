pub mod api;
pub mod database;
pub mod mock;

pub use api::ApiProvider;
pub use database::DatabaseProvider;
pub use mock::MockProvider;
