pub mod config;
pub mod filters;
pub mod http;
pub mod state;
pub mod system_health;
pub mod test_helpers;
