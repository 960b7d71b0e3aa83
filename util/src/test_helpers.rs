use crate::config::AppConfig;

/// Puts the global configuration into a known state for tests: `test`
/// environment, a fixed JWT secret and mock writes disabled.
///
/// Call at the top of any test that issues sessions.
pub fn setup_test_config() {
    AppConfig::set_env("test");
    AppConfig::set_jwt_secret("test-secret-do-not-use-in-production");
    AppConfig::set_jwt_duration_minutes(60);
    AppConfig::set_allow_mock_writes(false);
}
