mod auth_test;
mod devices_test;
mod diagnostic_test;
mod diagnostics_test;
mod health_test;
