pub mod m202510190001_create_users;
pub mod m202510190002_create_devices;
pub mod m202510190003_create_diagnostics;
pub mod m202510190004_create_offline_queue;
