pub mod sync_service;
pub use sync_service::SyncService;
pub mod contifico_service;
pub use contifico_service::ContificoService;
