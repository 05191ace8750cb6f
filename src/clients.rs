pub mod contifico_client;
pub use contifico_client::ContificoClient;
