pub mod batch;
pub use batch::{BatchWriter, StagedWrite};
pub mod statistics_repo;
pub use statistics_repo::StatisticsRepository;
pub mod orders_repo;
pub use orders_repo::OrdersRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod users_repo;
pub use users_repo::UsersRepository;
