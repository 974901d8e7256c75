pub mod app_config;
pub mod database;
pub mod reservation_repo;
pub mod in_memory;
pub mod redis_repo;
pub mod stripe;
pub mod mailer;

pub use database::DbClient;
pub use reservation_repo::PostgresAvailabilityStore;
pub use in_memory::InMemoryAvailabilityStore;
pub use redis_repo::RedisClient;
pub use stripe::StripeCheckoutClient;
pub use mailer::{ConsoleNotifier, SmtpNotifier};
