//! Implementations of [`LessonPlanRepository`](crate::db::LessonPlanRepository):
//! - `local`: in-memory, for tests and local development
//! - `postgres`: PostgreSQL with Diesel
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
