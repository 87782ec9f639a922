//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//! - Holiday shifts run in one transaction holding row locks on the
//!   owner's affected lesson plans
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::api::{DateChange, LessonPlan, LessonPlanId, NewLessonPlan, OwnerId};
use crate::db::repository::{
    ErrorContext, LessonPlanRepository, RepositoryError, RepositoryResult,
};
use crate::scheduling::redistribute_for_holiday;

mod models;
mod schema;

use models::*;
use schema::lesson_plans;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Rows per INSERT statement, well below Postgres' bind parameter limit.
const INSERT_CHUNK: usize = 1000;

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables (see module docs).
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed lesson plan repository.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        tracing::info!(max_pool_size = config.max_pool_size, "postgres repository ready");

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run `f` on a pooled connection off the async runtime, retrying
    /// retryable failures with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        tracing::warn!(attempt = attempt + 1, error = %e, "retrying postgres operation");
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

/// Lock and load the owner's lessons from `from` on, ordered by `(date, id)`.
fn lock_lessons_from(
    tx: &mut PgConnection,
    owner: &str,
    from: NaiveDate,
) -> RepositoryResult<Vec<LessonPlan>> {
    let rows = lesson_plans::table
        .filter(lesson_plans::owner_id.eq(owner))
        .filter(lesson_plans::lesson_date.ge(from))
        .order((lesson_plans::lesson_date.asc(), lesson_plans::id.asc()))
        .select(LessonPlanRow::as_select())
        .for_update()
        .load::<LessonPlanRow>(tx)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(LessonPlan::from).collect())
}

/// Apply every change or fail; must run inside a transaction.
fn apply_changes(tx: &mut PgConnection, changes: &[DateChange]) -> RepositoryResult<usize> {
    for change in changes {
        let updated = diesel::update(lesson_plans::table.find(change.id.0))
            .set(lesson_plans::lesson_date.eq(change.new_date))
            .execute(tx)
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RepositoryError::lesson_not_found(
                "apply_date_changes",
                change.id,
            ));
        }
    }
    Ok(changes.len())
}

#[async_trait]
impl LessonPlanRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_lesson_plans(
        &self,
        plans: Vec<NewLessonPlan>,
    ) -> RepositoryResult<Vec<LessonPlan>> {
        let rows: Vec<NewLessonPlanRow> = plans.into_iter().map(NewLessonPlanRow::from).collect();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut stored = Vec::with_capacity(rows.len());
                for chunk in rows.chunks(INSERT_CHUNK) {
                    let inserted: Vec<LessonPlanRow> = diesel::insert_into(lesson_plans::table)
                        .values(chunk)
                        .returning(LessonPlanRow::as_returning())
                        .get_results(tx)
                        .map_err(map_diesel_error)?;
                    stored.extend(inserted.into_iter().map(LessonPlan::from));
                }
                Ok(stored)
            })
        })
        .await
    }

    async fn get_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<LessonPlan> {
        self.with_conn(move |conn| {
            lesson_plans::table
                .find(id.0)
                .select(LessonPlanRow::as_select())
                .first::<LessonPlanRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(LessonPlan::from)
                .ok_or_else(|| RepositoryError::lesson_not_found("get_lesson_plan", id))
        })
        .await
    }

    async fn list_lesson_plans(&self, owner: &OwnerId) -> RepositoryResult<Vec<LessonPlan>> {
        let owner = owner.0.clone();
        self.with_conn(move |conn| {
            let rows = lesson_plans::table
                .filter(lesson_plans::owner_id.eq(&owner))
                .order((lesson_plans::lesson_date.asc(), lesson_plans::id.asc()))
                .select(LessonPlanRow::as_select())
                .load::<LessonPlanRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(LessonPlan::from).collect())
        })
        .await
    }

    async fn fetch_lessons_from(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
    ) -> RepositoryResult<Vec<LessonPlan>> {
        let owner = owner.0.clone();
        self.with_conn(move |conn| {
            let rows = lesson_plans::table
                .filter(lesson_plans::owner_id.eq(&owner))
                .filter(lesson_plans::lesson_date.ge(from))
                .order((lesson_plans::lesson_date.asc(), lesson_plans::id.asc()))
                .select(LessonPlanRow::as_select())
                .load::<LessonPlanRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(LessonPlan::from).collect())
        })
        .await
    }

    async fn apply_date_changes(&self, changes: &[DateChange]) -> RepositoryResult<usize> {
        let changes = changes.to_vec();
        self.with_conn(move |conn| conn.transaction(|tx| apply_changes(tx, &changes)))
            .await
    }

    async fn shift_for_holiday(
        &self,
        owner: &OwnerId,
        holiday: NaiveDate,
    ) -> RepositoryResult<Vec<DateChange>> {
        let owner = owner.0.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let in_scope = lock_lessons_from(tx, &owner, holiday)?;
                let changes = redistribute_for_holiday(holiday, &in_scope);
                apply_changes(tx, &changes)?;
                Ok(changes)
            })
        })
        .await
    }

    async fn update_lesson_date(
        &self,
        id: LessonPlanId,
        date: NaiveDate,
    ) -> RepositoryResult<LessonPlan> {
        self.with_conn(move |conn| {
            diesel::update(lesson_plans::table.find(id.0))
                .set(lesson_plans::lesson_date.eq(date))
                .returning(LessonPlanRow::as_returning())
                .get_result::<LessonPlanRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(LessonPlan::from)
                .ok_or_else(|| RepositoryError::lesson_not_found("update_lesson_date", id))
        })
        .await
    }

    async fn delete_lesson_plan(&self, id: LessonPlanId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(lesson_plans::table.find(id.0))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(RepositoryError::lesson_not_found("delete_lesson_plan", id));
            }
            Ok(())
        })
        .await
    }
}
