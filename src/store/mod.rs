//! Event storage behind a trait, so handlers can be tested against an
//! in-memory fake while production goes through Postgres.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{ConnectionCache, PgConnector};
use crate::models::{Event, NewEvent};
use crate::utils::error::AppError;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Finds one event by its normalized (lowercase, trimmed) slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError>;

    /// All events, newest first.
    async fn list_recent(&self) -> Result<Vec<Event>, AppError>;

    async fn insert(&self, event: NewEvent) -> Result<Event, AppError>;
}

// "date" and "time" are quoted to keep them plain identifiers.
const SELECT_COLUMNS: &str = "id, slug, title, description, overview, \"date\", \"time\", location, \
     venue, mode, audience, organizer, agenda, tags, image, created_at";

pub struct PgEventStore {
    cache: ConnectionCache<PgConnector>,
    query_timeout: Duration,
}

impl PgEventStore {
    pub fn new(cache: ConnectionCache<PgConnector>, query_timeout: Duration) -> Self {
        Self {
            cache,
            query_timeout,
        }
    }

    /// A hung datastore must not block the request task forever; queries get
    /// a hard deadline and a timeout surfaces as an upstream failure.
    async fn bounded<T>(
        &self,
        query: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout("database query")),
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, AppError> {
        let pool = self.cache.acquire().await?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM events WHERE slug = $1");

        self.bounded(
            sqlx::query_as::<_, Event>(&sql)
                .bind(slug)
                .fetch_optional(&pool),
        )
        .await
    }

    async fn list_recent(&self) -> Result<Vec<Event>, AppError> {
        let pool = self.cache.acquire().await?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM events ORDER BY created_at DESC");

        self.bounded(sqlx::query_as::<_, Event>(&sql).fetch_all(&pool))
            .await
    }

    async fn insert(&self, event: NewEvent) -> Result<Event, AppError> {
        let pool = self.cache.acquire().await?;
        let sql = format!(
            "INSERT INTO events (id, slug, title, description, overview, \"date\", \"time\", \
             location, venue, mode, audience, organizer, agenda, tags, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {SELECT_COLUMNS}"
        );

        let inserted = self
            .bounded(
                sqlx::query_as::<_, Event>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&event.slug)
                    .bind(&event.title)
                    .bind(&event.description)
                    .bind(&event.overview)
                    .bind(&event.date)
                    .bind(&event.time)
                    .bind(&event.location)
                    .bind(&event.venue)
                    .bind(event.mode)
                    .bind(&event.audience)
                    .bind(&event.organizer)
                    .bind(&event.agenda)
                    .bind(&event.tags)
                    .bind(&event.image)
                    .fetch_one(&pool),
            )
            .await;

        inserted.map_err(|err| match err {
            // The slug carries a unique index; a duplicate is a client
            // problem, not a server one.
            AppError::Database(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                AppError::Validation("An event with this title already exists".to_string())
            }
            other => other,
        })
    }
}
