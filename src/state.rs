use crate::db::{DbPool, OrmConn, create_orm_conn, create_pool};

/// Handles shared by every request. Entities go through `orm`; the audit
/// trail writes through the raw `pool`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }

    /// Opens both connections against the same database.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let orm = create_orm_conn(database_url).await?;
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool, orm))
    }
}
