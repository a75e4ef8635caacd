use diesel::{sqlite::Sqlite, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod models;
pub mod schema;

pub type Pool = diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_migrations(
    connection: &mut impl MigrationHarness<Sqlite>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    connection.run_pending_migrations(MIGRATIONS)?;

    Ok(())
}

/**
 * Create db connection pool
 */
pub fn get_connection_pool() -> Pool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "bot.db".to_string());
    let manager = diesel::r2d2::ConnectionManager::<SqliteConnection>::new(url);
    Pool::builder()
        .test_on_check_out(true)
        .build(manager)
        .expect("Could not build connection pool")
}

/// In-memory pool for tests. A single connection is kept alive for the
/// lifetime of the pool so the database survives between checkouts; every
/// call returns a fresh, fully migrated database.
pub fn test_connection_pool() -> Pool {
    let manager = diesel::r2d2::ConnectionManager::<SqliteConnection>::new(":memory:");
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Could not build connection pool");

    let mut conn = pool.get().expect("Could not get test connection");
    run_migrations(&mut conn).expect("Could not run migrations");

    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;

    #[test]
    fn test_migrations_apply() {
        use schema::doubts::dsl::*;

        let pool = test_connection_pool();
        let mut conn = pool.get().unwrap();
        let count: i64 = doubts.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }
}
