use crate::entities::{
    blacklisted_tokens, countries, film_countries, film_genres, film_languages, film_studios,
    film_themes, films, genres, languages, outstanding_tokens, studios, themes, user_follows,
    users,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema, Statement};
use std::env;
use std::time::Duration;
use tracing::info;

const INDEXES: &[&str] = &[
    // Reverse direction of the follow edge: "who follows X"
    "CREATE INDEX IF NOT EXISTS idx_user_follows_followee ON user_follows(followee_id, follower_id)",
    "CREATE INDEX IF NOT EXISTS idx_studios_country ON studios(country_id)",
    "CREATE INDEX IF NOT EXISTS idx_films_year ON films(year)",
    "CREATE INDEX IF NOT EXISTS idx_outstanding_tokens_expires ON outstanding_tokens(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_blacklisted_tokens_expires ON blacklisted_tokens(expires_at)",
];

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    crate::infrastructure::seed::bootstrap_admin(&db).await?;

    Ok(db)
}

/// Creates every table that does not exist yet, parents before children, then
/// the secondary indexes.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    let stmts = vec![
        schema.create_table_from_entity(users::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(user_follows::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(outstanding_tokens::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(blacklisted_tokens::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(genres::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(themes::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(countries::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(languages::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(studios::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(films::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(film_genres::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(film_themes::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(film_studios::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(film_countries::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(film_languages::Entity).if_not_exists().to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    for index in INDEXES {
        db.execute(Statement::from_string(builder, index.to_string()))
            .await?;
    }

    info!("✅ Schema is up to date");
    Ok(())
}
