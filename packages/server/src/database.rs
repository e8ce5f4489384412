use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    Schema,
};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{place, place_image};

pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;

    Ok(db)
}

/// Create tables and indexes that do not exist yet.
///
/// Parents are created before children so the foreign key resolves.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    create_table(db, backend, place::Entity).await?;
    create_table(db, backend, place_image::Entity).await?;

    // Images are always read per place, in order.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_place_image_place_order")
        .table(place_image::Entity)
        .col(place_image::Column::PlaceId)
        .col(place_image::Column::Order)
        .to_owned();
    db.execute(backend.build(&stmt)).await?;

    info!("Database schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    backend: DbBackend,
    entity: E,
) -> Result<(), DbErr> {
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
