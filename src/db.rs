use crate::config::Config;
use crate::orm::{comments, follows, groups, posts, users};
use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

/// Opens the configured database URL.
pub async fn init_db(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url.to_owned());
    opt.max_connections(config.db_max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(config.sql_logging);

    let db = Database::connect(opt).await?;
    log::info!("init_db: connected ({:?})", db.get_database_backend());
    Ok(db)
}

/// Creates any missing table and index. Parents are created before children so
/// foreign keys resolve on backends that check them at creation time.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, groups::Entity).await?;
    create_table(db, posts::Entity).await?;
    create_table(db, comments::Entity).await?;
    create_table(db, follows::Entity).await?;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    for mut index in schema.create_index_from_entity(posts::Entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    // A follower subscribes to an author at most once.
    let follow_pair = Index::create()
        .name("idx-follows-user-author")
        .table(follows::Entity)
        .col(follows::Column::UserId)
        .col(follows::Column::AuthorId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&follow_pair)).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
