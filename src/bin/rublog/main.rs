use actix_web::cookie::Key;
use actix_web::web::Data;
use actix_web::HttpServer;
use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use rublog::cache::SystemClock;
use rublog::config::Config;
use rublog::db::{create_schema, init_db};
use rublog::group::{create_group, NewGroup};
use rublog::user::{create_staff_user, CreateUserError};
use rublog::MainData;
use std::sync::Arc;

const USAGE: &str = "usage:
    rublog                                        run the web server
    rublog create-group <slug> <title> [description]
    rublog create-staff <username> <password>";

#[actix_web::main]
async fn main() -> Result<()> {
    init_lib_mods();

    let config = Config::from_env().context("Configuration is invalid.")?;
    let db = init_db(&config)
        .await
        .context("Database failed to initialize.")?;
    create_schema(&db).await.context("Schema creation failed.")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let data = MainData::new(config, db, Arc::new(SystemClock));
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => serve(data).await,
        ["create-group", slug, title, rest @ ..] if rest.len() <= 1 => {
            let group = create_group(
                &data.db,
                NewGroup {
                    title,
                    slug,
                    description: rest.first().copied(),
                },
            )
            .await?;
            log::info!("Created group {} ({})", group.slug, group.id);
            Ok(())
        }
        ["create-staff", username, password] => {
            let user = match create_staff_user(&data.db, &data.argon2, username, password).await {
                Ok(user) => user,
                Err(CreateUserError::Invalid(errors)) => {
                    return Err(anyhow!("Could not create {}: {}", username, errors))
                }
                Err(e) => return Err(anyhow!("Could not create {}: {:?}", username, e)),
            };
            log::info!("Created staff user {} ({})", user.username, user.id);
            Ok(())
        }
        _ => Err(anyhow!(USAGE)),
    }
}

async fn serve(data: MainData) -> Result<()> {
    data.media
        .init()
        .with_context(|| format!("Media directory {:?} is not writable.", data.media.root()))?;

    let secret_key = match &data.config.secret_key {
        Some(bytes) => Key::try_from(bytes.as_slice()).context("SECRET_KEY is not usable.")?,
        None => {
            log::warn!("SECRET_KEY is not set; sessions will not survive a restart.");
            Key::generate()
        }
    };

    let bind_address = data.config.bind_address.to_owned();
    let data = Data::new(data);
    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || rublog::web::build_app(data.clone(), secret_key.clone()))
        .bind(&bind_address)?
        .run()
        .await?;
    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
