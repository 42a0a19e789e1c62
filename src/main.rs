use dotenvy::dotenv;
use store_service::config::Config;
use store_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.db_pool_size)
                .map_err(|e| std::io::Error::other(format!("Failed to create pool: {e}")))?;
            run_migrations(&pool)
                .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;
            AppState::with_postgres(pool)
        }
        None => {
            log::warn!("DATABASE_URL is not set; using the in-memory store, data is lost on exit");
            AppState::in_memory()
        }
    };

    log::info!("Starting server at http://{}", config.addr());

    build_server(state, &config.host, config.port)?.await
}
