use anyhow::Context;
use rep2recall_migrate::config::Config;
use rep2recall_migrate::database::{indexes, MongoDB};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rep2recall_migrate::prepare_environment();

    let config = Config::from_env()?;
    log::info!("🚀 Bootstrapping indexes in {}", config.database_name);

    let db = MongoDB::connect(&config)
        .await
        .context("failed to create MongoDB client")?;

    indexes::ensure_indexes(&db)
        .await
        .context("failed to create indexes")?;

    Ok(())
}
