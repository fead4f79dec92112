use anyhow::Context;
use rep2recall_migrate::config::{self, Config};
use rep2recall_migrate::database::MongoDB;
use rep2recall_migrate::seeds;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rep2recall_migrate::prepare_environment();

    let config = Config::from_env()?;
    let email = config::default_user_from_env()?;

    let db = MongoDB::connect(&config)
        .await
        .context("failed to create MongoDB client")?;

    seeds::seed_default_user(&db, &email)
        .await
        .with_context(|| format!("failed to seed default user {email}"))?;

    Ok(())
}
