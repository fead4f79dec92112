use anyhow::{bail, Context};
use rep2recall_migrate::config::Config;
use rep2recall_migrate::database::indexes::{self, IndexStatus};
use rep2recall_migrate::database::MongoDB;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rep2recall_migrate::prepare_environment();

    let config = Config::from_env()?;
    let db = MongoDB::connect(&config)
        .await
        .context("failed to create MongoDB client")?;

    let reports = indexes::check_indexes(&db)
        .await
        .context("failed to list indexes")?;

    for report in &reports {
        match &report.status {
            IndexStatus::Present => log::info!("   ✅ {}", report.spec.describe()),
            IndexStatus::Missing => log::warn!("   ❌ {} is missing", report.spec.describe()),
            IndexStatus::Mismatch { keys, unique } => log::warn!(
                "   ⚠️  {} differs on the server: keys {}, unique {}",
                report.spec.describe(),
                keys,
                unique
            ),
        }
    }

    let bad = reports.iter().filter(|r| !r.is_present()).count();
    if bad > 0 {
        bail!("{} of {} indexes missing or mismatched", bad, reports.len());
    }

    log::info!("✅ All {} indexes in place", reports.len());
    Ok(())
}
