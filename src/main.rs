use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use address_batch::{
    address_job::run_address_job,
    config::BatchConfig,
    core::job::BatchStatus,
    item::{
        address::{ADDRESS_COLUMNS, AddressRecord},
        rdbc::{AddressItemBinder, MySqlItemWriter},
    },
};
use anyhow::Context;
use log::{info, warn};
use sqlx::mysql::MySqlPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BatchConfig::load()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current chunk");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let binder = AddressItemBinder;
    let writer = MySqlItemWriter::<AddressRecord>::new()
        .pool(&pool)
        .table(&config.table)
        .columns(&ADDRESS_COLUMNS)
        .item_binder(&binder);

    let result = run_address_job(&config, &writer, Some(stop.as_ref()));
    pool.close().await;
    let execution = result?;

    match execution.status {
        BatchStatus::Stopped => warn!(
            "Job {} stopped after {} records, rerun to resume",
            execution.name, execution.write_count
        ),
        _ => info!(
            "Job {} completed: {} records imported in {:?}",
            execution.name, execution.write_count, execution.duration
        ),
    }

    Ok(())
}
