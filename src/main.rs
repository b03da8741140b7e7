use std::{env, fs::File, path::Path};

use dotenv::dotenv;

use reward_ledger::{
    LedgerConfig, Platform,
    device::EnvironmentFingerprint,
    dlq::LogDLQ,
    domain::{Error, KeyValueStore},
    engine::Engine,
    ingestion::CsvReader,
    output::TableOutput,
    storage::{FileStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = LedgerConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args();
    let file_path = args
        .nth(1)
        .ok_or("usage: reward_ledger <commands.csv>")?;
    let file = File::open(Path::new(&file_path))?;
    let ingestion = CsvReader::new(file)?;

    match config.data_dir.clone() {
        Some(dir) => run(ingestion, FileStore::open(dir)?, config).await?,
        None => run(ingestion, MemoryStore::new(), config).await?,
    }

    Ok(())
}

async fn run<S: KeyValueStore>(
    ingestion: CsvReader<File>,
    store: S,
    config: LedgerConfig,
) -> Result<(), Error> {
    let platform = Platform::new(store, config)?;
    let mut engine = Engine::new(
        ingestion,
        platform,
        LogDLQ::default(),
        EnvironmentFingerprint::from_host(),
    );

    engine.process().await?;
    tracing::info!("{} command(s) rejected", engine.dlq().rejected());

    engine.flush(&mut TableOutput::stdout())
}
