use std::io::IsTerminal;

use anyhow::{Context, Result};

use reqdraft::app::ComposerApp;
use reqdraft::composer::Composer;
use reqdraft::config::{load_collections, AppConfig};
use reqdraft::db::Database;
use reqdraft::executor::RequestExecutor;
use reqdraft::history::HistoryStore;
use reqdraft::http_client::ReqwestTransport;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("loading configuration")?;
    log::debug!("Using data dir {}", config.data_dir.display());

    // History keeps working in memory if the database is unavailable
    let db = if config.persist_history {
        match Database::open(&config.history_db_path()) {
            Ok(db) => Some(db),
            Err(e) => {
                log::error!("Failed to open history database: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let collections = match &config.collections_file {
        Some(path) => load_collections(path).unwrap_or_else(|e| {
            log::warn!("Ignoring collections file: {:#}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    let transport = ReqwestTransport::new().context("building HTTP client")?;
    let mut app = ComposerApp::new(
        Composer::new(collections, HistoryStore::new()),
        RequestExecutor::new(transport),
        db,
    );
    if let Err(e) = app.restore_history(config.history_limit) {
        log::error!("Failed to load history: {:#}", e);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        app.run_interactive()
    } else {
        app.run(stdin.lock(), std::io::stdout())
    }
}
