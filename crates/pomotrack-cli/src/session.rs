//! Engine lifecycle for one CLI invocation.

use std::future::Future;
use std::sync::Arc;

use pomotrack_core::{Config, EngineOptions, LogNotifier, Notifier, SessionEngine, SqliteStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn block_on<F: Future>(future: F) -> CliResult<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Load the engine from the default SQLite database.
pub async fn open(config: &Config, notifier: Arc<dyn Notifier>) -> CliResult<SessionEngine> {
    let store = SqliteStore::open_default()?;
    let options = EngineOptions::from_config(config)?;
    Ok(SessionEngine::load(Arc::new(store), notifier, options).await)
}

/// Run a single action against a freshly loaded engine, then flush.
pub fn one_shot<F, Fut, T>(config: &Config, action: F) -> CliResult<T>
where
    F: FnOnce(SessionEngine) -> Fut,
    Fut: Future<Output = T>,
{
    block_on(async {
        let engine = open(config, Arc::new(LogNotifier)).await?;
        let output = action(engine.clone()).await;
        engine.shutdown().await;
        Ok::<T, Box<dyn std::error::Error>>(output)
    })?
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
