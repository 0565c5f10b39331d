//! Command handlers called from `main` once config and logging are set up.

use std::sync::Arc;

use anyhow::Context;
use autocart_checkout::{CheckoutSettings, Orchestrator, StatusObserver, StoreRegistry, TracingObserver};
use autocart_core::{AppConfig, TaskOptions};
use tokio_util::sync::CancellationToken;

use crate::pool::{self, Summary};

/// Runs the selected tasks to completion, or until Ctrl-C.
pub(crate) async fn run(config: &AppConfig, task_filter: Option<&str>) -> anyhow::Result<Summary> {
    let registry = load_registry(config)?;
    let tasks = select_tasks(load_task_options(config)?, task_filter)?;
    let settings = CheckoutSettings::from_app_config(config);
    let observer: Arc<dyn StatusObserver> = Arc::new(TracingObserver);

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let orchestrators = tasks
        .into_iter()
        .map(|task| {
            let task_id = task.task_id.clone();
            Orchestrator::new(
                task,
                &registry,
                settings.clone(),
                Arc::clone(&observer),
                cancel.child_token(),
            )
            .with_context(|| format!("failed to prepare task '{task_id}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let reports = pool::run_pool(orchestrators, config.max_concurrent_tasks).await;
    Ok(pool::summarize(&reports))
}

/// Validates the task file and resolves every task's store.
pub(crate) fn check(config: &AppConfig) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let tasks = load_task_options(config)?;

    let mut unresolved = 0usize;
    for task in &tasks {
        match registry.resolve(&task.url) {
            Ok(storefront) => println!(
                "ok      {}  {} (store code {})",
                task.task_id, storefront.host, storefront.store.code
            ),
            Err(e) => {
                unresolved += 1;
                println!("error   {}  {e}", task.task_id);
            }
        }
    }

    if unresolved > 0 {
        anyhow::bail!("{unresolved} of {} tasks cannot be resolved", tasks.len());
    }
    println!("{} tasks ready", tasks.len());
    Ok(())
}

/// Prints the store registry in use.
pub(crate) fn stores(config: &AppConfig) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    for store in registry.stores() {
        println!(
            "{}\tcode={}\tcheckout={}\tdeposit={}",
            store.domain, store.code, store.checkout_domain, store.deposit_url
        );
    }
    Ok(())
}

fn load_registry(config: &AppConfig) -> anyhow::Result<StoreRegistry> {
    match &config.stores_path {
        Some(path) => {
            let file = autocart_core::load_stores(path)?;
            tracing::debug!(path = %path.display(), stores = file.stores.len(), "loaded store registry");
            Ok(StoreRegistry::new(file.stores))
        }
        None => Ok(StoreRegistry::builtin()),
    }
}

fn load_task_options(config: &AppConfig) -> anyhow::Result<Vec<TaskOptions>> {
    let file = autocart_core::load_tasks(&config.tasks_path)?;
    Ok(file.resolve()?)
}

/// Narrows `tasks` to the one named by `filter`, if any.
fn select_tasks(tasks: Vec<TaskOptions>, filter: Option<&str>) -> anyhow::Result<Vec<TaskOptions>> {
    let Some(id) = filter else {
        return Ok(tasks);
    };
    let selected: Vec<_> = tasks.into_iter().filter(|task| task.task_id == id).collect();
    if selected.is_empty() {
        anyhow::bail!("task '{id}' not found in task file");
    }
    Ok(selected)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received ctrl-c, cancelling tasks");
                cancel.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });
}
