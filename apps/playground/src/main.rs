//! playground: drives every data-provider operation against in-memory adapters.
//!
//! Installs a `posts` resource backed by a [`MemoryStore`] (both families) and a
//! `comments` resource that only serves `getOne`, then walks through the nine
//! operations with bound defaults, nested scopes and the expected failures.
//! Each step is logged and a JSON summary is printed at the end.
//!
//! Run:
//! ```bash
//! # pretty logs (default)
//! cargo run -p playground
//!
//! # only the synchronous family, json logs, bigger seed
//! LOG_FORMAT=json PLAYGROUND_FAMILY=sync PLAYGROUND_SEED=20 cargo run -p playground
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::process;
use std::sync::Arc;

use data_providers::adapters::dummy;
use data_providers::adapters::memory::MemoryStore;
use data_providers::ops::{
    CreateMany, CreateOne, DeleteMany, DeleteOne, GetList, GetMany, GetOne, UpdateMany, UpdateOne,
};
use data_providers::{
    scope, Accessor, AsyncRegistry, DataError, Family, GetListParams, GetOneParams, Identifier,
    OperationKind, Pagination, Record, ScopedRegistry, Sort, SortOrder, SyncRegistry,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Outcome of one accessor invocation.
#[derive(Debug, Serialize)]
struct Step {
    family: &'static str,
    resource: String,
    operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn step<F, O>(accessor: &Accessor<F, O>, outcome: Result<O::Response, DataError>) -> Step
where
    F: Family,
    O: OperationKind,
    O::Response: Serialize,
{
    let (result, error) = match outcome.map_err(|e| e.to_string()) {
        Ok(value) => match serde_json::to_value(value) {
            Ok(rendered) => (Some(rendered), None),
            Err(e) => (None, Some(e.to_string())),
        },
        Err(e) => {
            warn!(
                resource = %accessor.resource(),
                operation = %accessor.operation(),
                error = %e,
                "operation failed"
            );
            (None, Some(e))
        }
    };
    Step {
        family: F::KIND.as_str(),
        resource: accessor.resource().to_string(),
        operation: accessor.operation().as_str(),
        result,
        error,
    }
}

fn seed_records(n: usize) -> Vec<Record> {
    (1..=n)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("post {}", i),
                "status": if i % 2 == 0 { "published" } else { "draft" },
            })
        })
        .collect()
}

fn build_scope(cfg: &config::Config, posts: &Arc<MemoryStore>) -> ScopedRegistry {
    let comments = json!({"fakeResponse": true});
    let async_registry = cfg.family.runs_async().then(|| {
        AsyncRegistry::new()
            .with("posts", posts.provider())
            .with("comments", dummy::only_get_one(comments.clone()))
    });
    let sync_registry = cfg.family.runs_sync().then(|| {
        SyncRegistry::new()
            .with("posts", posts.provider())
            .with("comments", dummy::only_get_one(comments.clone()))
    });
    ScopedRegistry::install(async_registry, sync_registry)
}

/// Async walk-through, picking the scope up from the task-local binding.
async fn run_async() -> Vec<Step> {
    let scope = scope::current();
    let mut steps = Vec::new();

    let list = scope.asynchronous::<GetList>("posts").with_defaults(GetListParams {
        pagination: Some(Pagination {
            page: None,
            limit: Some(2),
        }),
        sort: Some(Sort {
            field: "title".into(),
            order: SortOrder::Asc,
        }),
        filter: None,
    });
    steps.push(step(&list, list.run().await));

    let create = scope
        .asynchronous::<CreateOne>("posts")
        .with_defaults(json!({"status": "draft"}));
    steps.push(step(&create, create.call(json!({"title": "hello"})).await));

    let create_many = scope
        .asynchronous::<CreateMany>("posts")
        .with_defaults(vec![json!({"title": "pinned"})]);
    steps.push(step(
        &create_many,
        create_many
            .call(vec![json!({"title": "x"}), json!({"title": "y"})])
            .await,
    ));

    let publish = scope
        .asynchronous::<UpdateOne>("posts")
        .with_defaults(json!({"status": "published"}));
    steps.push(step(&publish, publish.call(json!({"id": 1})).await));

    let get_many = scope.asynchronous::<GetMany>("posts");
    steps.push(step(
        &get_many,
        get_many.call(vec![Identifier::Int(1), Identifier::Int(2)]).await,
    ));

    let comment = scope.asynchronous::<GetOne>("comments");
    steps.push(step(&comment, comment.run().await));

    let comment_list = scope.asynchronous::<GetList>("comments");
    steps.push(step(&comment_list, comment_list.run().await));

    let delete = scope.asynchronous::<DeleteOne>("posts");
    steps.push(step(&delete, delete.call(1).await));
    steps.push(step(&delete, delete.run().await));

    let unknown = scope.asynchronous::<GetOne>("users");
    steps.push(step(&unknown, unknown.run().await));

    steps
}

fn run_sync(scope: &ScopedRegistry) -> Vec<Step> {
    let mut steps = Vec::new();

    let get_one = scope.synchronous::<GetOne>("posts");
    steps.push(step(&get_one, get_one.call(GetOneParams::by_id(2))));

    let archive = scope
        .synchronous::<UpdateMany>("posts")
        .with_defaults(vec![json!({"id": 2, "status": "archived"})]);
    steps.push(step(&archive, archive.run()));

    let purge = scope
        .synchronous::<DeleteMany>("posts")
        .with_defaults(vec![Identifier::Int(2)]);
    steps.push(step(&purge, purge.call(vec![Identifier::Int(3)])));

    // A nested scope shadows `posts` with an empty store; the outer scope is untouched.
    let inner = scope.nested(
        None,
        Some(SyncRegistry::new().with("posts", Arc::new(MemoryStore::new()).provider())),
    );
    let inner_list = inner.synchronous::<GetList>("posts");
    steps.push(step(&inner_list, inner_list.run()));
    let outer_list = scope.synchronous::<GetList>("posts");
    steps.push(step(&outer_list, outer_list.run()));

    steps
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    init_tracing(&cfg);

    let posts = match MemoryStore::seeded(seed_records(cfg.seed)) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("failed to seed posts: {}", e);
            process::exit(1);
        }
    };
    let installed = build_scope(&cfg, &posts);
    info!(family = ?cfg.family, seed = cfg.seed, "playground starting");

    let mut steps = Vec::new();
    if cfg.family.runs_async() {
        steps.extend(scope::scoped(installed.clone(), run_async()).await);
    }
    if cfg.family.runs_sync() {
        steps.extend(run_sync(&installed));
    }

    let failed = steps.iter().filter(|s| s.error.is_some()).count();
    match posts.len() {
        Ok(remaining) => info!(
            steps = steps.len(),
            failed,
            remaining_posts = remaining,
            "playground finished"
        ),
        Err(e) => warn!(
            steps = steps.len(),
            failed,
            error = %e,
            "playground finished, posts store unreadable"
        ),
    }

    match serde_json::to_string_pretty(&steps) {
        Ok(summary) => println!("{}", summary),
        Err(e) => {
            eprintln!("failed to render summary: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(cfg: &config::Config) {
    // Logs go to stderr so stdout carries only the JSON summary.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
