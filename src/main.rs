use anyhow::{Context, Result};
use clap::Parser;
use serverless_kit::{
    config::{
        Cli, Command, EmailArgs, KvArgs, ProbeArgs, ProbeConfig, ServeArgs, ServerConfig,
        StorageArgs, StorageConfig, process_env,
    },
    db, routes,
    services::{
        kv_store::{KeyValueStore, MemoryKeyValueStore, RedisStore, run_smoke_test},
        mailer::{Mailer, SesMailer},
        object_store::{S3ObjectStore, upload_and_list},
        readiness::{PostgresProbe, wait_until_ready},
        todo_service::TodoService,
        walkthrough,
    },
    telemetry,
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    telemetry::init_tracing("info");

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::WaitForDb(args) => wait_for_db(args).await,
        Command::KvDemo(args) => kv_demo(args).await,
        Command::StorageDemo(args) => storage_demo(args).await,
        Command::SendEmail(args) => send_email(args).await,
        Command::Basics => {
            for line in walkthrough::run() {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let cfg = ServerConfig::from_args(&args, &process_env)?;
    tracing::info!("Starting to-do app with config: {:?}", cfg);

    let pool = db::connect_sqlite(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;

    // --- Handle migration mode ---
    if args.migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    let service = TodoService::new(Arc::new(pool));
    let app = routes::routes::app(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn wait_for_db(args: ProbeArgs) -> Result<()> {
    let cfg = ProbeConfig::from_args(&args, &process_env)?;
    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        dbname = %cfg.dbname,
        user = %cfg.user,
        max_attempts = ?cfg.policy.max_attempts,
        "waiting for database"
    );

    let mut probe = PostgresProbe::new(cfg.connect_options());
    let report = wait_until_ready(&mut probe, &cfg.policy).await?;
    println!(
        "Connection to Postgres succeeded after {} attempt(s) in {:.1}s",
        report.attempts,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

async fn kv_demo(args: KvArgs) -> Result<()> {
    let store: Box<dyn KeyValueStore> = if args.in_memory {
        Box::new(MemoryKeyValueStore::new())
    } else {
        let url = args.redis_url(&process_env);
        Box::new(
            RedisStore::connect(&url)
                .await
                .with_context(|| format!("connecting to {}", url))?,
        )
    };

    let report = run_smoke_test(store.as_ref()).await?;
    println!("get(key) = {}", report.value.as_deref().unwrap_or("<none>"));
    println!("incr(counter) = {}", report.counter);
    println!("smembers(connections) = {:?}", report.connections);
    Ok(())
}

async fn storage_demo(args: StorageArgs) -> Result<()> {
    let cfg = StorageConfig::from_args(&args, &process_env)?;
    let store = S3ObjectStore::from_env().await;

    let keys = upload_and_list(&store, &cfg.file, &cfg.object)
        .await
        .with_context(|| format!("uploading {} to {}", cfg.file.display(), cfg.object))?;
    println!("{:?}", keys);
    Ok(())
}

async fn send_email(args: EmailArgs) -> Result<()> {
    let message = args.message(&process_env)?;
    message.validate()?;

    let mailer = SesMailer::from_env().await;
    let receipt = mailer.send(&message).await?;
    println!(
        "Message accepted: {}",
        receipt.message_id.as_deref().unwrap_or("<no id>")
    );
    Ok(())
}
