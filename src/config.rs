use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgConnectOptions;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    models::{
        email::{DEFAULT_BODY, DEFAULT_SUBJECT, EmailMessage},
        object::ObjectRef,
    },
    services::{kv_store::DEFAULT_REDIS_URL, readiness::RetryPolicy},
};

/// Reads one environment variable; `None` when unset.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// The real process environment.
pub fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn env_or(lookup: EnvLookup<'_>, name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(lookup: EnvLookup<'_>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        None => Ok(default),
    }
}

fn required(value: Option<String>, flag: &str, var: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{} must be configured (pass {} or set {})", var, flag, var),
    }
}

/// Command-line entry point.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Serverless cookbook: to-do app, storage, email and readiness tools"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the to-do web application
    Serve(ServeArgs),
    /// Block until Postgres accepts connections
    WaitForDb(ProbeArgs),
    /// Exercise a key-value store (set/get/incr/sadd/smembers)
    KvDemo(KvArgs),
    /// Upload a file to a bucket and list the bucket
    StorageDemo(StorageArgs),
    /// Send a plain-text email
    SendEmail(EmailArgs),
    /// Print the language-basics walkthrough
    Basics,
}

// --- serve -----------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides SERVERLESS_KIT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides SERVERLESS_KIT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// SQLite database URL (overrides SERVERLESS_KIT_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Settings for the to-do web application.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl ServerConfig {
    pub fn from_args(args: &ServeArgs, lookup: EnvLookup<'_>) -> Result<Self> {
        let env_host = env_or(lookup, "SERVERLESS_KIT_HOST", "0.0.0.0");
        let env_port = env_parse(lookup, "SERVERLESS_KIT_PORT", 8000u16)?;
        let env_db = env_or(
            lookup,
            "SERVERLESS_KIT_DATABASE_URL",
            "sqlite://./data/todo.db",
        );

        Ok(Self {
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.clone().unwrap_or(env_db),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// --- wait-for-db -----------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct ProbeArgs {
    /// Database host (overrides SERVERLESS_KIT_PG_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Database port (overrides SERVERLESS_KIT_PG_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name (overrides SERVERLESS_KIT_PG_DBNAME)
    #[arg(long)]
    pub dbname: Option<String>,

    /// User name (overrides SERVERLESS_KIT_PG_USER)
    #[arg(long)]
    pub user: Option<String>,

    /// Password (overrides SERVERLESS_KIT_PG_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Give up after this many attempts; 0 retries forever
    /// (overrides SERVERLESS_KIT_PROBE_MAX_ATTEMPTS)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Delay after the first failure in milliseconds
    /// (overrides SERVERLESS_KIT_PROBE_DELAY_MS)
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Upper bound on the delay in milliseconds
    /// (overrides SERVERLESS_KIT_PROBE_MAX_DELAY_MS)
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Growth factor between delays (overrides SERVERLESS_KIT_PROBE_MULTIPLIER)
    #[arg(long)]
    pub multiplier: Option<f64>,

    /// Retry forever at a constant one-second interval
    #[arg(long)]
    pub forever: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub policy: RetryPolicy,
}

impl ProbeConfig {
    pub fn from_args(args: &ProbeArgs, lookup: EnvLookup<'_>) -> Result<Self> {
        let env_host = env_or(lookup, "SERVERLESS_KIT_PG_HOST", "database");
        let env_port = env_parse(lookup, "SERVERLESS_KIT_PG_PORT", 5432u16)?;
        let env_db = env_or(lookup, "SERVERLESS_KIT_PG_DBNAME", "postgres");
        let env_user = env_or(lookup, "SERVERLESS_KIT_PG_USER", "postgres");
        let env_password = lookup("SERVERLESS_KIT_PG_PASSWORD");

        let policy = if args.forever {
            RetryPolicy::fixed(Duration::from_secs(1))
        } else {
            let defaults = RetryPolicy::default();
            let max_attempts = match args.max_attempts {
                Some(v) => v,
                None => env_parse(
                    lookup,
                    "SERVERLESS_KIT_PROBE_MAX_ATTEMPTS",
                    defaults.max_attempts.unwrap_or(0),
                )?,
            };
            let delay_ms = match args.delay_ms {
                Some(v) => v,
                None => env_parse(
                    lookup,
                    "SERVERLESS_KIT_PROBE_DELAY_MS",
                    defaults.initial_delay.as_millis() as u64,
                )?,
            };
            let max_delay_ms = match args.max_delay_ms {
                Some(v) => v,
                None => env_parse(
                    lookup,
                    "SERVERLESS_KIT_PROBE_MAX_DELAY_MS",
                    defaults.max_delay.as_millis() as u64,
                )?,
            };
            let multiplier = match args.multiplier {
                Some(v) => v,
                None => env_parse(lookup, "SERVERLESS_KIT_PROBE_MULTIPLIER", defaults.multiplier)?,
            };
            if !multiplier.is_finite() || multiplier < 1.0 {
                bail!("probe multiplier must be a finite number >= 1.0, got {}", multiplier);
            }

            RetryPolicy {
                max_attempts: (max_attempts > 0).then_some(max_attempts),
                initial_delay: Duration::from_millis(delay_ms),
                max_delay: Duration::from_millis(max_delay_ms.max(delay_ms)),
                multiplier,
            }
        };

        Ok(Self {
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            dbname: args.dbname.clone().unwrap_or(env_db),
            user: args.user.clone().unwrap_or(env_user),
            password: args.password.clone().or(env_password),
            policy,
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

// --- kv-demo ---------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct KvArgs {
    /// Redis URL (overrides SERVERLESS_KIT_REDIS_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Use a process-local store instead of a server
    #[arg(long)]
    pub in_memory: bool,
}

impl KvArgs {
    pub fn redis_url(&self, lookup: EnvLookup<'_>) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| env_or(lookup, "SERVERLESS_KIT_REDIS_URL", DEFAULT_REDIS_URL))
    }
}

// --- storage-demo ----------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct StorageArgs {
    /// Destination bucket (overrides SERVERLESS_KIT_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Local file to upload
    #[arg(long, default_value = "hello_world.txt")]
    pub file: PathBuf,

    /// Object key; defaults to `<SERVERLESS_KIT_KEY_PREFIX>/<file name>`
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub file: PathBuf,
    pub object: ObjectRef,
}

impl StorageConfig {
    pub fn from_args(args: &StorageArgs, lookup: EnvLookup<'_>) -> Result<Self> {
        let bucket = required(
            args.bucket.clone().or_else(|| lookup("SERVERLESS_KIT_BUCKET")),
            "--bucket",
            "SERVERLESS_KIT_BUCKET",
        )?;
        let key = match &args.key {
            Some(key) => key.clone(),
            None => {
                let prefix = env_or(lookup, "SERVERLESS_KIT_KEY_PREFIX", "examples");
                let name = args
                    .file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .with_context(|| format!("{:?} has no usable file name", args.file))?;
                let prefix = prefix.trim_matches('/');
                if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", prefix, name)
                }
            }
        };

        Ok(Self {
            file: args.file.clone(),
            object: ObjectRef::new(bucket, key),
        })
    }
}

// --- send-email ------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct EmailArgs {
    /// Sender address (overrides SERVERLESS_KIT_EMAIL_FROM)
    #[arg(long)]
    pub from: Option<String>,

    /// Recipient address, repeatable (overrides SERVERLESS_KIT_EMAIL_TO,
    /// comma separated)
    #[arg(long)]
    pub to: Vec<String>,

    /// Subject line
    #[arg(long)]
    pub subject: Option<String>,

    /// Plain-text body
    #[arg(long)]
    pub body: Option<String>,
}

fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl EmailArgs {
    pub fn message(&self, lookup: EnvLookup<'_>) -> Result<EmailMessage> {
        let from = required(
            self.from
                .clone()
                .or_else(|| lookup("SERVERLESS_KIT_EMAIL_FROM")),
            "--from",
            "SERVERLESS_KIT_EMAIL_FROM",
        )?;
        let to = if self.to.is_empty() {
            lookup("SERVERLESS_KIT_EMAIL_TO")
                .map(|raw| split_addresses(&raw))
                .unwrap_or_default()
        } else {
            self.to.clone()
        };
        if to.is_empty() {
            bail!(
                "SERVERLESS_KIT_EMAIL_TO must be configured (pass --to or set SERVERLESS_KIT_EMAIL_TO)"
            );
        }

        Ok(EmailMessage {
            from,
            to,
            subject: self.subject.clone().unwrap_or_else(|| DEFAULT_SUBJECT.into()),
            body: self.body.clone().unwrap_or_else(|| DEFAULT_BODY.into()),
        })
    }
}

// --- function runtimes -----------------------------------------------------

/// Settings for the thumbnail function.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeConfig {
    pub output_bucket: String,
    pub target_size: u32,
    /// Parent directory for per-invocation scratch workspaces.
    pub scratch_dir: PathBuf,
}

impl ResizeConfig {
    pub fn from_env(lookup: EnvLookup<'_>) -> Result<Self> {
        let output_bucket = required(
            lookup("RESIZE_OUTPUT_BUCKET"),
            "RESIZE_OUTPUT_BUCKET",
            "RESIZE_OUTPUT_BUCKET",
        )?;
        let target_size = env_parse(lookup, "RESIZE_TARGET_SIZE", 200u32)?;
        if target_size == 0 {
            bail!("RESIZE_TARGET_SIZE must be greater than zero");
        }
        let scratch_dir = lookup("RESIZE_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Ok(Self {
            output_bucket,
            target_size,
            scratch_dir,
        })
    }
}

/// Message sent by the greeting function, addressed from the environment.
pub fn say_hi_message(lookup: EnvLookup<'_>) -> Result<EmailMessage> {
    let from = required(lookup("FROM_ADDRESS"), "FROM_ADDRESS", "FROM_ADDRESS")?;
    let to = required(lookup("TO_ADDRESS"), "TO_ADDRESS", "TO_ADDRESS")?;

    Ok(EmailMessage {
        from,
        to: split_addresses(&to),
        subject: env_or(lookup, "EMAIL_SUBJECT", DEFAULT_SUBJECT),
        body: env_or(lookup, "EMAIL_BODY", DEFAULT_BODY),
    })
}
