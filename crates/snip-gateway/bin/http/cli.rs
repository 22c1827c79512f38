use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DELETION_QUEUE_CAPACITY_ENV: &str = "DELETION_QUEUE_CAPACITY";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_FILE_STORAGE_PATH: &str = "/tmp/short-url-db.json";
pub const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip-server")]
pub struct CLI {
    #[arg(short = 'a', long, env = SERVER_ADDRESS_ENV, default_value = DEFAULT_SERVER_ADDRESS)]
    pub server_address: SocketAddr,

    /// Base that short URLs are built on.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Journal file for the in-memory store; empty disables persistence.
    #[arg(
        short = 'f',
        long,
        env = FILE_STORAGE_PATH_ENV,
        default_value = DEFAULT_FILE_STORAGE_PATH,
    )]
    pub file_storage_path: String,

    /// PostgreSQL DSN; takes precedence over the file storage.
    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    #[arg(
        short = 'j',
        long,
        env = JWT_SECRET_ENV,
        default_value = DEFAULT_JWT_SECRET,
        hide_env_values = true
    )]
    pub jwt_secret: String,

    #[arg(
        long,
        env = DELETION_QUEUE_CAPACITY_ENV,
        default_value_t = snip_storage::DEFAULT_QUEUE_CAPACITY
    )]
    pub deletion_queue_capacity: usize,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
