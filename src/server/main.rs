use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use user_registry::adapters::HttpServer;
use user_registry::core::UserRegistry;
use user_registry::storage::UserRepository;
use user_registry::storage::memory::MemoryRepository;
use user_registry::storage::sqlite::SqliteRepository;

struct ServerConfig {
    port: u16,
    db_path: Option<String>,
    tls: Option<(PathBuf, PathBuf)>,
}

impl ServerConfig {
    fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let port = env::var("REGISTRY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let db_path = env::var("REGISTRY_DB").ok();
        let tls = match (env::var("REGISTRY_TLS_CERT"), env::var("REGISTRY_TLS_KEY")) {
            (Ok(cert), Ok(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        };
        Self { port, db_path, tls }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);

    match &config.db_path {
        Some(path) => {
            let repo = SqliteRepository::new(path).await?;
            run(HttpServer::new(UserRegistry::new(repo)), &addr, config.tls).await
        }
        None => {
            let repo = MemoryRepository::new();
            run(HttpServer::new(UserRegistry::new(repo)), &addr, config.tls).await
        }
    }
}

async fn run<R: UserRepository + 'static>(
    server: HttpServer<R>,
    addr: &str,
    tls: Option<(PathBuf, PathBuf)>,
) -> anyhow::Result<()> {
    match tls {
        Some((cert, key)) => {
            let addr: SocketAddr = addr.parse()?;
            server.serve_tls(addr, cert, key).await?;
        }
        None => server.serve(addr).await?,
    }
    Ok(())
}
