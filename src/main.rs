// --- Mapas EMTP - Archivo principal ---

use mapas_emtp::config::ConfiguracionMapas;
use mapas_emtp::run_server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ConfiguracionMapas::desde_entorno().map_err(|e| std::io::Error::other(e.to_string()))?;
    run_server(cfg).await
}
