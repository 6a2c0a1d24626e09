use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing::{info, warn};

use crate::auditoria::{Auditoria, AuditoriaJsonl, AuditoriaSqlite};
use crate::config::ConfiguracionMapas;
use crate::datos::ArchivoRegistros;
use crate::error::MapasError;
use crate::geo::{CacheGeometria, FuenteArchivo, FuenteHttp};
use crate::mapas::{ControladorMapas, OpcionesVista};
use crate::server_handlers::{cache_handler, geometria_handler, help_handler, mapas_handler, mapas_svg_handler};

/// Arma el controlador con las fuentes reales descritas por la configuración.
pub fn construir_controlador(cfg: &ConfiguracionMapas) -> Result<ControladorMapas, MapasError> {
    let geometria = Arc::new(match &cfg.dir_geojson {
        Some(dir) => {
            info!(directorio = %dir.display(), "geometría desde disco");
            CacheGeometria::new(FuenteArchivo::new(dir.clone()))
        }
        None => CacheGeometria::new(FuenteHttp::new(
            &cfg.url_geojson_regional,
            &cfg.url_geojson_comunal,
            cfg.timeout_http,
        )),
    });
    let registros = Arc::new(ArchivoRegistros::new(cfg.ruta_datos.clone()));

    let auditoria: Arc<dyn Auditoria> = match &cfg.url_auditoria_db {
        Some(url) => Arc::new(AuditoriaSqlite::abrir(url)?),
        None => Arc::new(AuditoriaJsonl::new(cfg.ruta_auditoria.clone())?),
    };

    Ok(ControladorMapas::new(registros, geometria)
        .con_auditoria(auditoria)
        .con_opciones(OpcionesVista {
            separador_miles: cfg.separador_miles.clone(),
            top_comunas: cfg.top_comunas,
        }))
}

pub async fn run_server(cfg: ConfiguracionMapas) -> std::io::Result<()> {
    let controlador = match construir_controlador(&cfg) {
        Ok(c) => web::Data::new(c),
        Err(e) => {
            warn!(error = %e, "no se pudo inicializar la auditoría");
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    if !cfg.ruta_datos.exists() {
        warn!(ruta = %cfg.ruta_datos.display(), "la tabla comunal no existe; los mapas saldrán como no disponibles");
    }

    info!(bind = %cfg.bind, datos = %cfg.ruta_datos.display(), "iniciando servidor de mapas");
    HttpServer::new(move || {
        App::new()
            .app_data(controlador.clone())
            .route("/mapas", web::get().to(mapas_handler))
            .route("/mapas/svg", web::get().to(mapas_svg_handler))
            .route("/mapas/geometria/{granularidad}", web::get().to(geometria_handler))
            .route("/mapas/cache", web::get().to(cache_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(&cfg.bind)?
    .run()
    .await
}
