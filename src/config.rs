//! Configuración del binario desde variables de entorno (y `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::MapasError;
use crate::geo::{URL_GEOJSON_COMUNAL, URL_GEOJSON_REGIONAL};
use crate::mapas::{SEPARADOR_MILES, TOP_COMUNAS};

pub const RUTA_DATOS_POR_DEFECTO: &str = "data/processed/matricula_comunal_simulada.csv";
pub const RUTA_AUDITORIA_POR_DEFECTO: &str = "logs/audit.jsonl";
pub const BIND_POR_DEFECTO: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguracionMapas {
    pub ruta_datos: PathBuf,
    pub url_geojson_regional: String,
    pub url_geojson_comunal: String,
    /// Directorio con `regional*.geojson` y `comunas*.geojson`: si está
    /// presente la geometría se lee de disco y no se descarga.
    pub dir_geojson: Option<PathBuf>,
    pub timeout_http: Option<Duration>,
    pub ruta_auditoria: PathBuf,
    /// `sqlite://ruta`: si está presente la auditoría va a SQLite en vez de JSONL.
    pub url_auditoria_db: Option<String>,
    pub bind: String,
    pub separador_miles: String,
    pub top_comunas: usize,
}

impl Default for ConfiguracionMapas {
    fn default() -> Self {
        ConfiguracionMapas {
            ruta_datos: PathBuf::from(RUTA_DATOS_POR_DEFECTO),
            url_geojson_regional: URL_GEOJSON_REGIONAL.to_string(),
            url_geojson_comunal: URL_GEOJSON_COMUNAL.to_string(),
            dir_geojson: None,
            timeout_http: None,
            ruta_auditoria: PathBuf::from(RUTA_AUDITORIA_POR_DEFECTO),
            url_auditoria_db: None,
            bind: BIND_POR_DEFECTO.to_string(),
            separador_miles: SEPARADOR_MILES.to_string(),
            top_comunas: TOP_COMUNAS,
        }
    }
}

fn var_no_vacia(nombre: &str) -> Option<String> {
    env::var(nombre).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ConfiguracionMapas {
    /// Carga `.env` si existe y lee las variables `MAPAS_*`.
    pub fn desde_entorno() -> Result<Self, MapasError> {
        let _ = dotenv::dotenv();
        Self::desde_variables(var_no_vacia)
    }

    /// Igual que `desde_entorno`, pero con una función de lectura arbitraria.
    pub fn desde_variables(leer: impl Fn(&str) -> Option<String>) -> Result<Self, MapasError> {
        let mut cfg = Self::default();
        if let Some(v) = leer("MAPAS_DATA_PATH") {
            cfg.ruta_datos = PathBuf::from(v);
        }
        if let Some(v) = leer("MAPAS_GEOJSON_REGIONAL_URL") {
            cfg.url_geojson_regional = v;
        }
        if let Some(v) = leer("MAPAS_GEOJSON_COMUNAL_URL") {
            cfg.url_geojson_comunal = v;
        }
        if let Some(v) = leer("MAPAS_GEOJSON_DIR") {
            cfg.dir_geojson = Some(PathBuf::from(v));
        }
        if let Some(v) = leer("MAPAS_HTTP_TIMEOUT_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| MapasError::Configuracion(format!("MAPAS_HTTP_TIMEOUT_SECS inválido: {}", v)))?;
            cfg.timeout_http = Some(Duration::from_secs(secs));
        }
        if let Some(v) = leer("MAPAS_AUDIT_PATH") {
            cfg.ruta_auditoria = PathBuf::from(v);
        }
        if let Some(v) = leer("MAPAS_AUDIT_DB_URL") {
            if !(v.starts_with("sqlite://") || v.starts_with("file://")) {
                return Err(MapasError::Configuracion(format!(
                    "MAPAS_AUDIT_DB_URL usa un esquema no soportado: {}",
                    v
                )));
            }
            cfg.url_auditoria_db = Some(v);
        }
        if let Some(v) = leer("MAPAS_BIND") {
            cfg.bind = v;
        }
        if let Some(v) = leer("MAPAS_SEPARADOR_MILES") {
            cfg.separador_miles = v;
        }
        if let Some(v) = leer("MAPAS_TOP_COMUNAS") {
            cfg.top_comunas = v
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| MapasError::Configuracion(format!("MAPAS_TOP_COMUNAS inválido: {}", v)))?;
        }
        Ok(cfg)
    }
}
