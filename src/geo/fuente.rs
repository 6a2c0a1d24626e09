//! Origen remoto de los documentos GeoJSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::MapasError;
use crate::models::Granularidad;

pub const URL_GEOJSON_REGIONAL: &str =
    "https://raw.githubusercontent.com/fcortes/Chile-GeoJSON/master/Regional.geojson";
pub const URL_GEOJSON_COMUNAL: &str =
    "https://raw.githubusercontent.com/fcortes/Chile-GeoJSON/master/comunas.geojson";

/// Entrega el documento GeoJSON crudo de una granularidad. Es bloqueante.
pub trait FuenteGeometria: Send + Sync {
    fn descargar(&self, granularidad: Granularidad) -> Result<String, MapasError>;
}

/// Descarga por HTTP con el cliente bloqueante de reqwest.
///
/// Un solo intento por llamada; el reintento lo decide quien llama.
#[derive(Debug, Clone)]
pub struct FuenteHttp {
    url_regional: String,
    url_comunal: String,
    timeout: Option<Duration>,
}

impl Default for FuenteHttp {
    fn default() -> Self {
        Self::new(URL_GEOJSON_REGIONAL, URL_GEOJSON_COMUNAL, None)
    }
}

impl FuenteHttp {
    pub fn new(url_regional: &str, url_comunal: &str, timeout: Option<Duration>) -> Self {
        Self {
            url_regional: url_regional.to_string(),
            url_comunal: url_comunal.to_string(),
            timeout,
        }
    }

    pub fn url(&self, granularidad: Granularidad) -> &str {
        match granularidad {
            Granularidad::Regional => &self.url_regional,
            Granularidad::Comunal => &self.url_comunal,
        }
    }
}

impl FuenteGeometria for FuenteHttp {
    #[instrument(skip(self), fields(url = %self.url(granularidad)))]
    fn descargar(&self, granularidad: Granularidad) -> Result<String, MapasError> {
        let no_disponible = |e: reqwest::Error| MapasError::GeometriaNoDisponible(e.to_string());

        // el cliente bloqueante se construye aquí: nunca dentro del runtime async
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(no_disponible)?;

        let response = client.get(self.url(granularidad)).send().map_err(no_disponible)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapasError::GeometriaNoDisponible(format!(
                "HTTP {} al descargar geometría {}",
                status, granularidad
            )));
        }
        let texto = response.text().map_err(no_disponible)?;
        info!(bytes = texto.len(), "geometría descargada");
        Ok(texto)
    }
}

/// Lee la geometría desde un directorio local: el primer `regional*.geojson`
/// o `comunas*.geojson` en orden alfabético (sin distinguir mayúsculas).
/// El archivo se busca en cada llamada.
#[derive(Debug, Clone)]
pub struct FuenteArchivo {
    directorio: PathBuf,
}

impl FuenteArchivo {
    pub fn new(directorio: impl Into<PathBuf>) -> Self {
        Self { directorio: directorio.into() }
    }

    pub fn directorio(&self) -> &Path {
        &self.directorio
    }

    pub fn ruta(&self, granularidad: Granularidad) -> Result<PathBuf, MapasError> {
        let prefijo = match granularidad {
            Granularidad::Regional => "regional",
            Granularidad::Comunal => "comunas",
        };
        let entradas = fs::read_dir(&self.directorio).map_err(|e| {
            MapasError::GeometriaNoDisponible(format!("{}: {}", self.directorio.display(), e))
        })?;

        let mut candidatos: Vec<PathBuf> = entradas
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.to_lowercase())
                    .is_some_and(|n| n.starts_with(prefijo) && n.ends_with(".geojson"))
            })
            .collect();
        candidatos.sort();
        candidatos.into_iter().next().ok_or_else(|| {
            MapasError::GeometriaNoDisponible(format!(
                "no hay {}*.geojson en {}",
                prefijo,
                self.directorio.display()
            ))
        })
    }
}

impl FuenteGeometria for FuenteArchivo {
    #[instrument(skip(self), fields(directorio = %self.directorio.display()))]
    fn descargar(&self, granularidad: Granularidad) -> Result<String, MapasError> {
        let ruta = self.ruta(granularidad)?;
        let texto = fs::read_to_string(&ruta)
            .map_err(|e| MapasError::GeometriaNoDisponible(format!("{}: {}", ruta.display(), e)))?;
        info!(ruta = %ruta.display(), bytes = texto.len(), "geometría leída desde disco");
        Ok(texto)
    }
}
