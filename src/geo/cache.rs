//! Caché de geometría por proceso.
//!
//! Se puebla de forma perezosa en el primer acceso de cada granularidad y
//! luego sólo se lee. Un fallo de descarga no se guarda: la siguiente llamada
//! vuelve a intentar.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::MapasError;
use crate::geo::fuente::FuenteGeometria;
use crate::geo::poligonos::ConjuntoPoligonos;
use crate::models::Granularidad;

#[derive(Debug, Clone, Serialize)]
pub struct EstadisticasCache {
    pub hits: u64,
    pub misses: u64,
    pub entradas: usize,
    pub granularidades: Vec<Granularidad>,
}

pub struct CacheGeometria {
    fuente: Box<dyn FuenteGeometria>,
    entradas: Mutex<HashMap<Granularidad, Arc<ConjuntoPoligonos>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheGeometria {
    pub fn new(fuente: impl FuenteGeometria + 'static) -> Self {
        Self {
            fuente: Box::new(fuente),
            entradas: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn geometria_regional(&self) -> Result<Arc<ConjuntoPoligonos>, MapasError> {
        self.obtener(Granularidad::Regional)
    }

    pub fn geometria_comunal(&self) -> Result<Arc<ConjuntoPoligonos>, MapasError> {
        self.obtener(Granularidad::Comunal)
    }

    /// Devuelve la geometría de la granularidad, descargándola si aún no está.
    ///
    /// El mutex sólo se toma para leer o insertar; la descarga ocurre fuera
    /// del bloqueo, así que dos solicitudes simultáneas pueden descargar la
    /// misma geometría y la última en terminar queda guardada.
    pub fn obtener(&self, granularidad: Granularidad) -> Result<Arc<ConjuntoPoligonos>, MapasError> {
        if let Some(existente) = self.lock_entradas().get(&granularidad) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(granularidad = %granularidad, "geometría desde caché");
            return Ok(Arc::clone(existente));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(granularidad = %granularidad, "geometría no cacheada, descargando");

        let conjunto = self
            .fuente
            .descargar(granularidad)
            .and_then(|texto| ConjuntoPoligonos::desde_geojson_str(&texto, granularidad))
            .inspect_err(|e| warn!(granularidad = %granularidad, error = %e, "geometría no disponible"))?;

        let arc = Arc::new(conjunto);
        self.lock_entradas().insert(granularidad, Arc::clone(&arc));
        Ok(arc)
    }

    pub fn estadisticas(&self) -> EstadisticasCache {
        let entradas = self.lock_entradas();
        let mut granularidades: Vec<Granularidad> = entradas.keys().copied().collect();
        granularidades.sort_by_key(|g| g.as_str());
        EstadisticasCache {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entradas: entradas.len(),
            granularidades,
        }
    }

    /// Vacía la caché (la próxima lectura vuelve a descargar).
    pub fn limpiar(&self) {
        self.lock_entradas().clear();
    }

    fn lock_entradas(&self) -> std::sync::MutexGuard<'_, HashMap<Granularidad, Arc<ConjuntoPoligonos>>> {
        // las entradas son Arc inmutables: un mutex envenenado no deja estado a medias
        self.entradas.lock().unwrap_or_else(|e| e.into_inner())
    }
}
