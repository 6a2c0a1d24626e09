#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mapas_emtp::error::MapasError;
use mapas_emtp::geo::{ConjuntoPoligonos, FuenteGeometria};
use mapas_emtp::models::{Granularidad, RegistroTerritorial};

/// Fuente de geometría sin red: responde con el documento configurado por
/// granularidad, o falla si no hay ninguno. Los clones comparten estado, así
/// el test puede seguir controlando la fuente después de entregarla a la caché.
#[derive(Clone, Default)]
pub struct FuenteFalsa {
    documentos: Arc<Mutex<HashMap<Granularidad, String>>>,
    llamadas: Arc<AtomicUsize>,
}

impl FuenteFalsa {
    pub fn con(granularidad: Granularidad, documento: String) -> Self {
        let f = FuenteFalsa::default();
        f.poner(granularidad, documento);
        f
    }

    pub fn poner(&self, granularidad: Granularidad, documento: String) {
        self.documentos.lock().unwrap().insert(granularidad, documento);
    }

    pub fn quitar(&self, granularidad: Granularidad) {
        self.documentos.lock().unwrap().remove(&granularidad);
    }

    pub fn llamadas(&self) -> usize {
        self.llamadas.load(Ordering::SeqCst)
    }
}

impl FuenteGeometria for FuenteFalsa {
    fn descargar(&self, granularidad: Granularidad) -> Result<String, MapasError> {
        self.llamadas.fetch_add(1, Ordering::SeqCst);
        self.documentos
            .lock()
            .unwrap()
            .get(&granularidad)
            .cloned()
            .ok_or_else(|| MapasError::GeometriaNoDisponible("sin conexión".to_string()))
    }
}

/// FeatureCollection con un cuadrado por código, bajo la propiedad que
/// corresponde a la granularidad.
pub fn geojson_cuadrados(granularidad: Granularidad, codigos: &[u32]) -> String {
    let clave = match granularidad {
        Granularidad::Regional => "codregion",
        Granularidad::Comunal => "cod_comuna",
    };
    let features: Vec<String> = codigos
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let x = -75.0 + i as f64 * 0.5;
            let y = -20.0 - i as f64 * 0.5;
            format!(
                r#"{{"type":"Feature","properties":{{"{clave}":{c},"nombre":"T{c}"}},
                   "geometry":{{"type":"Polygon","coordinates":[[[{x},{y}],[{x2},{y}],[{x2},{y2}],[{x},{y2}],[{x},{y}]]]}}}}"#,
                clave = clave,
                c = c,
                x = x,
                y = y,
                x2 = x + 0.4,
                y2 = y - 0.4
            )
        })
        .collect();
    format!(r#"{{"type":"FeatureCollection","features":[{}]}}"#, features.join(","))
}

pub fn poligonos(granularidad: Granularidad, codigos: &[u32]) -> ConjuntoPoligonos {
    ConjuntoPoligonos::desde_geojson_str(&geojson_cuadrados(granularidad, codigos), granularidad)
        .expect("geojson de prueba válido")
}

/// Las 16 regiones.
pub fn codigos_regiones() -> Vec<u32> {
    (1..=16).collect()
}

/// Una tabla sintética: `por_region` comunas en cada una de las 16 regiones,
/// con matrícula creciente.
pub fn registros_sinteticos(por_region: u32) -> Vec<RegistroTerritorial> {
    let mut out = Vec::new();
    for region in mapas_emtp::territorio::Region::todas() {
        for i in 1..=por_region {
            let cod = region.codigo() * 1000 + 100 + i;
            let matricula = (region.codigo() as u64) * 37 + (i as u64) * 11;
            let mut r = RegistroTerritorial::new(region.nombre(), &format!("Comuna {}", cod), cod, matricula);
            r.anio = Some(if i % 2 == 0 { 2023 } else { 2024 });
            out.push(r);
        }
    }
    out
}

pub fn ruta_temporal(nombre: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!("mapas_emtp_{}_{}_{}", std::process::id(), nanos, nombre))
}
