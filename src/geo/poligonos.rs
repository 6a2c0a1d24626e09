//! Conjunto de polígonos (regiones o comunas) indexado por código territorial.

use std::collections::HashMap;

use geojson::{Feature, FeatureCollection, GeoJson, Value};
use serde_json::Value as JsonValue;

use crate::error::MapasError;
use crate::models::Granularidad;

/// Geometría de referencia de una granularidad.
///
/// Se construye una vez por proceso (ver `CacheGeometria`) y es inmutable.
#[derive(Debug, Clone)]
pub struct ConjuntoPoligonos {
    granularidad: Granularidad,
    coleccion: FeatureCollection,
    indice: HashMap<u32, usize>,
}

impl ConjuntoPoligonos {
    /// Parsea un documento GeoJSON. Cualquier documento que no sea una
    /// FeatureCollection se considera geometría no disponible.
    pub fn desde_geojson_str(texto: &str, granularidad: Granularidad) -> Result<Self, MapasError> {
        let geojson: GeoJson = texto
            .parse()
            .map_err(|e| MapasError::GeometriaNoDisponible(format!("GeoJSON inválido: {}", e)))?;
        match geojson {
            GeoJson::FeatureCollection(coleccion) => Ok(Self::desde_coleccion(coleccion, granularidad)),
            _ => Err(MapasError::GeometriaNoDisponible(
                "se esperaba una FeatureCollection".to_string(),
            )),
        }
    }

    pub fn desde_coleccion(coleccion: FeatureCollection, granularidad: Granularidad) -> Self {
        let clave = propiedad_clave(granularidad);
        let mut indice = HashMap::new();
        for (i, feature) in coleccion.features.iter().enumerate() {
            if let Some(codigo) = feature.property(clave).and_then(codigo_desde_json) {
                // si un código se repite gana el primero
                indice.entry(codigo).or_insert(i);
            }
        }
        Self { granularidad, coleccion, indice }
    }

    pub fn granularidad(&self) -> Granularidad {
        self.granularidad
    }

    pub fn coleccion(&self) -> &FeatureCollection {
        &self.coleccion
    }

    pub fn len(&self) -> usize {
        self.indice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indice.is_empty()
    }

    pub fn contiene(&self, codigo: u32) -> bool {
        self.indice.contains_key(&codigo)
    }

    pub fn codigos(&self) -> Vec<u32> {
        let mut codigos: Vec<u32> = self.indice.keys().copied().collect();
        codigos.sort_unstable();
        codigos
    }

    fn feature(&self, codigo: u32) -> Option<&Feature> {
        self.indice.get(&codigo).and_then(|&i| self.coleccion.features.get(i))
    }

    /// Nombre declarado por la geometría (propiedad `Region` o `Comuna`).
    pub fn nombre(&self, codigo: u32) -> Option<String> {
        let feature = self.feature(codigo)?;
        let claves: &[&str] = match self.granularidad {
            Granularidad::Regional => &["Region", "region", "NOM_REG"],
            Granularidad::Comunal => &["Comuna", "comuna", "NOM_COM"],
        };
        claves
            .iter()
            .find_map(|k| feature.property(k).and_then(|v| v.as_str()))
            .map(str::to_string)
    }

    /// Anillos exteriores (lon, lat) del territorio; vacío si no existe.
    pub fn anillos(&self, codigo: u32) -> Vec<Vec<(f64, f64)>> {
        self.feature(codigo).map(anillos_exteriores).unwrap_or_default()
    }

    /// Anillos exteriores de todas las features, con su código si lo tienen.
    pub fn todos_los_anillos(&self) -> Vec<(Option<u32>, Vec<(f64, f64)>)> {
        let clave = propiedad_clave(self.granularidad);
        self.coleccion
            .features
            .iter()
            .flat_map(|f| {
                let codigo = f.property(clave).and_then(codigo_desde_json);
                anillos_exteriores(f).into_iter().map(move |a| (codigo, a))
            })
            .collect()
    }

    /// Caja envolvente (lon_min, lon_max, lat_min, lat_max) de toda la colección.
    pub fn limites(&self) -> Option<(f64, f64, f64, f64)> {
        let mut caja: Option<(f64, f64, f64, f64)> = None;
        for (_, anillo) in self.todos_los_anillos() {
            for (x, y) in anillo {
                caja = Some(match caja {
                    None => (x, x, y, y),
                    Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
                });
            }
        }
        caja
    }
}

fn propiedad_clave(granularidad: Granularidad) -> &'static str {
    match granularidad {
        Granularidad::Regional => "codregion",
        Granularidad::Comunal => "cod_comuna",
    }
}

/// Los códigos llegan como número o como texto según la fuente.
fn codigo_desde_json(valor: &JsonValue) -> Option<u32> {
    match valor {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn anillos_exteriores(feature: &Feature) -> Vec<Vec<(f64, f64)>> {
    let Some(geometria) = &feature.geometry else {
        return Vec::new();
    };
    let a_puntos = |anillo: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        anillo
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| (p[0], p[1]))
            .collect()
    };
    match &geometria.value {
        Value::Polygon(anillos) => anillos.first().map(a_puntos).into_iter().collect(),
        Value::MultiPolygon(poligonos) => poligonos
            .iter()
            .filter_map(|anillos| anillos.first().map(a_puntos))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOS_REGIONES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"codregion": 5, "Region": "Región de Valparaíso"},
             "geometry": {"type": "Polygon", "coordinates": [[[-72,-33],[-71,-33],[-71,-32],[-72,-33]]]}},
            {"type": "Feature", "properties": {"codregion": "13", "Region": "Región Metropolitana de Santiago"},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[-71,-34],[-70,-34],[-70,-33],[-71,-34]]]]}}
        ]
    }"#;

    #[test]
    fn test_indice_acepta_numero_y_texto() {
        let set = ConjuntoPoligonos::desde_geojson_str(DOS_REGIONES, Granularidad::Regional).unwrap();
        assert_eq!(set.codigos(), vec![5, 13]);
        assert!(set.contiene(13));
        assert!(!set.contiene(8));
        assert_eq!(set.nombre(5).as_deref(), Some("Región de Valparaíso"));
        assert_eq!(set.anillos(13).len(), 1);
        assert_eq!(set.limites(), Some((-72.0, -70.0, -34.0, -32.0)));
    }

    #[test]
    fn test_documento_invalido() {
        let err = ConjuntoPoligonos::desde_geojson_str("<html>", Granularidad::Comunal).unwrap_err();
        assert!(matches!(err, MapasError::GeometriaNoDisponible(_)));
    }
}
