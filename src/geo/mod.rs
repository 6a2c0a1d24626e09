//! Geometría de regiones y comunas.
//!
//! Submódulos:
//! - `fuente`: origen del GeoJSON (`FuenteGeometria`, `FuenteHttp`, `FuenteArchivo`)
//! - `poligonos`: `ConjuntoPoligonos`, índice por código territorial
//! - `cache`: `CacheGeometria`, caché por proceso con estadísticas

mod cache;
mod fuente;
mod poligonos;

pub use cache::{CacheGeometria, EstadisticasCache};
pub use fuente::{FuenteArchivo, FuenteGeometria, FuenteHttp, URL_GEOJSON_COMUNAL, URL_GEOJSON_REGIONAL};
pub use poligonos::ConjuntoPoligonos;
