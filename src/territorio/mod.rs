//! Lógica territorial: códigos de región, agregación y validaciones.
//!
//! Submódulos:
//! - `region`: tabla de las 16 regiones y `resolver_codigo_region`
//! - `agregador`: agregación regional/comunal y verificación cruzada
//! - `validacion`: observaciones de calidad sobre la tabla comunal

mod agregador;
mod region;
mod validacion;

pub use agregador::{
    agregar, estimar_establecimientos, verificar_consistencia, Inconsistencia,
    ESTUDIANTES_POR_ESTABLECIMIENTO,
};
pub use region::{normalizar_nombre_region, resolver_codigo_region, Region};
pub use validacion::{validar_registros, Observacion, ReporteValidacion};
