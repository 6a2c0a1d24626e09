//! Ingesta de la tabla comunal de matrícula.

mod carga;

pub use carga::{
    columnas_faltantes, leer_registros, normalizar_columna, ArchivoRegistros, FuenteRegistros,
    RegistrosEnMemoria, COLUMNAS_OBLIGATORIAS,
};
