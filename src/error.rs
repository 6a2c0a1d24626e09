use thiserror::Error;

/// Errores del subsistema de mapas.
///
/// Ninguno de ellos debe llegar al usuario final: `ControladorMapas` los
/// convierte en salidas degradadas (mapa "no disponible", tabla vacía).
#[derive(Debug, Error)]
pub enum MapasError {
    #[error("Geometría no disponible: {0}")]
    GeometriaNoDisponible(String),

    #[error("Columnas obligatorias faltantes: {}", .0.join(", "))]
    EsquemaIncompatible(Vec<String>),

    #[error("Dato inválido en fila {fila}, columna '{columna}': '{valor}'")]
    DatoInvalido {
        fila: usize,
        columna: String,
        valor: String,
    },

    #[error("Formato de archivo no soportado: {0}")]
    FormatoNoSoportado(String),

    #[error("Error al dibujar el mapa: {0}")]
    Render(String),

    #[error("Configuración inválida: {0}")]
    Configuracion(String),

    #[error("Error de entrada/salida: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error de Polars: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Error de serialización: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Error SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl serde::Serialize for MapasError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
