//! Lectura de la tabla comunal de matrícula (CSV o Parquet) con polars.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, instrument};

use crate::error::MapasError;
use crate::models::RegistroTerritorial;

/// Columnas sin las cuales no se puede agregar ni unir con la geometría.
pub const COLUMNAS_OBLIGATORIAS: [&str; 4] = ["region", "comuna", "cod_comuna", "matricula_total"];

/// Origen de los registros territoriales. Cada llamada a `cargar` lee de nuevo.
pub trait FuenteRegistros: Send + Sync {
    fn cargar(&self) -> Result<Vec<RegistroTerritorial>, MapasError>;
}

/// Registros ya cargados (tests, o datos generados en el mismo proceso).
#[derive(Debug, Clone, Default)]
pub struct RegistrosEnMemoria {
    registros: Vec<RegistroTerritorial>,
}

impl RegistrosEnMemoria {
    pub fn new(registros: Vec<RegistroTerritorial>) -> Self {
        Self { registros }
    }
}

impl FuenteRegistros for RegistrosEnMemoria {
    fn cargar(&self) -> Result<Vec<RegistroTerritorial>, MapasError> {
        Ok(self.registros.clone())
    }
}

/// Archivo en disco; el formato se decide por la extensión (`.csv`, `.parquet`).
#[derive(Debug, Clone)]
pub struct ArchivoRegistros {
    ruta: PathBuf,
}

impl ArchivoRegistros {
    pub fn new(ruta: impl Into<PathBuf>) -> Self {
        Self { ruta: ruta.into() }
    }

    pub fn ruta(&self) -> &Path {
        &self.ruta
    }
}

impl FuenteRegistros for ArchivoRegistros {
    fn cargar(&self) -> Result<Vec<RegistroTerritorial>, MapasError> {
        leer_registros(&self.ruta)
    }
}

/// Lee y tipa la tabla comunal. Falla con `EsquemaIncompatible` si faltan
/// columnas obligatorias, antes de mirar cualquier fila.
#[instrument(skip(ruta), fields(ruta = %ruta.display()))]
pub fn leer_registros(ruta: &Path) -> Result<Vec<RegistroTerritorial>, MapasError> {
    let extension = ruta
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let mut df = match extension.as_str() {
        "csv" => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // todo como String
            .try_into_reader_with_file_path(Some(ruta.to_path_buf()))?
            .finish()?,
        "parquet" | "pq" => ParquetReader::new(File::open(ruta)?).finish()?,
        otro => return Err(MapasError::FormatoNoSoportado(otro.to_string())),
    };

    let normalizadas: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| normalizar_columna(c))
        .collect();
    df.set_column_names(normalizadas.iter().map(String::as_str))?;

    let faltantes = columnas_faltantes(&normalizadas);
    if !faltantes.is_empty() {
        return Err(MapasError::EsquemaIncompatible(faltantes));
    }

    let registros = registros_desde_dataframe(&df)?;
    info!(filas = df.height(), registros = registros.len(), "tabla comunal cargada");
    Ok(registros)
}

/// Nombre canónico de una columna: sin espacios, en minúsculas y con los
/// alias de año resueltos.
pub fn normalizar_columna(nombre: &str) -> String {
    let limpio = nombre.trim().to_lowercase();
    match limpio.as_str() {
        "ano" | "anio" | "year" => "año".to_string(),
        "región" => "region".to_string(),
        _ => limpio,
    }
}

pub fn columnas_faltantes(columnas: &[String]) -> Vec<String> {
    COLUMNAS_OBLIGATORIAS
        .iter()
        .filter(|req| !columnas.iter().any(|c| c == *req))
        .map(|req| req.to_string())
        .collect()
}

type ColumnaTexto = Vec<Option<String>>;

fn columna_como_texto(df: &DataFrame, nombre: &str) -> Result<Option<ColumnaTexto>, MapasError> {
    let Ok(columna) = df.column(nombre) else {
        return Ok(None);
    };
    let casteada = columna.cast(&DataType::String)?;
    let valores = casteada
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();
    Ok(Some(valores))
}

fn registros_desde_dataframe(df: &DataFrame) -> Result<Vec<RegistroTerritorial>, MapasError> {
    let nombres = [
        "año",
        "region",
        "comuna",
        "cod_comuna",
        "especialidad",
        "dependencia",
        "matricula_total",
        "matricula_hombres",
        "matricula_mujeres",
        "tasa_retencion",
    ];
    let mut columnas: HashMap<&str, ColumnaTexto> = HashMap::new();
    for nombre in nombres {
        if let Some(valores) = columna_como_texto(df, nombre)? {
            columnas.insert(nombre, valores);
        }
    }

    let celda = |columna: &str, fila: usize| celda_texto(&columnas, columna, fila);

    let mut registros = Vec::with_capacity(df.height());
    for fila in 0..df.height() {
        let cod_comuna = entero_obligatorio(celda("cod_comuna", fila), fila, "cod_comuna")?;
        let cod_comuna = u32::try_from(cod_comuna).map_err(|_| MapasError::DatoInvalido {
            fila,
            columna: "cod_comuna".to_string(),
            valor: cod_comuna.to_string(),
        })?;

        registros.push(RegistroTerritorial {
            anio: entero_opcional(celda("año", fila), fila, "año")?.and_then(|a| i32::try_from(a).ok()),
            region: celda("region", fila).unwrap_or_default().to_string(),
            comuna: celda("comuna", fila).unwrap_or_default().to_string(),
            cod_comuna,
            especialidad: celda("especialidad", fila).map(str::to_string),
            dependencia: celda("dependencia", fila).map(str::to_string),
            matricula_total: entero_obligatorio(celda("matricula_total", fila), fila, "matricula_total")?,
            matricula_hombres: entero_opcional(celda("matricula_hombres", fila), fila, "matricula_hombres")?,
            matricula_mujeres: entero_opcional(celda("matricula_mujeres", fila), fila, "matricula_mujeres")?,
            tasa_retencion: decimal_opcional(celda("tasa_retencion", fila), fila, "tasa_retencion")?,
        });
    }
    Ok(registros)
}

fn celda_texto<'a>(
    columnas: &'a HashMap<&str, ColumnaTexto>,
    columna: &str,
    fila: usize,
) -> Option<&'a str> {
    columnas
        .get(columna)
        .and_then(|v| v.get(fila))
        .and_then(|v| v.as_deref())
}

/// Entero no negativo; acepta "5101" y también "5101.0" (columnas numéricas
/// que llegaron como flotantes desde Parquet).
fn parsear_entero(valor: &str) -> Option<u64> {
    if let Ok(n) = valor.parse::<u64>() {
        return Some(n);
    }
    let f = valor.parse::<f64>().ok()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn dato_invalido(fila: usize, columna: &str, valor: &str) -> MapasError {
    MapasError::DatoInvalido {
        fila,
        columna: columna.to_string(),
        valor: valor.to_string(),
    }
}

fn entero_obligatorio(valor: Option<&str>, fila: usize, columna: &str) -> Result<u64, MapasError> {
    let v = valor.unwrap_or_default();
    parsear_entero(v).ok_or_else(|| dato_invalido(fila, columna, v))
}

fn entero_opcional(valor: Option<&str>, fila: usize, columna: &str) -> Result<Option<u64>, MapasError> {
    match valor {
        None => Ok(None),
        Some(v) => parsear_entero(v).map(Some).ok_or_else(|| dato_invalido(fila, columna, v)),
    }
}

fn decimal_opcional(valor: Option<&str>, fila: usize, columna: &str) -> Result<Option<f64>, MapasError> {
    match valor {
        None => Ok(None),
        // coma decimal de planillas chilenas
        Some(v) => v
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| dato_invalido(fila, columna, v)),
    }
}
