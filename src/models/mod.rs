// Estructuras de datos principales

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nivel territorial de la vista de mapas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularidad {
    #[default]
    Regional,
    Comunal,
}

impl Granularidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularidad::Regional => "regional",
            Granularidad::Comunal => "comunal",
        }
    }

    /// Propiedad del GeoJSON usada como clave de unión.
    pub fn featureidkey(&self) -> &'static str {
        match self {
            Granularidad::Regional => "properties.codregion",
            Granularidad::Comunal => "properties.cod_comuna",
        }
    }

    /// KPI de la vista: (número de territorios, etiqueta).
    pub fn kpi_territorios(&self) -> (&'static str, &'static str) {
        match self {
            Granularidad::Regional => ("16", "Regiones"),
            Granularidad::Comunal => ("345", "Comunas"),
        }
    }

    /// Lectura permisiva del valor del selector: cualquier valor distinto de
    /// "comunal" se trata como regional (la vista por defecto).
    pub fn desde_selector(valor: &str) -> Self {
        valor.parse().unwrap_or_default()
    }
}

impl fmt::Display for Granularidad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularidad {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regional" | "region" | "regiones" => Ok(Granularidad::Regional),
            "comunal" | "comuna" | "comunas" => Ok(Granularidad::Comunal),
            otro => Err(format!("granularidad desconocida: {}", otro)),
        }
    }
}

/// Métrica numérica con la que se colorea un mapa o se ordena una tabla.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metrica {
    Matricula,
    Establecimientos,
}

impl Metrica {
    pub fn etiqueta(&self) -> &'static str {
        match self {
            Metrica::Matricula => "Matrícula Total",
            Metrica::Establecimientos => "N° Establecimientos",
        }
    }

    pub fn valor(&self, resumen: &ResumenTerritorial) -> u64 {
        match self {
            Metrica::Matricula => resumen.matricula_total,
            Metrica::Establecimientos => resumen.establecimientos_estimados,
        }
    }
}

impl FromStr for Metrica {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "matricula" | "matricula_total" | "matrícula" => Ok(Metrica::Matricula),
            "establecimientos" | "institution_count" => Ok(Metrica::Establecimientos),
            otro => Err(format!("métrica desconocida: {}", otro)),
        }
    }
}

/// Fila de la tabla comunal de matrícula.
///
/// El código de comuna es la clave de unión con la geometría; el código de
/// región nunca se lee del archivo, se deriva con `codigo_region()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroTerritorial {
    pub anio: Option<i32>,
    pub region: String,
    pub comuna: String,
    pub cod_comuna: u32,
    pub especialidad: Option<String>,
    pub dependencia: Option<String>,
    pub matricula_total: u64,
    pub matricula_hombres: Option<u64>,
    pub matricula_mujeres: Option<u64>,
    pub tasa_retencion: Option<f64>,
}

impl RegistroTerritorial {
    /// Registro mínimo (sin año, especialidad ni desglose por sexo).
    pub fn new(region: &str, comuna: &str, cod_comuna: u32, matricula_total: u64) -> Self {
        RegistroTerritorial {
            anio: None,
            region: region.to_string(),
            comuna: comuna.to_string(),
            cod_comuna,
            especialidad: None,
            dependencia: None,
            matricula_total,
            matricula_hombres: None,
            matricula_mujeres: None,
            tasa_retencion: None,
        }
    }

    pub fn codigo_region(&self) -> u32 {
        crate::territorio::resolver_codigo_region(self.cod_comuna)
    }
}

/// Resultado agregado por región o comuna. Se deriva por solicitud y nunca se guarda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumenTerritorial {
    /// codregion (nivel regional) o cod_comuna (nivel comunal)
    pub codigo: u32,
    pub nombre: String,
    /// Sólo a nivel comunal: región a la que pertenece la comuna.
    pub region: Option<String>,
    pub matricula_total: u64,
    pub matricula_hombres: u64,
    pub matricula_mujeres: u64,
    pub establecimientos_estimados: u64,
    /// Sólo a nivel regional: comunas distintas con registros.
    pub comunas: Option<usize>,
}

/// Filtro previo a la agregación (año, especialidad, dependencia).
/// Un campo `None` no restringe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FiltroRegistros {
    pub anio: Option<i32>,
    pub especialidad: Option<String>,
    pub dependencia: Option<String>,
}

impl FiltroRegistros {
    pub fn es_vacio(&self) -> bool {
        self.anio.is_none() && self.especialidad.is_none() && self.dependencia.is_none()
    }

    pub fn acepta(&self, registro: &RegistroTerritorial) -> bool {
        if let Some(anio) = self.anio {
            if registro.anio != Some(anio) {
                return false;
            }
        }
        if let Some(esp) = &self.especialidad {
            match &registro.especialidad {
                Some(e) if e.eq_ignore_ascii_case(esp) => {}
                _ => return false,
            }
        }
        if let Some(dep) = &self.dependencia {
            match &registro.dependencia {
                Some(d) if d.eq_ignore_ascii_case(dep) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn aplicar(&self, registros: Vec<RegistroTerritorial>) -> Vec<RegistroTerritorial> {
        if self.es_vacio() {
            return registros;
        }
        registros.into_iter().filter(|r| self.acepta(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularidad_desde_selector() {
        assert_eq!(Granularidad::desde_selector("comunal"), Granularidad::Comunal);
        assert_eq!(Granularidad::desde_selector("REGIONAL"), Granularidad::Regional);
        // valor desconocido -> vista por defecto
        assert_eq!(Granularidad::desde_selector("provincial"), Granularidad::Regional);
    }

    #[test]
    fn test_filtro_por_anio_y_dependencia() {
        let mut r = RegistroTerritorial::new("Valparaíso", "Valparaíso", 5101, 100);
        r.anio = Some(2023);
        r.dependencia = Some("Municipal".to_string());

        let f = FiltroRegistros { anio: Some(2023), especialidad: None, dependencia: Some("municipal".into()) };
        assert!(f.acepta(&r));

        let f2 = FiltroRegistros { anio: Some(2024), ..Default::default() };
        assert!(!f2.acepta(&r));

        // registro sin especialidad no pasa un filtro por especialidad
        let f3 = FiltroRegistros { especialidad: Some("Electricidad".into()), ..Default::default() };
        assert!(!f3.acepta(&r));
    }
}
