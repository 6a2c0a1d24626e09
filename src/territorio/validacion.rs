//! Validaciones no fatales sobre la tabla comunal.
//!
//! Ninguna de estas observaciones detiene el pipeline de mapas; se reportan
//! para que quien mantiene los datos pueda corregirlos.

use serde::Serialize;
use tracing::warn;

use crate::models::RegistroTerritorial;
use crate::territorio::region::{resolver_codigo_region, Region};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Observacion {
    /// hombres + mujeres no coincide con el total
    SumaPorSexo { fila: usize, cod_comuna: u32, hombres: u64, mujeres: u64, total: u64 },
    TasaRetencionFueraDeRango { fila: usize, cod_comuna: u32, tasa: f64 },
    /// El nombre de región no corresponde a la región derivada del código
    RegionInconsistente { fila: usize, cod_comuna: u32, region: String, esperada: String },
    CodigoComunaInvalido { fila: usize, cod_comuna: u32 },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReporteValidacion {
    pub registros: usize,
    pub observaciones: Vec<Observacion>,
}

impl ReporteValidacion {
    pub fn es_valido(&self) -> bool {
        self.observaciones.is_empty()
    }
}

/// Revisa cada registro y acumula observaciones.
///
/// La tasa de retención se acepta como fracción `[0, 1]` o como porcentaje
/// `[0, 100]`: si algún registro supera 1 se asume que toda la columna viene en
/// porcentaje.
pub fn validar_registros(registros: &[RegistroTerritorial]) -> ReporteValidacion {
    let en_porcentaje = registros
        .iter()
        .filter_map(|r| r.tasa_retencion)
        .any(|t| t > 1.0);
    let maximo_tasa = if en_porcentaje { 100.0 } else { 1.0 };

    let mut observaciones = Vec::new();
    for (fila, r) in registros.iter().enumerate() {
        if !(1000..=99_999).contains(&r.cod_comuna) {
            observaciones.push(Observacion::CodigoComunaInvalido { fila, cod_comuna: r.cod_comuna });
        }

        if let (Some(h), Some(m)) = (r.matricula_hombres, r.matricula_mujeres) {
            if h.checked_add(m) != Some(r.matricula_total) {
                observaciones.push(Observacion::SumaPorSexo {
                    fila,
                    cod_comuna: r.cod_comuna,
                    hombres: h,
                    mujeres: m,
                    total: r.matricula_total,
                });
            }
        }

        if let Some(tasa) = r.tasa_retencion {
            if !(0.0..=maximo_tasa).contains(&tasa) {
                observaciones.push(Observacion::TasaRetencionFueraDeRango { fila, cod_comuna: r.cod_comuna, tasa });
            }
        }

        if let Some(esperada) = Region::desde_codigo(resolver_codigo_region(r.cod_comuna)) {
            if Region::desde_nombre(&r.region) != Some(esperada) {
                observaciones.push(Observacion::RegionInconsistente {
                    fila,
                    cod_comuna: r.cod_comuna,
                    region: r.region.clone(),
                    esperada: esperada.nombre().to_string(),
                });
            }
        }
    }

    if !observaciones.is_empty() {
        warn!(
            registros = registros.len(),
            observaciones = observaciones.len(),
            "la tabla comunal tiene observaciones de calidad"
        );
    }

    ReporteValidacion { registros: registros.len(), observaciones }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registro_limpio_sin_observaciones() {
        let mut r = RegistroTerritorial::new("Valparaíso", "Casablanca", 5102, 200);
        r.matricula_hombres = Some(120);
        r.matricula_mujeres = Some(80);
        r.tasa_retencion = Some(0.91);
        assert!(validar_registros(&[r]).es_valido());
    }

    #[test]
    fn test_detecta_region_inconsistente_y_suma() {
        let mut r = RegistroTerritorial::new("Atacama", "Casablanca", 5102, 200);
        r.matricula_hombres = Some(100);
        r.matricula_mujeres = Some(50);
        let reporte = validar_registros(&[r]);
        assert_eq!(reporte.observaciones.len(), 2);
        assert!(matches!(reporte.observaciones[0], Observacion::SumaPorSexo { total: 200, .. }));
        assert!(matches!(
            &reporte.observaciones[1],
            Observacion::RegionInconsistente { esperada, .. } if esperada == "Valparaíso"
        ));
    }

    #[test]
    fn test_tasa_en_porcentaje() {
        let mut a = RegistroTerritorial::new("Valparaíso", "Valparaíso", 5101, 10);
        a.tasa_retencion = Some(87.5);
        let mut b = RegistroTerritorial::new("Valparaíso", "Casablanca", 5102, 10);
        b.tasa_retencion = Some(120.0);
        let reporte = validar_registros(&[a, b]);
        assert_eq!(reporte.observaciones.len(), 1);
        assert!(matches!(reporte.observaciones[0], Observacion::TasaRetencionFueraDeRango { fila: 1, .. }));
    }
}
