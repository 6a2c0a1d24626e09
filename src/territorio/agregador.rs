//! Agregación de la tabla comunal por región o por comuna.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Granularidad, RegistroTerritorial, ResumenTerritorial};
use crate::territorio::region::{resolver_codigo_region, Region};

/// Estudiantes por establecimiento usados para estimar establecimientos.
pub const ESTUDIANTES_POR_ESTABLECIMIENTO: u64 = 100;

/// Estimación de establecimientos a partir de la matrícula:
/// `max(1, floor(matricula / 100))`. No hay registro real de establecimientos.
pub fn estimar_establecimientos(matricula_total: u64) -> u64 {
    std::cmp::max(1, matricula_total / ESTUDIANTES_POR_ESTABLECIMIENTO)
}

#[derive(Default)]
struct Acumulado {
    nombre: Option<String>,
    matricula_total: u64,
    matricula_hombres: u64,
    matricula_mujeres: u64,
    comunas: HashSet<u32>,
}

impl Acumulado {
    /// Las sumas saturan en `u64::MAX`.
    fn sumar(&mut self, r: &RegistroTerritorial) {
        self.matricula_total = self.matricula_total.saturating_add(r.matricula_total);
        self.matricula_hombres = self
            .matricula_hombres
            .saturating_add(r.matricula_hombres.unwrap_or(0));
        self.matricula_mujeres = self
            .matricula_mujeres
            .saturating_add(r.matricula_mujeres.unwrap_or(0));
        self.comunas.insert(r.cod_comuna);
    }
}

/// Agrupa los registros según la granularidad pedida.
///
/// - Regional: agrupa por el código de región derivado del código de comuna
///   y cuenta comunas distintas.
/// - Comunal: agrupa por (cod_comuna, comuna, región), sin más agregación.
///
/// El resultado se ordena por código (y nombre) para que sea determinista.
pub fn agregar(registros: &[RegistroTerritorial], granularidad: Granularidad) -> Vec<ResumenTerritorial> {
    let resumenes = match granularidad {
        Granularidad::Regional => agregar_por_region(registros),
        Granularidad::Comunal => agregar_por_comuna(registros),
    };
    debug!(
        granularidad = %granularidad,
        registros = registros.len(),
        territorios = resumenes.len(),
        "agregación completada"
    );
    resumenes
}

fn agregar_por_region(registros: &[RegistroTerritorial]) -> Vec<ResumenTerritorial> {
    let mut grupos: BTreeMap<u32, Acumulado> = BTreeMap::new();
    for r in registros {
        let codregion = resolver_codigo_region(r.cod_comuna);
        let acc = grupos.entry(codregion).or_default();
        if acc.nombre.is_none() {
            acc.nombre = Some(r.region.clone());
        }
        acc.sumar(r);
    }

    grupos
        .into_iter()
        .map(|(codigo, acc)| {
            // El nombre canónico de la tabla de regiones manda; si el código no
            // corresponde a ninguna región se conserva el primer nombre visto.
            let nombre = match Region::desde_codigo(codigo) {
                Some(region) => region.nombre().to_string(),
                None => {
                    warn!(codregion = codigo, "código de región fuera de la tabla de regiones");
                    acc.nombre.clone().unwrap_or_default()
                }
            };
            ResumenTerritorial {
                codigo,
                nombre,
                region: None,
                matricula_total: acc.matricula_total,
                matricula_hombres: acc.matricula_hombres,
                matricula_mujeres: acc.matricula_mujeres,
                establecimientos_estimados: estimar_establecimientos(acc.matricula_total),
                comunas: Some(acc.comunas.len()),
            }
        })
        .collect()
}

fn agregar_por_comuna(registros: &[RegistroTerritorial]) -> Vec<ResumenTerritorial> {
    let mut grupos: BTreeMap<(u32, String, String), Acumulado> = BTreeMap::new();
    for r in registros {
        let clave = (r.cod_comuna, r.comuna.clone(), r.region.clone());
        grupos.entry(clave).or_default().sumar(r);
    }

    grupos
        .into_iter()
        .map(|((codigo, comuna, region), acc)| ResumenTerritorial {
            codigo,
            nombre: comuna,
            region: Some(region),
            matricula_total: acc.matricula_total,
            matricula_hombres: acc.matricula_hombres,
            matricula_mujeres: acc.matricula_mujeres,
            establecimientos_estimados: estimar_establecimientos(acc.matricula_total),
            comunas: None,
        })
        .collect()
}

/// Diferencia entre la suma comunal y el agregado regional de una región.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inconsistencia {
    pub codregion: u32,
    pub suma_comunal: u64,
    pub total_regional: u64,
    pub tolerancia: u64,
}

/// Verifica que la suma de matrícula de las comunas de cada región coincida
/// con el agregado regional, con tolerancia igual al número de comunas de la
/// región. Devuelve las regiones que no cumplen (vacío si todo cuadra).
pub fn verificar_consistencia(
    comunales: &[ResumenTerritorial],
    regionales: &[ResumenTerritorial],
) -> Vec<Inconsistencia> {
    let mut por_region: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
    for c in comunales {
        let entrada = por_region.entry(resolver_codigo_region(c.codigo)).or_insert((0, 0));
        entrada.0 = entrada.0.saturating_add(c.matricula_total);
        entrada.1 += 1;
    }

    let mut inconsistencias = Vec::new();
    let mut vistos: HashSet<u32> = HashSet::new();
    for r in regionales {
        vistos.insert(r.codigo);
        let (suma, n) = por_region.get(&r.codigo).copied().unwrap_or((0, 0));
        if suma.abs_diff(r.matricula_total) > n {
            inconsistencias.push(Inconsistencia {
                codregion: r.codigo,
                suma_comunal: suma,
                total_regional: r.matricula_total,
                tolerancia: n,
            });
        }
    }

    // comunas cuya región no aparece en el agregado regional
    for (codregion, (suma, n)) in por_region {
        if !vistos.contains(&codregion) && suma > n {
            inconsistencias.push(Inconsistencia {
                codregion,
                suma_comunal: suma,
                total_regional: 0,
                tolerancia: n,
            });
        }
    }
    inconsistencias
}
