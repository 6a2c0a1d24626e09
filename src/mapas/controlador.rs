//! Orquestación de la vista de mapas: datos, geometría, mapas, tablas y auditoría.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::auditoria::{Auditoria, OrigenSolicitud};
use crate::datos::FuenteRegistros;
use crate::error::MapasError;
use crate::geo::CacheGeometria;
use crate::mapas::coropletico::{renderizar_con_separador, ArtefactoMapa};
use crate::mapas::escala::{EscalaColor, ESCALA_ESTABLECIMIENTOS, ESCALA_MATRICULA};
use crate::mapas::formato::SEPARADOR_MILES;
use crate::mapas::svg::renderizar_svg;
use crate::mapas::tabla::{construir_tabla_con_separador, TablaResumen, TOP_COMUNAS};
use crate::models::{FiltroRegistros, Granularidad, Metrica, ResumenTerritorial};
use crate::territorio::{agregar, validar_registros, verificar_consistencia};

pub const MENSAJE_NO_DISPONIBLE: &str = "Datos del mapa no disponibles";

#[derive(Debug, Clone)]
pub struct OpcionesVista {
    pub separador_miles: String,
    pub top_comunas: usize,
}

impl Default for OpcionesVista {
    fn default() -> Self {
        OpcionesVista {
            separador_miles: SEPARADOR_MILES.to_string(),
            top_comunas: TOP_COMUNAS,
        }
    }
}

/// Salidas de la vista para una granularidad: dos mapas, dos tablas y el KPI
/// de territorios. `advertencias` lista lo que se degradó.
#[derive(Debug, Clone, Serialize)]
pub struct VistaMapas {
    pub granularidad: Granularidad,
    pub mapa_matricula: ArtefactoMapa,
    pub mapa_establecimientos: ArtefactoMapa,
    pub num_territorios: String,
    pub etiqueta_territorios: String,
    pub tabla_matricula: TablaResumen,
    pub tabla_establecimientos: TablaResumen,
    pub advertencias: Vec<String>,
}

pub fn escala_para(metrica: Metrica) -> EscalaColor {
    match metrica {
        Metrica::Matricula => ESCALA_MATRICULA,
        Metrica::Establecimientos => ESCALA_ESTABLECIMIENTOS,
    }
}

/// Controlador sin estado propio: cada llamada recalcula todo a partir de
/// la tabla y de la geometría cacheada.
pub struct ControladorMapas {
    registros: Arc<dyn FuenteRegistros>,
    geometria: Arc<CacheGeometria>,
    auditoria: Option<Arc<dyn Auditoria>>,
    opciones: OpcionesVista,
}

impl ControladorMapas {
    pub fn new(registros: Arc<dyn FuenteRegistros>, geometria: Arc<CacheGeometria>) -> Self {
        ControladorMapas {
            registros,
            geometria,
            auditoria: None,
            opciones: OpcionesVista::default(),
        }
    }

    pub fn con_auditoria(mut self, auditoria: Arc<dyn Auditoria>) -> Self {
        self.auditoria = Some(auditoria);
        self
    }

    pub fn con_opciones(mut self, opciones: OpcionesVista) -> Self {
        self.opciones = opciones;
        self
    }

    pub fn geometria(&self) -> &Arc<CacheGeometria> {
        &self.geometria
    }

    /// Recalcula la vista completa. Nunca falla: cualquier error se convierte
    /// en un mapa "no disponible" o una tabla vacía, y se anota en
    /// `advertencias`.
    pub fn actualizar(
        &self,
        granularidad: Granularidad,
        usuario: Option<&str>,
        filtro: &FiltroRegistros,
    ) -> VistaMapas {
        self.actualizar_con_origen(granularidad, usuario, &OrigenSolicitud::default(), filtro)
    }

    /// `actualizar`, registrando en la auditoría el origen de la solicitud.
    #[instrument(skip(self, granularidad, origen, filtro), fields(granularidad = %granularidad))]
    pub fn actualizar_con_origen(
        &self,
        granularidad: Granularidad,
        usuario: Option<&str>,
        origen: &OrigenSolicitud,
        filtro: &FiltroRegistros,
    ) -> VistaMapas {
        if let Some(usuario) = usuario {
            self.auditar(usuario, origen, granularidad);
        }

        let mut advertencias = Vec::new();
        let (num_territorios, etiqueta) = granularidad.kpi_territorios();

        let resumenes = match self.resumenes(granularidad, filtro, &mut advertencias) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(error = %e, "no se pudo cargar la tabla comunal");
                advertencias.push(e.to_string());
                None
            }
        };

        let (mapa_matricula, mapa_establecimientos) = match &resumenes {
            None => (
                ArtefactoMapa::no_disponible(granularidad, Metrica::Matricula, ESCALA_MATRICULA, MENSAJE_NO_DISPONIBLE),
                ArtefactoMapa::no_disponible(
                    granularidad,
                    Metrica::Establecimientos,
                    ESCALA_ESTABLECIMIENTOS,
                    MENSAJE_NO_DISPONIBLE,
                ),
            ),
            Some(resumenes) => self.mapas(granularidad, resumenes, &mut advertencias),
        };

        let tabla = |metrica: Metrica| {
            construir_tabla_con_separador(
                resumenes.as_deref().unwrap_or_default(),
                granularidad,
                metrica,
                self.top_n(granularidad),
                &self.opciones.separador_miles,
            )
        };
        let tabla_matricula = tabla(Metrica::Matricula);
        let tabla_establecimientos = tabla(Metrica::Establecimientos);

        info!(
            territorios = resumenes.as_ref().map_or(0, Vec::len),
            advertencias = advertencias.len(),
            "vista de mapas generada"
        );

        VistaMapas {
            granularidad,
            mapa_matricula,
            mapa_establecimientos,
            num_territorios: num_territorios.to_string(),
            etiqueta_territorios: etiqueta.to_string(),
            tabla_matricula,
            tabla_establecimientos,
            advertencias,
        }
    }

    /// SVG estático de un mapa. A diferencia de `actualizar`, propaga errores.
    pub fn svg(
        &self,
        granularidad: Granularidad,
        metrica: Metrica,
        filtro: &FiltroRegistros,
        ancho: u32,
        alto: u32,
    ) -> Result<String, MapasError> {
        let mut advertencias = Vec::new();
        let resumenes = self.resumenes(granularidad, filtro, &mut advertencias)?;
        let poligonos = self.geometria.obtener(granularidad)?;
        let artefacto = renderizar_con_separador(
            &resumenes,
            &poligonos,
            metrica,
            escala_para(metrica),
            &self.opciones.separador_miles,
        );
        renderizar_svg(&artefacto, &poligonos, ancho, alto)
    }

    fn top_n(&self, granularidad: Granularidad) -> Option<usize> {
        match granularidad {
            Granularidad::Regional => None,
            Granularidad::Comunal => Some(self.opciones.top_comunas),
        }
    }

    fn auditar(&self, usuario: &str, origen: &OrigenSolicitud, granularidad: Granularidad) {
        let Some(auditoria) = &self.auditoria else {
            return;
        };
        let detalles = json!({ "granularidad": granularidad.as_str() });
        if let Err(e) = auditoria.log_view_dashboard_desde(usuario, "mapas", detalles, origen) {
            warn!(usuario, error = %e, "no se pudo registrar la auditoría");
        }
    }

    /// Carga, valida, filtra y agrega. Verifica además la consistencia entre niveles.
    fn resumenes(
        &self,
        granularidad: Granularidad,
        filtro: &FiltroRegistros,
        advertencias: &mut Vec<String>,
    ) -> Result<Vec<ResumenTerritorial>, MapasError> {
        let registros = self.registros.cargar()?;
        let reporte = validar_registros(&registros);
        if !reporte.es_valido() {
            advertencias.push(format!(
                "La tabla comunal tiene {} observaciones de calidad en {} registros",
                reporte.observaciones.len(),
                reporte.registros
            ));
        }
        let registros = filtro.aplicar(registros);

        let regionales = agregar(&registros, Granularidad::Regional);
        let comunales = agregar(&registros, Granularidad::Comunal);
        for inc in verificar_consistencia(&comunales, &regionales) {
            warn!(
                codregion = inc.codregion,
                suma_comunal = inc.suma_comunal,
                total_regional = inc.total_regional,
                "agregado regional inconsistente con la suma comunal"
            );
            advertencias.push(format!("Región {}: totales inconsistentes", inc.codregion));
        }

        Ok(match granularidad {
            Granularidad::Regional => regionales,
            Granularidad::Comunal => comunales,
        })
    }

    fn mapas(
        &self,
        granularidad: Granularidad,
        resumenes: &[ResumenTerritorial],
        advertencias: &mut Vec<String>,
    ) -> (ArtefactoMapa, ArtefactoMapa) {
        let render = |metrica: Metrica, poligonos: Option<&crate::geo::ConjuntoPoligonos>| match poligonos {
            Some(p) => renderizar_con_separador(
                resumenes,
                p,
                metrica,
                escala_para(metrica),
                &self.opciones.separador_miles,
            ),
            None => ArtefactoMapa::no_disponible(granularidad, metrica, escala_para(metrica), MENSAJE_NO_DISPONIBLE),
        };

        match self.geometria.obtener(granularidad) {
            Ok(poligonos) => {
                let m = render(Metrica::Matricula, Some(poligonos.as_ref()));
                let e = render(Metrica::Establecimientos, Some(poligonos.as_ref()));
                if !m.territorios_descartados.is_empty() {
                    advertencias.push(format!(
                        "{} territorios sin geometría excluidos del mapa",
                        m.territorios_descartados.len()
                    ));
                }
                (m, e)
            }
            Err(e) => {
                advertencias.push(e.to_string());
                (render(Metrica::Matricula, None), render(Metrica::Establecimientos, None))
            }
        }
    }
}
