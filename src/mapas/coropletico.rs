//! Mapas coropléticos: unión de resúmenes con polígonos y asignación de color.

use serde::Serialize;
use tracing::debug;

use crate::geo::ConjuntoPoligonos;
use crate::mapas::escala::{normalizar, EscalaColor};
use crate::mapas::formato::{formatear_miles, SEPARADOR_MILES};
use crate::models::{Granularidad, Metrica, ResumenTerritorial};

/// Parámetros fijos del mapa (no se derivan de los datos).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisenoMapa {
    pub estilo: &'static str,
    pub centro_lat: f64,
    pub centro_lon: f64,
    pub zoom: f64,
    pub opacidad: f64,
    pub alto: u32,
    /// r, t, l, b
    pub margen: [u32; 4],
}

impl DisenoMapa {
    pub fn para(granularidad: Granularidad) -> Self {
        DisenoMapa {
            estilo: "open-street-map",
            centro_lat: -35.0,
            centro_lon: -71.0,
            zoom: match granularidad {
                Granularidad::Regional => 3.2,
                Granularidad::Comunal => 3.5,
            },
            opacidad: 0.7,
            alto: 600,
            margen: [0, 0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerritorioRenderizado {
    pub codigo: u32,
    pub nombre: String,
    pub valor: u64,
    /// Posición normalizada en la escala, siempre en [0, 1].
    pub posicion: f64,
    pub color: String,
    pub hover: String,
}

/// Descripción serializable de un mapa coroplético listo para el frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtefactoMapa {
    pub disponible: bool,
    pub mensaje: Option<String>,
    pub granularidad: Granularidad,
    pub metrica: Metrica,
    pub featureidkey: &'static str,
    pub escala: EscalaColor,
    /// (mínimo, máximo) de la métrica sobre todos los resúmenes.
    pub rango: Option<(u64, u64)>,
    pub territorios: Vec<TerritorioRenderizado>,
    /// Códigos sin polígono correspondiente, excluidos del mapa.
    pub territorios_descartados: Vec<u32>,
    pub diseno: DisenoMapa,
}

impl ArtefactoMapa {
    /// Mapa de reemplazo cuando la geometría o los datos no están disponibles.
    pub fn no_disponible(
        granularidad: Granularidad,
        metrica: Metrica,
        escala: EscalaColor,
        mensaje: impl Into<String>,
    ) -> Self {
        ArtefactoMapa {
            disponible: false,
            mensaje: Some(mensaje.into()),
            granularidad,
            metrica,
            featureidkey: granularidad.featureidkey(),
            escala,
            rango: None,
            territorios: Vec::new(),
            territorios_descartados: Vec::new(),
            diseno: DisenoMapa::para(granularidad),
        }
    }

    pub fn territorio(&self, codigo: u32) -> Option<&TerritorioRenderizado> {
        self.territorios.iter().find(|t| t.codigo == codigo)
    }
}

/// Renderiza con el separador de miles por defecto.
pub fn renderizar(
    resumenes: &[ResumenTerritorial],
    poligonos: &ConjuntoPoligonos,
    metrica: Metrica,
    escala: EscalaColor,
) -> ArtefactoMapa {
    renderizar_con_separador(resumenes, poligonos, metrica, escala, SEPARADOR_MILES)
}

/// Une cada resumen con su polígono por código y lo colorea según `metrica`.
///
/// Un resumen sin polígono se excluye y queda en `territorios_descartados`.
/// El rango de color se calcula sobre todos los resúmenes; si todos los
/// valores son iguales, cada territorio recibe el color del centro de la escala.
pub fn renderizar_con_separador(
    resumenes: &[ResumenTerritorial],
    poligonos: &ConjuntoPoligonos,
    metrica: Metrica,
    escala: EscalaColor,
    separador: &str,
) -> ArtefactoMapa {
    let granularidad = poligonos.granularidad();
    let valores: Vec<u64> = resumenes.iter().map(|r| metrica.valor(r)).collect();
    let rango = valores.iter().min().copied().zip(valores.iter().max().copied());
    let (min, max) = rango.map(|(a, b)| (a as f64, b as f64)).unwrap_or((0.0, 0.0));

    let mut territorios = Vec::with_capacity(resumenes.len());
    let mut descartados = Vec::new();
    for resumen in resumenes {
        if !poligonos.contiene(resumen.codigo) {
            descartados.push(resumen.codigo);
            continue;
        }
        let valor = metrica.valor(resumen);
        let posicion = normalizar(valor as f64, min, max);
        territorios.push(TerritorioRenderizado {
            codigo: resumen.codigo,
            nombre: resumen.nombre.clone(),
            valor,
            posicion,
            color: escala.muestrear_hex(posicion),
            hover: texto_hover(resumen, metrica, separador),
        });
    }

    if !descartados.is_empty() {
        debug!(
            granularidad = %granularidad,
            descartados = descartados.len(),
            "territorios sin polígono excluidos del mapa"
        );
    }

    ArtefactoMapa {
        disponible: true,
        mensaje: None,
        granularidad,
        metrica,
        featureidkey: granularidad.featureidkey(),
        escala,
        rango,
        territorios,
        territorios_descartados: descartados,
        diseno: DisenoMapa::para(granularidad),
    }
}

/// Nombre en negrita, región (sólo comunas) y las dos métricas, la del color primero.
fn texto_hover(resumen: &ResumenTerritorial, metrica: Metrica, separador: &str) -> String {
    let mut lineas = vec![format!("<b>{}</b>", resumen.nombre)];
    if let Some(region) = &resumen.region {
        lineas.push(format!("Región: {}", region));
    }
    let secundaria = match metrica {
        Metrica::Matricula => Metrica::Establecimientos,
        Metrica::Establecimientos => Metrica::Matricula,
    };
    for m in [metrica, secundaria] {
        lineas.push(format!("{}: {}", m.etiqueta(), formatear_miles(m.valor(resumen), separador)));
    }
    lineas.join("<br>")
}
