//! Tablas resumen (matrícula y establecimientos) por región o comuna.

use serde::Serialize;

use crate::mapas::formato::{formatear_miles, SEPARADOR_MILES};
use crate::models::{Granularidad, Metrica, ResumenTerritorial};

/// Tope de filas a nivel comunal.
pub const TOP_COMUNAS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstiloTabla {
    pub striped: bool,
    pub bordered: bool,
    pub hover: bool,
    pub responsive: bool,
}

impl Default for EstiloTabla {
    fn default() -> Self {
        EstiloTabla { striped: true, bordered: true, hover: true, responsive: true }
    }
}

/// Tabla ya formateada: todas las celdas son texto.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablaResumen {
    pub titulo: String,
    pub columnas: Vec<String>,
    pub filas: Vec<Vec<String>>,
    pub estilo: EstiloTabla,
}

impl TablaResumen {
    pub fn vacia(titulo: &str, columnas: &[&str]) -> Self {
        TablaResumen {
            titulo: titulo.to_string(),
            columnas: columnas.iter().map(|c| c.to_string()).collect(),
            filas: Vec::new(),
            estilo: EstiloTabla::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.filas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filas.is_empty()
    }

    /// Valores de una columna, por nombre.
    pub fn columna(&self, nombre: &str) -> Option<Vec<&str>> {
        let i = self.columnas.iter().position(|c| c == nombre)?;
        Some(self.filas.iter().filter_map(|f| f.get(i).map(String::as_str)).collect())
    }

    /// HTML con clases Bootstrap (`table-striped`, `table-bordered`, ...).
    pub fn to_html(&self) -> String {
        let mut clases = vec!["table", "mb-0"];
        if self.estilo.striped {
            clases.push("table-striped");
        }
        if self.estilo.bordered {
            clases.push("table-bordered");
        }
        if self.estilo.hover {
            clases.push("table-hover");
        }

        let mut html = String::new();
        if self.estilo.responsive {
            html.push_str("<div class=\"table-responsive\">");
        }
        html.push_str(&format!("<table class=\"{}\"><thead><tr>", clases.join(" ")));
        for c in &self.columnas {
            html.push_str(&format!("<th>{}</th>", escapar_html(c)));
        }
        html.push_str("</tr></thead><tbody>");
        for fila in &self.filas {
            html.push_str("<tr>");
            for celda in fila {
                html.push_str(&format!("<td>{}</td>", escapar_html(celda)));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        if self.estilo.responsive {
            html.push_str("</div>");
        }
        html
    }
}

fn escapar_html(texto: &str) -> String {
    texto
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Columnas de la tabla según granularidad y métrica.
pub fn columnas_tabla(granularidad: Granularidad, metrica: Metrica) -> &'static [&'static str] {
    match (granularidad, metrica) {
        (Granularidad::Regional, Metrica::Matricula) => &["Región", "Matrícula Total", "N° Comunas"],
        (Granularidad::Comunal, Metrica::Matricula) => &["Región", "Comuna", "Matrícula Total"],
        (Granularidad::Regional, Metrica::Establecimientos) => &[
            "Región",
            "N° Establecimientos",
            "Matrícula Total",
            "N° Comunas",
            "Promedio Mat./Estab.",
        ],
        (Granularidad::Comunal, Metrica::Establecimientos) => {
            &["Región", "Comuna", "N° Establecimientos", "Matrícula Total"]
        }
    }
}

fn titulo_tabla(granularidad: Granularidad, metrica: Metrica) -> String {
    let nivel = match granularidad {
        Granularidad::Regional => "Región",
        Granularidad::Comunal => "Comuna",
    };
    let que = match metrica {
        Metrica::Matricula => "Matrícula",
        Metrica::Establecimientos => "Establecimientos",
    };
    format!("{} por {}", que, nivel)
}

/// Construye la tabla con el separador por defecto.
pub fn construir_tabla(
    resumenes: &[ResumenTerritorial],
    granularidad: Granularidad,
    metrica: Metrica,
    top_n: Option<usize>,
) -> TablaResumen {
    construir_tabla_con_separador(resumenes, granularidad, metrica, top_n, SEPARADOR_MILES)
}

/// Ordena por la métrica de la tabla (descendente, empates por nombre), corta
/// en `top_n` si se entrega y formatea los números con separador de miles.
pub fn construir_tabla_con_separador(
    resumenes: &[ResumenTerritorial],
    granularidad: Granularidad,
    metrica: Metrica,
    top_n: Option<usize>,
    separador: &str,
) -> TablaResumen {
    let mut ordenados: Vec<&ResumenTerritorial> = resumenes.iter().collect();
    ordenados.sort_by(|a, b| {
        metrica
            .valor(b)
            .cmp(&metrica.valor(a))
            .then_with(|| a.nombre.cmp(&b.nombre))
    });
    if let Some(n) = top_n {
        ordenados.truncate(n);
    }

    let miles = |v: u64| formatear_miles(v, separador);
    let filas = ordenados
        .into_iter()
        .map(|r| {
            let region = r.region.clone().unwrap_or_else(|| r.nombre.clone());
            let comunas = miles(r.comunas.unwrap_or(0) as u64);
            match (granularidad, metrica) {
                (Granularidad::Regional, Metrica::Matricula) => {
                    vec![region, miles(r.matricula_total), comunas]
                }
                (Granularidad::Comunal, Metrica::Matricula) => {
                    vec![region, r.nombre.clone(), miles(r.matricula_total)]
                }
                (Granularidad::Regional, Metrica::Establecimientos) => {
                    // la estimación nunca es cero
                    let promedio = r.matricula_total / r.establecimientos_estimados.max(1);
                    vec![
                        region,
                        miles(r.establecimientos_estimados),
                        miles(r.matricula_total),
                        comunas,
                        miles(promedio),
                    ]
                }
                (Granularidad::Comunal, Metrica::Establecimientos) => vec![
                    region,
                    r.nombre.clone(),
                    miles(r.establecimientos_estimados),
                    miles(r.matricula_total),
                ],
            }
        })
        .collect();

    TablaResumen {
        titulo: titulo_tabla(granularidad, metrica),
        columnas: columnas_tabla(granularidad, metrica).iter().map(|c| c.to_string()).collect(),
        filas,
        estilo: EstiloTabla::default(),
    }
}
