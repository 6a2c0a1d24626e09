//! Tabla de regiones de Chile y derivación del código regional.
//!
//! Las fuentes usan distintas grafías para la misma región (la tabla de
//! matrícula dice "Biobío", la geometría "Región del Bío-Bío"). Toda
//! reconciliación de nombres pasa por `Region`, indexada por el código
//! regional canónico (1..=16).

use serde::Serialize;

/// Similitud mínima (Jaro-Winkler) para aceptar un nombre no registrado.
const UMBRAL_SIMILITUD: f64 = 0.92;

/// Deriva el código de región a partir del código de comuna.
///
/// Los códigos de comuna codifican la región como prefijo de ancho variable:
/// con 5 dígitos la región son los dos primeros (15201 -> 15), en otro caso
/// el primero (2302 -> 2).
pub fn resolver_codigo_region(cod_comuna: u32) -> u32 {
    let digitos = cod_comuna.to_string();
    let prefijo = if digitos.len() == 5 { &digitos[..2] } else { &digitos[..1] };
    // el prefijo son dígitos ASCII de un u32, el parseo no puede fallar
    prefijo.parse().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    Tarapaca,
    Antofagasta,
    Atacama,
    Coquimbo,
    Valparaiso,
    OHiggins,
    Maule,
    Biobio,
    Araucania,
    LosLagos,
    Aysen,
    Magallanes,
    Metropolitana,
    LosRios,
    AricaParinacota,
    Nuble,
}

const TODAS: [Region; 16] = [
    Region::Tarapaca,
    Region::Antofagasta,
    Region::Atacama,
    Region::Coquimbo,
    Region::Valparaiso,
    Region::OHiggins,
    Region::Maule,
    Region::Biobio,
    Region::Araucania,
    Region::LosLagos,
    Region::Aysen,
    Region::Magallanes,
    Region::Metropolitana,
    Region::LosRios,
    Region::AricaParinacota,
    Region::Nuble,
];

impl Region {
    pub fn todas() -> &'static [Region] {
        &TODAS
    }

    pub fn codigo(&self) -> u32 {
        match self {
            Region::Tarapaca => 1,
            Region::Antofagasta => 2,
            Region::Atacama => 3,
            Region::Coquimbo => 4,
            Region::Valparaiso => 5,
            Region::OHiggins => 6,
            Region::Maule => 7,
            Region::Biobio => 8,
            Region::Araucania => 9,
            Region::LosLagos => 10,
            Region::Aysen => 11,
            Region::Magallanes => 12,
            Region::Metropolitana => 13,
            Region::LosRios => 14,
            Region::AricaParinacota => 15,
            Region::Nuble => 16,
        }
    }

    /// Nombre corto, tal como aparece en la tabla de matrícula.
    pub fn nombre(&self) -> &'static str {
        match self {
            Region::Tarapaca => "Tarapacá",
            Region::Antofagasta => "Antofagasta",
            Region::Atacama => "Atacama",
            Region::Coquimbo => "Coquimbo",
            Region::Valparaiso => "Valparaíso",
            Region::OHiggins => "O'Higgins",
            Region::Maule => "Maule",
            Region::Biobio => "Biobío",
            Region::Araucania => "La Araucanía",
            Region::LosLagos => "Los Lagos",
            Region::Aysen => "Aysén",
            Region::Magallanes => "Magallanes",
            Region::Metropolitana => "Metropolitana",
            Region::LosRios => "Los Ríos",
            Region::AricaParinacota => "Arica y Parinacota",
            Region::Nuble => "Ñuble",
        }
    }

    /// Nombre oficial usado por la fuente de geometría.
    pub fn nombre_geometria(&self) -> &'static str {
        match self {
            Region::Tarapaca => "Región de Tarapacá",
            Region::Antofagasta => "Región de Antofagasta",
            Region::Atacama => "Región de Atacama",
            Region::Coquimbo => "Región de Coquimbo",
            Region::Valparaiso => "Región de Valparaíso",
            Region::OHiggins => "Región del Libertador Bernardo O'Higgins",
            Region::Maule => "Región del Maule",
            Region::Biobio => "Región del Bío-Bío",
            Region::Araucania => "Región de La Araucanía",
            Region::LosLagos => "Región de Los Lagos",
            Region::Aysen => "Región de Aysén del Gral.Ibañez del Campo",
            Region::Magallanes => "Región de Magallanes y Antártica Chilena",
            Region::Metropolitana => "Región Metropolitana de Santiago",
            Region::LosRios => "Región de Los Ríos",
            Region::AricaParinacota => "Región de Arica y Parinacota",
            Region::Nuble => "Región de Ñuble",
        }
    }

    fn alias(&self) -> &'static [&'static str] {
        match self {
            Region::OHiggins => &["Libertador General Bernardo O'Higgins", "Libertador Bernardo O'Higgins"],
            Region::Biobio => &["Bío-Bío", "Bio Bio"],
            Region::Araucania => &["Araucanía"],
            Region::Aysen => &["Aysén del General Carlos Ibáñez del Campo"],
            Region::Magallanes => &["Magallanes y de la Antártica Chilena"],
            Region::Metropolitana => &["Metropolitana de Santiago", "RM"],
            _ => &[],
        }
    }

    pub fn desde_codigo(codigo: u32) -> Option<Region> {
        TODAS.iter().copied().find(|r| r.codigo() == codigo)
    }

    /// Busca la región por cualquiera de sus grafías (sin distinguir
    /// mayúsculas ni tildes). Si no hay coincidencia exacta, acepta la
    /// grafía más parecida por sobre `UMBRAL_SIMILITUD`.
    pub fn desde_nombre(nombre: &str) -> Option<Region> {
        let buscado = normalizar_nombre_region(nombre);
        if buscado.is_empty() {
            return None;
        }

        for region in TODAS.iter() {
            if region.grafias().any(|g| normalizar_nombre_region(g) == buscado) {
                return Some(*region);
            }
        }

        let mut mejor: Option<(Region, f64)> = None;
        for region in TODAS.iter() {
            for grafia in region.grafias() {
                let score = strsim::jaro_winkler(&normalizar_nombre_region(grafia), &buscado);
                if score >= UMBRAL_SIMILITUD && mejor.map_or(true, |(_, s)| score > s) {
                    mejor = Some((*region, score));
                }
            }
        }
        mejor.map(|(r, _)| r)
    }

    fn grafias(&self) -> impl Iterator<Item = &'static str> {
        [self.nombre(), self.nombre_geometria()]
            .into_iter()
            .chain(self.alias().iter().copied())
    }
}

/// Minúsculas, sin tildes, sin el prefijo "Región de/del" y sin puntuación.
pub fn normalizar_nombre_region(nombre: &str) -> String {
    let sin_tildes: String = nombre
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();

    let mut palabras: Vec<&str> = sin_tildes.split_whitespace().collect();
    if palabras.first() == Some(&"region") {
        palabras.remove(0);
        if matches!(palabras.first(), Some(&"de") | Some(&"del")) {
            palabras.remove(0);
        }
    }
    palabras.join(" ")
}
