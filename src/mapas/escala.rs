//! Escalas de color continuas para los mapas coropléticos.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParadaColor {
    pub posicion: f64,
    pub color: &'static str,
}

const fn parada(posicion: f64, color: &'static str) -> ParadaColor {
    ParadaColor { posicion, color }
}

/// Secuencia ordenada de paradas (posición en [0, 1], color hex).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EscalaColor {
    paradas: &'static [ParadaColor],
}

/// Matrícula: de gris azulado claro a azul casi negro.
pub const ESCALA_MATRICULA: EscalaColor = EscalaColor {
    paradas: &[
        parada(0.0, "#E8EEF2"),
        parada(0.25, "#5A6E79"),
        parada(0.5, "#34536A"),
        parada(0.75, "#2A4255"),
        parada(1.0, "#1E293B"),
    ],
};

/// Establecimientos: de blanco a rojo oscuro pasando por dorado.
pub const ESCALA_ESTABLECIMIENTOS: EscalaColor = EscalaColor {
    paradas: &[
        parada(0.0, "#FFFFFF"),
        parada(0.2, "#F4F6F7"),
        parada(0.4, "#C2A869"),
        parada(0.7, "#B35A5A"),
        parada(1.0, "#8B3A3A"),
    ],
};

impl EscalaColor {
    /// Valida que haya al menos dos paradas, que las posiciones crezcan
    /// estrictamente de 0 a 1 y que cada color sea hex `#RRGGBB`.
    pub fn new(paradas: &'static [ParadaColor]) -> Option<Self> {
        let n = paradas.len();
        if n < 2 || paradas[0].posicion != 0.0 || paradas[n - 1].posicion != 1.0 {
            return None;
        }
        let creciente = paradas.windows(2).all(|w| w[0].posicion < w[1].posicion);
        let colores_validos = paradas.iter().all(|p| hex_a_rgb(p.color).is_some());
        (creciente && colores_validos).then_some(Self { paradas })
    }

    pub fn paradas(&self) -> &'static [ParadaColor] {
        self.paradas
    }

    /// Color en la posición `t` (se recorta a [0, 1]), interpolando en RGB
    /// entre las dos paradas vecinas.
    pub fn muestrear(&self, t: f64) -> (u8, u8, u8) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let primera = self.paradas[0];
        let mut anterior = primera;
        for &siguiente in &self.paradas[1..] {
            if t <= siguiente.posicion {
                let tramo = siguiente.posicion - anterior.posicion;
                let f = if tramo > 0.0 { (t - anterior.posicion) / tramo } else { 0.0 };
                return mezclar(rgb_o_negro(anterior.color), rgb_o_negro(siguiente.color), f);
            }
            anterior = siguiente;
        }
        rgb_o_negro(anterior.color)
    }

    pub fn muestrear_hex(&self, t: f64) -> String {
        rgb_a_hex(self.muestrear(t))
    }
}

/// Posición normalizada de `valor` dentro de `[min, max]`. Si el rango es
/// degenerado (todos los valores iguales) devuelve el punto medio.
pub fn normalizar(valor: f64, min: f64, max: f64) -> f64 {
    let rango = max - min;
    if !(rango > 0.0) {
        return 0.5;
    }
    ((valor - min) / rango).clamp(0.0, 1.0)
}

pub fn hex_a_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 || !h.is_ascii() {
        return None;
    }
    let canal = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
    Some((canal(0)?, canal(2)?, canal(4)?))
}

pub fn rgb_a_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

fn rgb_o_negro(hex: &str) -> (u8, u8, u8) {
    hex_a_rgb(hex).unwrap_or((0, 0, 0))
}

fn mezclar(a: (u8, u8, u8), b: (u8, u8, u8), f: f64) -> (u8, u8, u8) {
    let canal = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    (canal(a.0, b.0), canal(a.1, b.1), canal(a.2, b.2))
}
