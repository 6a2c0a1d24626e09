//! Vista previa estática de un mapa coroplético en SVG.

use std::collections::HashMap;

use plotters::prelude::*;

use crate::error::MapasError;
use crate::geo::ConjuntoPoligonos;
use crate::mapas::coropletico::ArtefactoMapa;
use crate::mapas::escala::hex_a_rgb;

const SIN_DATOS: RGBColor = RGBColor(0xD9, 0xD9, 0xD9);
const BORDE: RGBColor = RGBColor(0x55, 0x55, 0x55);

/// Dibuja los polígonos del conjunto: los territorios del artefacto con su
/// color y el resto en gris. Sin textos (el backend SVG se usa sin fuentes).
pub fn renderizar_svg(
    artefacto: &ArtefactoMapa,
    poligonos: &ConjuntoPoligonos,
    ancho: u32,
    alto: u32,
) -> Result<String, MapasError> {
    let render_err = |e: &dyn std::fmt::Display| MapasError::Render(e.to_string());

    let (x0, x1, y0, y1) = poligonos
        .limites()
        .ok_or_else(|| MapasError::Render("la geometría no tiene polígonos".to_string()))?;
    // evita rangos vacíos con geometrías degeneradas
    let (x1, y1) = (x1.max(x0 + 1e-6), y1.max(y0 + 1e-6));

    let colores: HashMap<u32, RGBColor> = artefacto
        .territorios
        .iter()
        .filter_map(|t| hex_a_rgb(&t.color).map(|(r, g, b)| (t.codigo, RGBColor(r, g, b))))
        .collect();
    let opacidad = artefacto.diseno.opacidad;

    let mut buffer = String::new();
    {
        let root = SVGBackend::with_string(&mut buffer, (ancho, alto)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_err(&e))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(5)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(|e| render_err(&e))?;

        for (codigo, anillo) in poligonos.todos_los_anillos() {
            let relleno = codigo
                .and_then(|c| colores.get(&c))
                .copied()
                .unwrap_or(SIN_DATOS);
            chart
                .draw_series(std::iter::once(Polygon::new(anillo.clone(), relleno.mix(opacidad).filled())))
                .map_err(|e| render_err(&e))?;
            chart
                .draw_series(std::iter::once(PathElement::new(anillo, BORDE.stroke_width(1))))
                .map_err(|e| render_err(&e))?;
        }

        root.present().map_err(|e| render_err(&e))?;
    }
    Ok(buffer)
}
