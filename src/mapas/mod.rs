//! Mapas coropléticos y tablas resumen de matrícula y establecimientos.
//!
//! Submódulos:
//! - `escala`: escalas de color continuas
//! - `formato`: separador de miles
//! - `coropletico`: `renderizar` -> `ArtefactoMapa`
//! - `svg`: vista previa estática con plotters
//! - `tabla`: `construir_tabla` -> `TablaResumen`
//! - `controlador`: `ControladorMapas::actualizar` -> `VistaMapas`

mod controlador;
mod coropletico;
mod escala;
mod formato;
mod svg;
mod tabla;

pub use controlador::{escala_para, ControladorMapas, OpcionesVista, VistaMapas, MENSAJE_NO_DISPONIBLE};
pub use coropletico::{
    renderizar, renderizar_con_separador, ArtefactoMapa, DisenoMapa, TerritorioRenderizado,
};
pub use escala::{
    hex_a_rgb, normalizar, rgb_a_hex, EscalaColor, ParadaColor, ESCALA_ESTABLECIMIENTOS,
    ESCALA_MATRICULA,
};
pub use formato::{formatear_miles, SEPARADOR_MILES};
pub use svg::renderizar_svg;
pub use tabla::{
    columnas_tabla, construir_tabla, construir_tabla_con_separador, EstiloTabla, TablaResumen,
    TOP_COMUNAS,
};
