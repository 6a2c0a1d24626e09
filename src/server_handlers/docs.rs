use actix_web::{HttpResponse, Responder};
use serde_json::json;

pub async fn help_handler() -> impl Responder {
    let help = json!({
        "description": "API de mapas EMTP: matrícula y establecimientos estimados por región o comuna.",
        "endpoints": {
            "GET /mapas": "Vista completa (dos mapas, dos tablas, KPI de territorios). Parámetros: granularidad=regional|comunal, anio, especialidad, dependencia, usuario (o header X-Usuario).",
            "GET /mapas/svg": "Vista previa SVG de un mapa. Parámetros: granularidad, metrica=matricula|establecimientos, anio, especialidad, dependencia.",
            "GET /mapas/geometria/{granularidad}": "GeoJSON cacheado de regiones o comunas.",
            "GET /mapas/cache": "Estadísticas de la caché de geometría (hits, misses, entradas).",
            "GET /help": "Esta ayuda."
        },
        "get_example_query": "/mapas?granularidad=comunal&anio=2024&usuario=analista",
        "note": "Si la geometría no está disponible los mapas vuelven con disponible=false y las tablas se generan igual."
    });

    HttpResponse::Ok().json(help)
}
