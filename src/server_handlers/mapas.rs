use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::auditoria::OrigenSolicitud;
use crate::mapas::ControladorMapas;
use crate::models::{FiltroRegistros, Granularidad, Metrica};

const ANCHO_SVG: u32 = 600;
const ALTO_SVG: u32 = 1200;

/// Limita el trabajo bloqueante simultáneo (lectura de tabla, descarga de
/// geometría) al número de CPUs.
async fn permiso_bloqueante() -> Result<OwnedSemaphorePermit, HttpResponse> {
    static GLOBAL_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();
    let sem = GLOBAL_SEM
        .get_or_init(|| Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get()))))
        .clone();
    sem.acquire_owned()
        .await
        .map_err(|_| HttpResponse::InternalServerError().json(json!({"error": "failed to acquire semaphore"})))
}

fn no_vacio(qm: &HashMap<String, String>, clave: &str) -> Option<String> {
    qm.get(clave).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn filtro_desde_query(qm: &HashMap<String, String>) -> Result<FiltroRegistros, HttpResponse> {
    let anio = match no_vacio(qm, "anio").or_else(|| no_vacio(qm, "año")) {
        Some(a) => Some(a.parse::<i32>().map_err(|_| {
            HttpResponse::BadRequest().json(json!({"error": format!("anio inválido: {}", a)}))
        })?),
        None => None,
    };
    Ok(FiltroRegistros {
        anio,
        especialidad: no_vacio(qm, "especialidad"),
        dependencia: no_vacio(qm, "dependencia"),
    })
}

/// Usuario para auditoría: header `X-Usuario` o parámetro `usuario`.
fn usuario_de(req: &HttpRequest, qm: &HashMap<String, String>) -> Option<String> {
    req.headers()
        .get("X-Usuario")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| no_vacio(qm, "usuario"))
}

/// IP (respetando `Forwarded`/`X-Forwarded-For`) y user agent de la solicitud.
fn origen_de(req: &HttpRequest) -> OrigenSolicitud {
    OrigenSolicitud {
        ip_address: req.connection_info().realip_remote_addr().map(str::to_string),
        user_agent: req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// GET /mapas?granularidad=regional|comunal[&anio=&especialidad=&dependencia=]
pub async fn mapas_handler(
    req: HttpRequest,
    controlador: web::Data<ControladorMapas>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let qm = query.into_inner();
    let granularidad = Granularidad::desde_selector(qm.get("granularidad").map(String::as_str).unwrap_or(""));
    let filtro = match filtro_desde_query(&qm) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let usuario = usuario_de(&req, &qm);
    let origen = origen_de(&req);

    let permit = match permiso_bloqueante().await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let controlador = controlador.into_inner();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        controlador.actualizar_con_origen(granularidad, usuario.as_deref(), &origen, &filtro)
    });

    match handle.await {
        Ok(vista) => HttpResponse::Ok().json(vista),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}

/// GET /mapas/svg?granularidad=..&metrica=matricula|establecimientos
pub async fn mapas_svg_handler(
    controlador: web::Data<ControladorMapas>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let qm = query.into_inner();
    let granularidad = Granularidad::desde_selector(qm.get("granularidad").map(String::as_str).unwrap_or(""));
    let metrica = match no_vacio(&qm, "metrica").map(|m| m.parse::<Metrica>()) {
        None => Metrica::Matricula,
        Some(Ok(m)) => m,
        Some(Err(e)) => return HttpResponse::BadRequest().json(json!({"error": e})),
    };
    let filtro = match filtro_desde_query(&qm) {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    let permit = match permiso_bloqueante().await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let controlador = controlador.into_inner();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        controlador.svg(granularidad, metrica, &filtro, ANCHO_SVG, ALTO_SVG)
    });

    match handle.await {
        Ok(Ok(svg)) => HttpResponse::Ok().content_type("image/svg+xml").body(svg),
        Ok(Err(e)) => {
            warn!(error = %e, "no se pudo generar el SVG");
            HttpResponse::ServiceUnavailable().json(json!({"error": e}))
        }
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}

/// GET /mapas/geometria/{granularidad}: FeatureCollection cacheada.
pub async fn geometria_handler(
    controlador: web::Data<ControladorMapas>,
    path: web::Path<String>,
) -> impl Responder {
    let granularidad = match path.into_inner().parse::<Granularidad>() {
        Ok(g) => g,
        Err(e) => return HttpResponse::NotFound().json(json!({"error": e})),
    };

    let permit = match permiso_bloqueante().await {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let controlador = controlador.into_inner();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        controlador.geometria().obtener(granularidad)
    });

    match handle.await {
        Ok(Ok(conjunto)) => HttpResponse::Ok().json(conjunto.coleccion()),
        Ok(Err(e)) => HttpResponse::ServiceUnavailable().json(json!({"error": e})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"error": format!("task join error: {}", e)})),
    }
}

/// GET /mapas/cache: estadísticas de la caché de geometría.
pub async fn cache_handler(controlador: web::Data<ControladorMapas>) -> impl Responder {
    HttpResponse::Ok().json(controlador.geometria().estadisticas())
}
