mod common;

use std::sync::Arc;

use common::FuenteFalsa;
use mapas_emtp::auditoria::{
    Auditoria, AuditoriaMemoria, FiltroAuditoria, OrigenSolicitud, ACCION_VER_DASHBOARD,
};
use mapas_emtp::datos::{ArchivoRegistros, RegistrosEnMemoria};
use mapas_emtp::geo::CacheGeometria;
use mapas_emtp::mapas::{ControladorMapas, OpcionesVista, MENSAJE_NO_DISPONIBLE};
use mapas_emtp::models::{FiltroRegistros, Granularidad, Metrica, RegistroTerritorial};

fn codigos_comunales(por_region: u32) -> Vec<u32> {
    common::registros_sinteticos(por_region).iter().map(|r| r.cod_comuna).collect()
}

fn fuente_completa(por_region: u32) -> FuenteFalsa {
    let f = FuenteFalsa::con(
        Granularidad::Regional,
        common::geojson_cuadrados(Granularidad::Regional, &common::codigos_regiones()),
    );
    f.poner(
        Granularidad::Comunal,
        common::geojson_cuadrados(Granularidad::Comunal, &codigos_comunales(por_region)),
    );
    f
}

fn controlador(por_region: u32, fuente: FuenteFalsa) -> ControladorMapas {
    ControladorMapas::new(
        Arc::new(RegistrosEnMemoria::new(common::registros_sinteticos(por_region))),
        Arc::new(CacheGeometria::new(fuente)),
    )
}

#[test]
fn test_vista_regional_completa() {
    let c = controlador(3, fuente_completa(3));
    let vista = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());

    assert_eq!(vista.num_territorios, "16");
    assert_eq!(vista.etiqueta_territorios, "Regiones");
    assert!(vista.mapa_matricula.disponible);
    assert!(vista.mapa_establecimientos.disponible);
    assert_eq!(vista.mapa_matricula.metrica, Metrica::Matricula);
    assert_eq!(vista.mapa_establecimientos.metrica, Metrica::Establecimientos);
    assert_eq!(vista.mapa_matricula.territorios.len(), 16);
    assert!(vista.tabla_matricula.len() <= 16);
    assert_eq!(vista.tabla_establecimientos.len(), 16);
    assert!(vista.advertencias.is_empty(), "{:?}", vista.advertencias);
}

#[test]
fn test_vista_comunal_limita_tablas() {
    let c = controlador(3, fuente_completa(3));
    let vista = c.actualizar(Granularidad::Comunal, None, &FiltroRegistros::default());

    assert_eq!(vista.num_territorios, "345");
    assert_eq!(vista.etiqueta_territorios, "Comunas");
    // el mapa muestra todas las comunas, las tablas sólo el top
    assert_eq!(vista.mapa_matricula.territorios.len(), 48);
    assert_eq!(vista.tabla_matricula.len(), 20);
    assert_eq!(vista.tabla_establecimientos.len(), 20);
}

#[test]
fn test_opciones_de_vista() {
    let c = controlador(3, fuente_completa(3)).con_opciones(OpcionesVista {
        separador_miles: ",".to_string(),
        top_comunas: 5,
    });
    let vista = c.actualizar(Granularidad::Comunal, None, &FiltroRegistros::default());
    assert_eq!(vista.tabla_matricula.len(), 5);

    let regional = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    // Ñuble: 3 * 16 * 37 + 11 * (1 + 2 + 3)
    assert_eq!(regional.tabla_matricula.filas[0][1], "1,842");
}

#[test]
fn test_filtro_por_anio() {
    let c = controlador(4, fuente_completa(4));
    let filtro = FiltroRegistros { anio: Some(2023), ..Default::default() };
    let vista = c.actualizar(Granularidad::Regional, None, &filtro);
    // sólo las comunas pares (2 por región)
    assert!(vista
        .tabla_matricula
        .columna("N° Comunas")
        .unwrap()
        .iter()
        .all(|n| *n == "2"));
}

#[test]
fn test_geometria_no_disponible_conserva_tablas() {
    let c = controlador(3, FuenteFalsa::default());
    let vista = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());

    assert!(!vista.mapa_matricula.disponible);
    assert!(!vista.mapa_establecimientos.disponible);
    assert_eq!(vista.mapa_matricula.mensaje.as_deref(), Some(MENSAJE_NO_DISPONIBLE));
    assert!(vista.mapa_matricula.territorios.is_empty());
    assert_eq!(vista.tabla_matricula.len(), 16);
    assert_eq!(vista.num_territorios, "16");
    assert!(!vista.advertencias.is_empty());
}

#[test]
fn test_archivo_sin_columnas_da_tablas_vacias() {
    let ruta = common::ruta_temporal("sin_columnas.csv");
    std::fs::write(&ruta, "region,comuna\nValparaíso,Valparaíso\n").unwrap();

    let c = ControladorMapas::new(
        Arc::new(ArchivoRegistros::new(&ruta)),
        Arc::new(CacheGeometria::new(fuente_completa(1))),
    );
    let vista = c.actualizar(Granularidad::Comunal, None, &FiltroRegistros::default());

    assert!(!vista.mapa_matricula.disponible);
    assert!(vista.tabla_matricula.is_empty());
    assert!(vista.tabla_establecimientos.is_empty());
    assert_eq!(vista.tabla_matricula.columnas, vec!["Región", "Comuna", "Matrícula Total"]);
    assert!(vista.advertencias[0].contains("cod_comuna"));
    assert_eq!(vista.num_territorios, "345");

    std::fs::remove_file(&ruta).ok();
}

#[test]
fn test_territorios_sin_geometria_generan_advertencia() {
    let fuente = FuenteFalsa::con(
        Granularidad::Regional,
        common::geojson_cuadrados(Granularidad::Regional, &[1, 2, 3]),
    );
    let c = controlador(1, fuente);
    let vista = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());

    assert!(vista.mapa_matricula.disponible);
    assert_eq!(vista.mapa_matricula.territorios.len(), 3);
    assert_eq!(vista.mapa_matricula.territorios_descartados.len(), 13);
    assert_eq!(vista.tabla_matricula.len(), 16);
    assert_eq!(vista.advertencias.len(), 1);
}

#[test]
fn test_auditoria_solo_con_usuario() {
    let auditoria = Arc::new(AuditoriaMemoria::new());
    let c = controlador(1, fuente_completa(1)).con_auditoria(auditoria.clone());

    c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    assert!(auditoria.leer(&FiltroAuditoria::default()).unwrap().is_empty());

    c.actualizar(Granularidad::Comunal, Some("ana"), &FiltroRegistros::default());
    let entradas = auditoria.leer(&FiltroAuditoria::default()).unwrap();
    assert_eq!(entradas.len(), 1);
    assert_eq!(entradas[0].username, "ana");
    assert_eq!(entradas[0].action, ACCION_VER_DASHBOARD);
    assert_eq!(entradas[0].details["granularidad"], "comunal");
    assert_eq!(entradas[0].details["dashboard"], "mapas");
}

#[test]
fn test_geometria_se_descarga_una_vez() {
    let fuente = fuente_completa(1);
    let c = controlador(1, fuente.clone());
    for _ in 0..3 {
        c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    }
    assert_eq!(fuente.llamadas(), 1);
    let stats = c.geometria().estadisticas();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_svg_propaga_errores() {
    let c = controlador(1, FuenteFalsa::default());
    assert!(c
        .svg(Granularidad::Regional, Metrica::Matricula, &FiltroRegistros::default(), 300, 600)
        .is_err());

    let c = controlador(1, fuente_completa(1));
    let svg = c
        .svg(Granularidad::Regional, Metrica::Matricula, &FiltroRegistros::default(), 300, 600)
        .unwrap();
    assert!(svg.contains("<polygon"));
}

#[test]
fn test_matricula_enorme_no_bota_la_vista() {
    let ruta = common::ruta_temporal("enorme.csv");
    std::fs::write(
        &ruta,
        "region,comuna,cod_comuna,matricula_total\n\
         Valparaíso,Valparaíso,5101,18446744073709551615\n\
         Valparaíso,Casablanca,5102,5\n",
    )
    .unwrap();

    let c = ControladorMapas::new(
        Arc::new(ArchivoRegistros::new(&ruta)),
        Arc::new(CacheGeometria::new(fuente_completa(1))),
    );
    let regional = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    assert!(regional.mapa_matricula.disponible);
    let valpo = regional.mapa_matricula.territorio(5).expect("Debe existir la región 5");
    assert_eq!(valpo.valor, u64::MAX);

    let comunal = c.actualizar(Granularidad::Comunal, None, &FiltroRegistros::default());
    assert_eq!(comunal.tabla_matricula.len(), 2);

    std::fs::remove_file(&ruta).ok();
}

#[test]
fn test_observaciones_de_calidad_generan_advertencia() {
    let mut registros = common::registros_sinteticos(1);
    // región que no corresponde al código y desglose por sexo que no suma
    registros[0].region = "Atacama".to_string();
    registros[1].matricula_hombres = Some(1);
    registros[1].matricula_mujeres = Some(1);

    let c = ControladorMapas::new(
        Arc::new(RegistrosEnMemoria::new(registros)),
        Arc::new(CacheGeometria::new(fuente_completa(1))),
    );
    let vista = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    assert!(vista.mapa_matricula.disponible);
    assert_eq!(vista.tabla_matricula.len(), 16);
    assert!(
        vista
            .advertencias
            .iter()
            .any(|a| a.contains("2 observaciones de calidad en 16 registros")),
        "{:?}",
        vista.advertencias
    );
}

#[test]
fn test_registros_limpios_sin_advertencia_de_calidad() {
    let mut r = RegistroTerritorial::new("Maule", "Talca", 7101, 100);
    r.matricula_hombres = Some(60);
    r.matricula_mujeres = Some(40);
    let c = ControladorMapas::new(
        Arc::new(RegistrosEnMemoria::new(vec![r])),
        Arc::new(CacheGeometria::new(fuente_completa(1))),
    );
    let vista = c.actualizar(Granularidad::Regional, None, &FiltroRegistros::default());
    assert!(vista.advertencias.iter().all(|a| !a.contains("observaciones de calidad")));
}

#[test]
fn test_auditoria_registra_origen() {
    let auditoria = Arc::new(AuditoriaMemoria::new());
    let c = controlador(1, fuente_completa(1)).con_auditoria(auditoria.clone());
    let origen = OrigenSolicitud {
        ip_address: Some("10.0.0.7".to_string()),
        user_agent: Some("navegador/1.0".to_string()),
    };

    c.actualizar_con_origen(Granularidad::Regional, Some("ana"), &origen, &FiltroRegistros::default());
    let entradas = auditoria.leer(&FiltroAuditoria::default()).unwrap();
    assert_eq!(entradas.len(), 1);
    assert_eq!(entradas[0].ip_address, "10.0.0.7");
    assert_eq!(entradas[0].user_agent, "navegador/1.0");

    c.actualizar(Granularidad::Regional, Some("ana"), &FiltroRegistros::default());
    let entradas = auditoria.leer(&FiltroAuditoria::default()).unwrap();
    assert_eq!(entradas[0].ip_address, "unknown");
}
