mod common;

use mapas_emtp::mapas::{construir_tabla, construir_tabla_con_separador, TOP_COMUNAS};
use mapas_emtp::models::{Granularidad, Metrica, RegistroTerritorial};
use mapas_emtp::territorio::agregar;

#[test]
fn test_tabla_regional_matricula_ordenada() {
    let resumenes = agregar(&common::registros_sinteticos(3), Granularidad::Regional);
    let tabla = construir_tabla(&resumenes, Granularidad::Regional, Metrica::Matricula, None);

    assert_eq!(tabla.titulo, "Matrícula por Región");
    assert_eq!(tabla.columnas, vec!["Región", "Matrícula Total", "N° Comunas"]);
    assert_eq!(tabla.len(), 16);
    // la matrícula sintética crece con el código de región: Ñuble (16) primero
    assert_eq!(tabla.filas[0][0], "Ñuble");
    assert_eq!(tabla.filas[15][0], "Tarapacá");
    assert!(tabla.columna("N° Comunas").unwrap().iter().all(|c| *c == "3"));
}

#[test]
fn test_tabla_comunal_top_20() {
    let resumenes = agregar(&common::registros_sinteticos(2), Granularidad::Comunal);
    assert_eq!(resumenes.len(), 32);

    let tabla = construir_tabla(&resumenes, Granularidad::Comunal, Metrica::Matricula, Some(TOP_COMUNAS));
    assert_eq!(tabla.len(), TOP_COMUNAS);
    assert_eq!(tabla.columnas, vec!["Región", "Comuna", "Matrícula Total"]);
    assert_eq!(tabla.titulo, "Matrícula por Comuna");

    let valores: Vec<u64> = tabla
        .columna("Matrícula Total")
        .unwrap()
        .iter()
        .map(|v| v.replace('.', "").parse().unwrap())
        .collect();
    assert!(valores.windows(2).all(|w| w[0] >= w[1]));
    // la comuna más grande es la segunda de Ñuble: 16*37 + 2*11
    assert_eq!(valores[0], 614);
}

#[test]
fn test_tabla_regional_establecimientos_con_promedio() {
    let registros = vec![
        RegistroTerritorial::new("Metropolitana", "Santiago", 13101, 12_345),
        RegistroTerritorial::new("Metropolitana", "Cerrillos", 13102, 655),
        RegistroTerritorial::new("Maule", "Talca", 7101, 50),
    ];
    let resumenes = agregar(&registros, Granularidad::Regional);
    let tabla = construir_tabla(&resumenes, Granularidad::Regional, Metrica::Establecimientos, None);

    assert_eq!(tabla.titulo, "Establecimientos por Región");
    assert_eq!(
        tabla.columnas,
        vec!["Región", "N° Establecimientos", "Matrícula Total", "N° Comunas", "Promedio Mat./Estab."]
    );
    assert_eq!(tabla.filas[0], vec!["Metropolitana", "130", "13.000", "2", "100"]);
    assert_eq!(tabla.filas[1], vec!["Maule", "1", "50", "1", "50"]);
}

#[test]
fn test_tabla_comunal_establecimientos() {
    let registros = vec![
        RegistroTerritorial::new("Biobío", "Concepción", 8101, 4_321),
        RegistroTerritorial::new("Biobío", "Coronel", 8102, 999),
    ];
    let resumenes = agregar(&registros, Granularidad::Comunal);
    let tabla = construir_tabla_con_separador(
        &resumenes,
        Granularidad::Comunal,
        Metrica::Establecimientos,
        Some(TOP_COMUNAS),
        " ",
    );
    assert_eq!(tabla.columnas, vec!["Región", "Comuna", "N° Establecimientos", "Matrícula Total"]);
    assert_eq!(tabla.filas[0], vec!["Biobío", "Concepción", "43", "4 321"]);
    assert_eq!(tabla.filas[1], vec!["Biobío", "Coronel", "9", "999"]);
}

#[test]
fn test_empates_se_ordenan_por_nombre() {
    let registros = vec![
        RegistroTerritorial::new("Maule", "Talca", 7101, 300),
        RegistroTerritorial::new("Maule", "Curicó", 7301, 300),
    ];
    let resumenes = agregar(&registros, Granularidad::Comunal);
    let tabla = construir_tabla(&resumenes, Granularidad::Comunal, Metrica::Matricula, None);
    assert_eq!(tabla.columna("Comuna").unwrap(), vec!["Curicó", "Talca"]);
}

#[test]
fn test_tabla_vacia_conserva_columnas() {
    let tabla = construir_tabla(&[], Granularidad::Comunal, Metrica::Establecimientos, Some(TOP_COMUNAS));
    assert!(tabla.is_empty());
    assert_eq!(tabla.columnas.len(), 4);
    assert!(tabla.to_html().contains("<th>N° Establecimientos</th>"));
}
