use mapas_emtp::models::RegistroTerritorial;
use mapas_emtp::territorio::{resolver_codigo_region, Region};

#[test]
fn test_resolver_codigo_region_4_y_5_digitos() {
    for c in 1000u32..=9999 {
        let esperado: u32 = c.to_string()[..1].parse().unwrap();
        assert_eq!(resolver_codigo_region(c), esperado);
    }
    for c in (10000u32..=99999).step_by(7) {
        let esperado: u32 = c.to_string()[..2].parse().unwrap();
        assert_eq!(resolver_codigo_region(c), esperado);
    }
    assert_eq!(resolver_codigo_region(2302), 2);
    assert_eq!(resolver_codigo_region(15201), 15);
}

#[test]
fn test_registro_deriva_codigo_region() {
    let r = RegistroTerritorial::new("Ñuble", "Chillán", 16101, 10);
    assert_eq!(r.codigo_region(), 16);
}

#[test]
fn test_desde_codigo_cubre_las_16_regiones() {
    for codigo in 1..=16 {
        let region = Region::desde_codigo(codigo).expect("Debe existir la región");
        assert_eq!(region.codigo(), codigo);
    }
    assert_eq!(Region::desde_codigo(0), None);
    assert_eq!(Region::desde_codigo(17), None);
    assert_eq!(Region::todas().len(), 16);
}

#[test]
fn test_desde_nombre_reconcilia_grafias() {
    assert_eq!(Region::desde_nombre("Biobío"), Some(Region::Biobio));
    assert_eq!(Region::desde_nombre("Región del Bío-Bío"), Some(Region::Biobio));
    assert_eq!(Region::desde_nombre("La Araucanía"), Some(Region::Araucania));
    assert_eq!(Region::desde_nombre("araucania"), Some(Region::Araucania));
    assert_eq!(Region::desde_nombre("Región Metropolitana de Santiago"), Some(Region::Metropolitana));
    assert_eq!(
        Region::desde_nombre("Región de Aysén del Gral.Ibañez del Campo"),
        Some(Region::Aysen)
    );
    assert_eq!(Region::desde_nombre("NUBLE"), Some(Region::Nuble));
}

#[test]
fn test_desde_nombre_tolera_errores_menores() {
    assert_eq!(Region::desde_nombre("Valparaizo"), Some(Region::Valparaiso));
    assert_eq!(Region::desde_nombre("Antofagaste"), Some(Region::Antofagasta));
}

#[test]
fn test_desde_nombre_rechaza_desconocidos() {
    assert_eq!(Region::desde_nombre("Texas"), None);
    assert_eq!(Region::desde_nombre(""), None);
    assert_eq!(Region::desde_nombre("Región de"), None);
}

#[test]
fn test_cada_region_se_encuentra_por_sus_nombres() {
    for region in Region::todas() {
        assert_eq!(Region::desde_nombre(region.nombre()), Some(*region));
        assert_eq!(Region::desde_nombre(region.nombre_geometria()), Some(*region));
    }
}
