/// Separador de miles por defecto (convención chilena).
pub const SEPARADOR_MILES: &str = ".";

/// Formatea un entero con separador de miles: `formatear_miles(1234567, ".")`
/// devuelve `"1.234.567"`.
pub fn formatear_miles(valor: u64, separador: &str) -> String {
    let digitos = valor.to_string();
    let mut salida = String::with_capacity(digitos.len() + digitos.len() / 3 * separador.len());
    for (i, c) in digitos.chars().enumerate() {
        if i > 0 && (digitos.len() - i) % 3 == 0 {
            salida.push_str(separador);
        }
        salida.push(c);
    }
    salida
}
