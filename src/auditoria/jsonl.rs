use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use super::{Auditoria, EntradaAuditoria, FiltroAuditoria};
use crate::error::MapasError;

/// Auditoría en un archivo JSON Lines (se agrega una línea por entrada).
pub struct AuditoriaJsonl {
    ruta: PathBuf,
    // serializa las escrituras dentro del proceso
    escritura: Mutex<()>,
}

impl AuditoriaJsonl {
    /// Crea el directorio y el archivo si no existen.
    pub fn new(ruta: impl Into<PathBuf>) -> Result<Self, MapasError> {
        let ruta = ruta.into();
        if let Some(dir) = ruta.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&ruta)?;
        Ok(Self { ruta, escritura: Mutex::new(()) })
    }

    pub fn ruta(&self) -> &Path {
        &self.ruta
    }
}

impl Auditoria for AuditoriaJsonl {
    fn registrar(&self, entrada: &EntradaAuditoria) -> Result<(), MapasError> {
        let linea = serde_json::to_string(entrada)?;
        let _guard = self.escritura.lock().unwrap_or_else(|e| e.into_inner());
        let mut f = OpenOptions::new().create(true).append(true).open(&self.ruta)?;
        writeln!(f, "{}", linea)?;
        info!(
            username = %entrada.username,
            action = %entrada.action,
            status = %entrada.status,
            "AUDIT"
        );
        Ok(())
    }

    fn leer(&self, filtro: &FiltroAuditoria) -> Result<Vec<EntradaAuditoria>, MapasError> {
        if !self.ruta.exists() {
            return Ok(Vec::new());
        }
        let f = fs::File::open(&self.ruta)?;
        let mut entradas = Vec::new();
        for (n, linea) in BufReader::new(f).lines().enumerate() {
            let linea = linea?;
            if linea.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<EntradaAuditoria>(&linea) {
                Ok(e) if filtro.acepta(&e) => entradas.push(e),
                Ok(_) => {}
                Err(e) => warn!(linea = n + 1, error = %e, "línea de auditoría ilegible, se omite"),
            }
        }
        // timestamps ISO: el orden lexicográfico es cronológico; ante empates
        // manda el orden del archivo
        entradas.reverse();
        entradas.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limite) = filtro.limite {
            entradas.truncate(limite);
        }
        Ok(entradas)
    }
}
