use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{Auditoria, EntradaAuditoria, FiltroAuditoria};
use crate::error::MapasError;

/// Auditoría en SQLite, tabla `audit_log`.
pub struct AuditoriaSqlite {
    conn: Mutex<Connection>,
}

impl AuditoriaSqlite {
    /// Acepta una ruta o una URL `sqlite://ruta` / `file://ruta`.
    pub fn abrir(url_o_ruta: &str) -> Result<Self, MapasError> {
        let ruta = url_o_ruta
            .strip_prefix("sqlite://")
            .or_else(|| url_o_ruta.strip_prefix("file://"))
            .unwrap_or(url_o_ruta);
        if let Some(dir) = Path::new(ruta).parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Self::desde_conexion(Connection::open(ruta)?)
    }

    pub fn en_memoria() -> Result<Self, MapasError> {
        Self::desde_conexion(Connection::open_in_memory()?)
    }

    fn desde_conexion(conn: Connection) -> Result<Self, MapasError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                username TEXT NOT NULL,
                action TEXT NOT NULL,
                status TEXT NOT NULL,
                details_json TEXT,
                ip_address TEXT,
                user_agent TEXT
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cuenta las entradas de `action` agrupadas por el valor de
    /// `details.<clave>` (p. ej. cuántas vistas regionales vs comunales).
    pub fn contar_por_detalle(&self, action: &str, clave: &str) -> Result<Vec<(String, i64)>, MapasError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT details_json FROM audit_log WHERE action = ?1",
        )?;
        let filas = stmt.query_map(params![action], |row| row.get::<_, Option<String>>(0))?;

        let mut conteo: std::collections::BTreeMap<String, i64> = std::collections::BTreeMap::new();
        for fila in filas {
            let Some(texto) = fila? else { continue };
            let details: serde_json::Value = serde_json::from_str(&texto)?;
            if let Some(valor) = details.get(clave) {
                let valor = valor.as_str().map(str::to_string).unwrap_or_else(|| valor.to_string());
                *conteo.entry(valor).or_insert(0) += 1;
            }
        }
        let mut out: Vec<(String, i64)> = conteo.into_iter().collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }
}

impl Auditoria for AuditoriaSqlite {
    fn registrar(&self, entrada: &EntradaAuditoria) -> Result<(), MapasError> {
        let details = serde_json::to_string(&entrada.details)?;
        self.conn().execute(
            "INSERT INTO audit_log (ts, username, action, status, details_json, ip_address, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entrada.timestamp,
                entrada.username,
                entrada.action,
                entrada.status,
                details,
                entrada.ip_address,
                entrada.user_agent,
            ],
        )?;
        Ok(())
    }

    fn leer(&self, filtro: &FiltroAuditoria) -> Result<Vec<EntradaAuditoria>, MapasError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ts, username, action, status, details_json, ip_address, user_agent
             FROM audit_log
             WHERE (?1 IS NULL OR username = ?1)
               AND (?2 IS NULL OR action = ?2)
               AND (?3 IS NULL OR status = ?3)
             ORDER BY id DESC
             LIMIT ?4",
        )?;
        let limite = filtro.limite.map(|l| l as i64).unwrap_or(-1);
        let filas = stmt.query_map(
            params![filtro.username, filtro.action, filtro.status, limite],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            },
        )?;

        let mut out = Vec::new();
        for fila in filas {
            let (timestamp, username, action, status, details, ip, ua) = fila?;
            let details = match details {
                Some(t) => serde_json::from_str(&t)?,
                None => serde_json::Value::Object(Default::default()),
            };
            out.push(EntradaAuditoria {
                timestamp,
                username,
                action,
                status,
                details,
                ip_address: ip.unwrap_or_else(|| "unknown".to_string()),
                user_agent: ua.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        Ok(out)
    }
}
