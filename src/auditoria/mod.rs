//! Registro de auditoría de acciones de usuario.
//!
//! Submódulos:
//! - `jsonl`: archivo JSON Lines (un objeto por línea)
//! - `sqlite`: tabla `audit_log` en SQLite

mod jsonl;
mod sqlite;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MapasError;

pub use jsonl::AuditoriaJsonl;
pub use sqlite::AuditoriaSqlite;

pub const ACCION_VER_DASHBOARD: &str = "view_dashboard";
const DESCONOCIDO: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntradaAuditoria {
    pub timestamp: String,
    pub username: String,
    pub action: String,
    pub status: String,
    pub details: Value,
    pub ip_address: String,
    pub user_agent: String,
}

impl EntradaAuditoria {
    /// Entrada exitosa con marca de tiempo local y origen desconocido.
    pub fn new(username: &str, action: &str, details: Value) -> Self {
        EntradaAuditoria {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            username: username.to_string(),
            action: action.to_string(),
            status: "success".to_string(),
            details,
            ip_address: DESCONOCIDO.to_string(),
            user_agent: DESCONOCIDO.to_string(),
        }
    }

    pub fn con_origen(mut self, ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        self.ip_address = ip_address.unwrap_or(DESCONOCIDO).to_string();
        self.user_agent = user_agent.unwrap_or(DESCONOCIDO).to_string();
        self
    }
}

/// IP y user agent de quien hizo la solicitud, si se conocen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrigenSolicitud {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Filtros para consultar el registro. `limite` cuenta después de filtrar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroAuditoria {
    pub username: Option<String>,
    pub action: Option<String>,
    pub status: Option<String>,
    pub limite: Option<usize>,
}

impl FiltroAuditoria {
    pub fn acepta(&self, entrada: &EntradaAuditoria) -> bool {
        self.username.as_ref().is_none_or(|u| *u == entrada.username)
            && self.action.as_ref().is_none_or(|a| *a == entrada.action)
            && self.status.as_ref().is_none_or(|s| *s == entrada.status)
    }
}

/// Destino de las entradas de auditoría.
pub trait Auditoria: Send + Sync {
    fn registrar(&self, entrada: &EntradaAuditoria) -> Result<(), MapasError>;

    /// Entradas más recientes primero.
    fn leer(&self, filtro: &FiltroAuditoria) -> Result<Vec<EntradaAuditoria>, MapasError>;

    /// Acceso a un dashboard: `details` se mezcla con `{"dashboard": ...}`.
    fn log_view_dashboard(&self, username: &str, dashboard: &str, details: Value) -> Result<(), MapasError> {
        self.log_view_dashboard_desde(username, dashboard, details, &OrigenSolicitud::default())
    }

    /// Como `log_view_dashboard`, con la IP y el user agent de la solicitud.
    fn log_view_dashboard_desde(
        &self,
        username: &str,
        dashboard: &str,
        details: Value,
        origen: &OrigenSolicitud,
    ) -> Result<(), MapasError> {
        let mut mapa = Map::new();
        mapa.insert("dashboard".to_string(), Value::String(dashboard.to_string()));
        if let Value::Object(extra) = details {
            mapa.extend(extra);
        }
        let entrada = EntradaAuditoria::new(username, ACCION_VER_DASHBOARD, Value::Object(mapa))
            .con_origen(origen.ip_address.as_deref(), origen.user_agent.as_deref());
        self.registrar(&entrada)
    }
}

/// Auditoría en memoria (tests y ejecución sin disco).
#[derive(Debug, Default)]
pub struct AuditoriaMemoria {
    entradas: std::sync::Mutex<Vec<EntradaAuditoria>>,
}

impl AuditoriaMemoria {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Auditoria for AuditoriaMemoria {
    fn registrar(&self, entrada: &EntradaAuditoria) -> Result<(), MapasError> {
        self.entradas
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entrada.clone());
        Ok(())
    }

    fn leer(&self, filtro: &FiltroAuditoria) -> Result<Vec<EntradaAuditoria>, MapasError> {
        let entradas = self.entradas.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entradas
            .iter()
            .rev()
            .filter(|e| filtro.acepta(e))
            .take(filtro.limite.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
