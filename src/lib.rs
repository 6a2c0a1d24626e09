// Biblioteca raíz del crate `mapas_emtp`.
// Mapas coropléticos de matrícula EMTP por región y comuna: ingesta de la
// tabla comunal, agregación territorial, geometría cacheada, render y tablas.
pub mod auditoria;
pub mod config;
pub mod datos;
pub mod error;
pub mod geo;
pub mod mapas;
pub mod models;
pub mod server;
pub mod server_handlers;
pub mod territorio;

pub use error::MapasError;
/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
