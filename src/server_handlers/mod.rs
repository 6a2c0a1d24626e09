pub mod docs;
pub mod mapas;

pub use docs::*;
pub use mapas::*;
