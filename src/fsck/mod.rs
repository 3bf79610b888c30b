//! Revisión de consistencia de una imagen ChainFS.
//!
//! El chequeo trabaja sobre una foto en memoria (superblock, tabla de
//! entradas y mapa de bloques) que entrega un [`FsckBackend`]; así las reglas
//! se pueden probar sin una imagen real.

pub mod fsck_backend;
pub mod fsck_types;
#[allow(clippy::module_inception)]
pub mod fsck;

#[cfg(test)]
mod mock;

pub use fsck::run_fsck;
pub use fsck_backend::FsckBackend;
pub use fsck_types::FsckReport;
