// src/config.rs
use std::env;
use std::path::PathBuf;

// -----------------------------------------------------------------------------
// Constantes del formato en disco
// -----------------------------------------------------------------------------

pub const BLOCK_SIZE: usize = 512;
pub const CHAINFS_MAGIC: u32 = 0xCAFE_BABE;

/// Tamaño de un registro de la tabla de entradas (status, tipo, nombre, size,
/// start_block, parent, reservado).
pub const ENTRY_SIZE: usize = 60;
pub const ENTRIES_PER_SECTOR: u32 = (BLOCK_SIZE / ENTRY_SIZE) as u32;

/// Cada entrada del mapa de bloques ocupa 4 bytes.
pub const MAP_ENTRY_SIZE: usize = 4;
pub const MAP_ENTRIES_PER_SECTOR: u32 = (BLOCK_SIZE / MAP_ENTRY_SIZE) as u32;

pub const NAME_FIELD_LEN: usize = 30;
pub const MAX_NAME_LEN: usize = 29;

pub const FREE_BLOCK: u32 = 0x0000_0000;
pub const EOF_MARKER: u32 = 0xFFFF_FFFF;

pub const ROOT_INDEX: u32 = 0;
pub const ROOT_NAME: &str = "/";

pub const STATUS_FREE: u8 = 0;
pub const STATUS_IN_USE: u8 = 1;

pub const TYPE_FILE: u8 = 0;
pub const TYPE_DIR: u8 = 1;

// -----------------------------------------------------------------------------
// Configuración en tiempo de ejecución
// -----------------------------------------------------------------------------

pub const IMAGE_ENV: &str = "CHAINFS_IMAGE";
pub const DEFAULT_IMAGE: &str = "bin/disk.img";

/// Dónde vive la imagen con la que trabajan las herramientas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub image: PathBuf,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from(DEFAULT_IMAGE),
        }
    }
}

impl ImageConfig {
    /// Prioridad: argumento explícito, luego `CHAINFS_IMAGE`, luego el valor
    /// por defecto.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        if let Some(image) = explicit {
            return Self { image };
        }
        match env::var_os(IMAGE_ENV) {
            Some(v) if !v.is_empty() => Self { image: PathBuf::from(v) },
            _ => Self::default(),
        }
    }
}
