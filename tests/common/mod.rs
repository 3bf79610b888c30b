//! Utilidades compartidas por las pruebas de integración.
#![allow(dead_code)]

use chainfs::{ChainFs, MemDevice};

/// Imagen en memoria recién formateada.
pub fn mem_fs(total_blocks: u32, max_files: u32) -> ChainFs<MemDevice> {
    ChainFs::format(MemDevice::new(total_blocks), total_blocks, max_files).unwrap()
}

/// Contenido determinista de `len` bytes, distinto según `seed`.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

pub fn names(entries: &[chainfs::Entry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}
