// src/superblock.rs
use log::{debug, info};

use crate::config::*;
use crate::device::BlockDevice;
use crate::error::{ChainFsError, Result};
use crate::layout::{Entry, EntryKind, SuperblockDisk};

/// Superblock ya validado, con el layout derivado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub raw: SuperblockDisk,
    pub data_area_start: u32,
}

impl Superblock {
    pub fn block_count(&self) -> u32 {
        self.raw.block_count
    }

    pub fn file_table_blocks(&self) -> u32 {
        self.raw.file_table_blocks
    }

    pub fn block_map_blocks(&self) -> u32 {
        self.raw.block_map_blocks
    }

    /// Capacidad de la tabla de entradas (slots).
    pub fn total_files(&self) -> u32 {
        self.raw.total_files
    }

    pub fn root_dir_block(&self) -> u32 {
        self.raw.root_dir_block
    }

    /// Primer sector del mapa de bloques.
    pub fn block_map_start(&self) -> u32 {
        1 + self.raw.file_table_blocks
    }

    pub fn data_block_count(&self) -> u32 {
        self.raw.block_count.saturating_sub(self.data_area_start)
    }

    /// Entradas que caben en la región del mapa (puede superar a los bloques
    /// de datos reales).
    pub fn map_capacity(&self) -> u32 {
        self.raw.block_map_blocks.saturating_mul(MAP_ENTRIES_PER_SECTOR)
    }

    /// Lee el sector 0, valida el magic y calcula el inicio del área de datos.
    pub fn load<D: BlockDevice>(dev: &mut D) -> Result<Self> {
        let buf = dev.read_sector(0)?;
        let raw = SuperblockDisk::from_bytes(&buf);

        if raw.magic != CHAINFS_MAGIC {
            return Err(ChainFsError::BadMagic { found: raw.magic });
        }

        let data_area_start =
            1u64 + raw.file_table_blocks as u64 + raw.block_map_blocks as u64;
        if data_area_start > raw.block_count as u64 {
            return Err(ChainFsError::MalformedHeader(format!(
                "metadata regions end at sector {} but the image has {} blocks",
                data_area_start, raw.block_count
            )));
        }
        if raw.total_files as u64 > raw.file_table_blocks as u64 * ENTRIES_PER_SECTOR as u64 {
            return Err(ChainFsError::MalformedHeader(format!(
                "{} entries do not fit in {} table blocks",
                raw.total_files, raw.file_table_blocks
            )));
        }

        let sb = Self {
            raw,
            data_area_start: data_area_start as u32,
        };
        debug!(
            "superblock: {} blocks, table {} + map {}, data at {}",
            sb.block_count(),
            sb.file_table_blocks(),
            sb.block_map_blocks(),
            sb.data_area_start
        );
        Ok(sb)
    }

    /// Crea un sistema de archivos vacío: superblock, raíz en el slot 0, resto
    /// de la tabla a cero y mapa de bloques todo libre.
    pub fn format<D: BlockDevice>(dev: &mut D, total_blocks: u32, max_files: u32) -> Result<Self> {
        let geo = Geometry::compute(total_blocks, max_files)?;
        info!(
            "format: {} blocks, {} entries ({} table, {} map, {} data)",
            total_blocks, max_files, geo.file_table_blocks, geo.block_map_blocks, geo.data_blocks
        );

        let sb = SuperblockDisk::new(
            total_blocks,
            geo.file_table_blocks,
            geo.block_map_blocks,
            max_files,
        );
        dev.write_sector(0, &sb.to_bytes())?;

        // Raíz en el primer bloque de la tabla, con el padre terminal.
        let root = Entry {
            index: ROOT_INDEX,
            status: STATUS_IN_USE,
            kind: EntryKind::Directory,
            name: ROOT_NAME.to_string(),
            size: 0,
            start_block: 0,
            parent: EOF_MARKER,
        };
        let zero = [0u8; BLOCK_SIZE];
        let mut first = zero;
        first[..ENTRY_SIZE].copy_from_slice(&root.to_disk().to_bytes());
        dev.write_sector(1, &first)?;
        for sector in 2..1 + geo.file_table_blocks {
            dev.write_sector(sector, &zero)?;
        }

        // FREE_BLOCK == 0, así que un sector de ceros es un sector de mapa libre.
        let map_sector = [0u8; BLOCK_SIZE];
        let map_start = 1 + geo.file_table_blocks;
        for sector in map_start..map_start + geo.block_map_blocks {
            dev.write_sector(sector, &map_sector)?;
        }

        Self::load(dev)
    }
}

/// Reparto de regiones calculado en `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub file_table_blocks: u32,
    pub block_map_blocks: u32,
    pub data_blocks: u32,
}

impl Geometry {
    pub fn compute(total_blocks: u32, max_files: u32) -> Result<Self> {
        if max_files == 0 {
            return Err(ChainFsError::InvalidGeometry(
                "at least one entry (the root) is required".into(),
            ));
        }
        let file_table_blocks = max_files.div_ceil(ENTRIES_PER_SECTOR);

        // El mapa se dimensiona con los bloques que quedan tras la tabla y
        // luego se recalcula el número real de bloques de datos.
        let remaining = total_blocks
            .checked_sub(1 + file_table_blocks)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ChainFsError::InvalidGeometry(format!(
                    "{} blocks cannot hold a superblock and {} table blocks",
                    total_blocks, file_table_blocks
                ))
            })?;
        let block_map_blocks = remaining.div_ceil(MAP_ENTRIES_PER_SECTOR);
        let data_blocks = remaining
            .checked_sub(block_map_blocks)
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                ChainFsError::InvalidGeometry(format!(
                    "{} blocks leave no room for data",
                    total_blocks
                ))
            })?;

        Ok(Self {
            file_table_blocks,
            block_map_blocks,
            data_blocks,
        })
    }
}
