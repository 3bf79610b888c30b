/*Interfaz de donde el fsck saca los datos. La implementación real lee la
imagen; las pruebas usan un mock con estados armados a mano. */

use crate::config::MAP_ENTRY_SIZE;
use crate::device::BlockDevice;
use crate::entry_table::entries;
use crate::error::Result;
use crate::fs::ChainFsInner;
use crate::layout::Entry;
use crate::superblock::Superblock;

pub trait FsckBackend {
    fn load_superblock(&mut self) -> Result<Superblock>;
    /// Todos los slots, libres incluidos, en orden de índice.
    fn load_all_entries(&mut self) -> Result<Vec<Entry>>;
    /// Una entrada `next` por bloque de datos (puede ser más corta si el
    /// mapa no alcanza a cubrir el área de datos).
    fn load_block_map(&mut self) -> Result<Vec<u32>>;
}

impl<D: BlockDevice> FsckBackend for ChainFsInner<D> {
    fn load_superblock(&mut self) -> Result<Superblock> {
        Ok(self.superblock)
    }

    fn load_all_entries(&mut self) -> Result<Vec<Entry>> {
        entries(self).collect()
    }

    fn load_block_map(&mut self) -> Result<Vec<u32>> {
        let sb = self.superblock;
        let wanted = sb.data_block_count() as usize;
        let mut map = Vec::with_capacity(wanted);
        for i in 0..sb.block_map_blocks() {
            if map.len() >= wanted {
                break;
            }
            let sector = self.device.read_sector(sb.block_map_start() + i)?;
            for raw in sector.chunks_exact(MAP_ENTRY_SIZE) {
                map.push(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]));
            }
        }
        map.truncate(wanted);
        Ok(map)
    }
}
