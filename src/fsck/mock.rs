/*Backend armado a mano para probar las reglas del fsck sin pasar por una
imagen. */

use super::fsck_backend::FsckBackend;
use crate::config::*;
use crate::error::Result;
use crate::layout::{Entry, EntryKind, SuperblockDisk};
use crate::superblock::Superblock;

pub struct MockBackend {
    pub superblock: Superblock,
    pub entries: Vec<Entry>,
    pub map: Vec<u32>,
}

impl MockBackend {
    /// Imagen vacía con `slots` entradas (la 0 es la raíz) y `data` bloques
    /// de datos libres.
    pub fn empty(slots: u32, data: u32) -> Self {
        let table = slots.div_ceil(ENTRIES_PER_SECTOR);
        let map_blocks = data.div_ceil(MAP_ENTRIES_PER_SECTOR).max(1);
        let data_area_start = 1 + table + map_blocks;
        let raw = SuperblockDisk::new(data_area_start + data, table, map_blocks, slots);
        let mut entries: Vec<Entry> = (0..slots)
            .map(|index| Entry {
                index,
                status: STATUS_FREE,
                kind: EntryKind::File,
                name: String::new(),
                size: 0,
                start_block: 0,
                parent: 0,
            })
            .collect();
        entries[0] = Entry {
            index: 0,
            status: STATUS_IN_USE,
            kind: EntryKind::Directory,
            name: ROOT_NAME.into(),
            size: 0,
            start_block: 0,
            parent: EOF_MARKER,
        };
        Self {
            superblock: Superblock {
                raw,
                data_area_start,
            },
            entries,
            map: vec![FREE_BLOCK; data as usize],
        }
    }

    pub fn set(&mut self, index: u32, kind: EntryKind, name: &str, size: u32, start: u32, parent: u32) {
        self.entries[index as usize] = Entry {
            index,
            status: STATUS_IN_USE,
            kind,
            name: name.into(),
            size,
            start_block: start,
            parent,
        };
    }

    pub fn link(&mut self, blocks: &[u32]) {
        for (i, &b) in blocks.iter().enumerate() {
            self.map[b as usize] = blocks.get(i + 1).copied().unwrap_or(EOF_MARKER);
        }
    }
}

impl FsckBackend for MockBackend {
    fn load_superblock(&mut self) -> Result<Superblock> {
        Ok(self.superblock)
    }

    fn load_all_entries(&mut self) -> Result<Vec<Entry>> {
        Ok(self.entries.clone())
    }

    fn load_block_map(&mut self) -> Result<Vec<u32>> {
        Ok(self.map.clone())
    }
}
