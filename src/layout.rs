// src/layout.rs
use std::mem;

use crate::config::*;

// -------------------- Estructuras en disco --------------------
//
// Los campos se serializan a mano en little-endian; `repr(C)` sólo documenta
// el orden y permite comprobar los tamaños en compilación.

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuperblockDisk {
    pub magic: u32,
    pub block_count: u32,
    pub file_table_blocks: u32,
    pub block_map_blocks: u32,
    pub total_files: u32,
    /// Campo heredado; la raíz siempre es la entrada 0.
    pub root_dir_block: u32,
    pub reserved: [u8; 488],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryDisk {
    pub status: u8,
    pub file_type: u8,
    pub name: [u8; NAME_FIELD_LEN],
    pub size: u32,
    pub start_block: u32,
    pub parent: u32,
    pub reserved: [u8; 16],
}

const _: () = assert!(mem::size_of::<SuperblockDisk>() == BLOCK_SIZE);
const _: () = assert!(mem::size_of::<EntryDisk>() == ENTRY_SIZE);

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

impl SuperblockDisk {
    pub fn new(block_count: u32, file_table_blocks: u32, block_map_blocks: u32, total_files: u32) -> Self {
        Self {
            magic: CHAINFS_MAGIC,
            block_count,
            file_table_blocks,
            block_map_blocks,
            total_files,
            root_dir_block: 0,
            reserved: [0u8; 488],
        }
    }

    pub fn from_bytes(buf: &[u8; BLOCK_SIZE]) -> Self {
        let mut reserved = [0u8; 488];
        reserved.copy_from_slice(&buf[24..]);
        Self {
            magic: le_u32(buf, 0),
            block_count: le_u32(buf, 4),
            file_table_blocks: le_u32(buf, 8),
            block_map_blocks: le_u32(buf, 12),
            total_files: le_u32(buf, 16),
            root_dir_block: le_u32(buf, 20),
            reserved,
        }
    }

    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut buf = [0u8; BLOCK_SIZE];
        put_u32(&mut buf, 0, self.magic);
        put_u32(&mut buf, 4, self.block_count);
        put_u32(&mut buf, 8, self.file_table_blocks);
        put_u32(&mut buf, 12, self.block_map_blocks);
        put_u32(&mut buf, 16, self.total_files);
        put_u32(&mut buf, 20, self.root_dir_block);
        buf[24..].copy_from_slice(&self.reserved);
        buf
    }
}

impl EntryDisk {
    pub fn from_bytes(buf: &[u8]) -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        name.copy_from_slice(&buf[2..32]);
        let mut reserved = [0u8; 16];
        reserved.copy_from_slice(&buf[44..ENTRY_SIZE]);
        Self {
            status: buf[0],
            file_type: buf[1],
            name,
            size: le_u32(buf, 32),
            start_block: le_u32(buf, 36),
            parent: le_u32(buf, 40),
            reserved,
        }
    }

    /// El área reservada siempre se escribe a cero.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut buf = [0u8; ENTRY_SIZE];
        buf[0] = self.status;
        buf[1] = self.file_type;
        buf[2..32].copy_from_slice(&self.name);
        put_u32(&mut buf, 32, self.size);
        put_u32(&mut buf, 36, self.start_block);
        put_u32(&mut buf, 40, self.parent);
        buf
    }
}

// -----------------------------------------------------------------------------
// Vista en memoria de una entrada
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Unknown(u8),
}

impl EntryKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            TYPE_FILE => EntryKind::File,
            TYPE_DIR => EntryKind::Directory,
            other => EntryKind::Unknown(other),
        }
    }

    pub fn as_raw(self) -> u8 {
        match self {
            EntryKind::File => TYPE_FILE,
            EntryKind::Directory => TYPE_DIR,
            EntryKind::Unknown(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Índice global del slot en la tabla.
    pub index: u32,
    pub status: u8,
    pub kind: EntryKind,
    pub name: String,
    pub size: u32,
    pub start_block: u32,
    pub parent: u32,
}

impl Entry {
    pub fn is_in_use(&self) -> bool {
        self.status == STATUS_IN_USE
    }

    pub fn is_free(&self) -> bool {
        self.status == STATUS_FREE
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Sector absoluto donde vive el registro de esta entrada.
    pub fn sector(&self) -> u32 {
        entry_sector(self.index)
    }

    pub fn from_disk(index: u32, raw: &EntryDisk) -> Self {
        Self {
            index,
            status: raw.status,
            kind: EntryKind::from_raw(raw.file_type),
            name: decode_name(&raw.name),
            size: raw.size,
            start_block: raw.start_block,
            parent: raw.parent,
        }
    }

    pub fn to_disk(&self) -> EntryDisk {
        EntryDisk {
            status: self.status,
            file_type: self.kind.as_raw(),
            name: encode_name(&self.name),
            size: self.size,
            start_block: self.start_block,
            parent: self.parent,
            reserved: [0u8; 16],
        }
    }
}

/// Slot `i` -> sector `1 + i / 8`.
pub fn entry_sector(index: u32) -> u32 {
    1 + index / ENTRIES_PER_SECTOR
}

/// Desplazamiento en bytes del slot dentro de su sector.
pub fn entry_offset(index: u32) -> usize {
    (index % ENTRIES_PER_SECTOR) as usize * ENTRY_SIZE
}

/// Hasta el primer NUL; los bytes UTF-8 inválidos se descartan.
pub fn decode_name(raw: &[u8; NAME_FIELD_LEN]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end])
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Trunca a 30 bytes y rellena con NUL.
pub fn encode_name(name: &str) -> [u8; NAME_FIELD_LEN] {
    let mut out = [0u8; NAME_FIELD_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(NAME_FIELD_LEN);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superblock_field_offsets() {
        let sb = SuperblockDisk::new(64, 2, 1, 16);
        let bytes = sb.to_bytes();
        assert_eq!(&bytes[0..4], &[0xBE, 0xBA, 0xFE, 0xCA]);
        assert_eq!(&bytes[4..8], &64u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &16u32.to_le_bytes());
        assert!(bytes[24..].iter().all(|&b| b == 0));
        assert_eq!(SuperblockDisk::from_bytes(&bytes), sb);
    }

    #[test]
    fn entry_field_offsets() {
        let entry = Entry {
            index: 3,
            status: STATUS_IN_USE,
            kind: EntryKind::File,
            name: "hello.txt".into(),
            size: 0x0102_0304,
            start_block: 7,
            parent: EOF_MARKER,
        };
        let bytes = entry.to_disk().to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 0);
        assert_eq!(&bytes[2..11], b"hello.txt");
        assert_eq!(bytes[11], 0);
        assert_eq!(&bytes[32..36], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[36..40], &7u32.to_le_bytes());
        assert_eq!(&bytes[40..44], &[0xFF; 4]);
        assert_eq!(Entry::from_disk(3, &EntryDisk::from_bytes(&bytes)), entry);
    }

    #[test]
    fn slot_addressing() {
        assert_eq!((entry_sector(0), entry_offset(0)), (1, 0));
        assert_eq!((entry_sector(7), entry_offset(7)), (1, 7 * 60));
        assert_eq!((entry_sector(8), entry_offset(8)), (2, 0));
        assert_eq!((entry_sector(17), entry_offset(17)), (3, 60));
    }

    #[test]
    fn name_without_nul_uses_full_field() {
        let raw = [b'a'; NAME_FIELD_LEN];
        assert_eq!(decode_name(&raw).len(), 30);
    }
}
