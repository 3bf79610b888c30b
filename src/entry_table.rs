// src/entry_table.rs
use log::trace;

use crate::config::ENTRY_SIZE;
use crate::device::BlockDevice;
use crate::error::{ChainFsError, Result};
use crate::fs::ChainFsInner;
use crate::layout::{entry_offset, entry_sector, Entry, EntryDisk};

fn check_index<D>(inner: &ChainFsInner<D>, index: u32) -> Result<()> {
    let capacity = inner.superblock.total_files();
    if index >= capacity {
        return Err(ChainFsError::EntryIndexOutOfRange { index, capacity });
    }
    Ok(())
}

/// Lee el registro del slot `index`.
pub fn read_entry<D: BlockDevice>(inner: &mut ChainFsInner<D>, index: u32) -> Result<Entry> {
    check_index(inner, index)?;
    let sector = inner.device.read_sector(entry_sector(index))?;
    let start = entry_offset(index);
    let raw = EntryDisk::from_bytes(&sector[start..start + ENTRY_SIZE]);
    Ok(Entry::from_disk(index, &raw))
}

/// Read-modify-write del sector que contiene la entrada. No es atómico
/// respecto a los otros slots del mismo sector.
pub fn write_entry<D: BlockDevice>(inner: &mut ChainFsInner<D>, entry: &Entry) -> Result<()> {
    check_index(inner, entry.index)?;
    let sector_no = entry_sector(entry.index);
    let mut sector = inner.device.read_sector(sector_no)?;
    let start = entry_offset(entry.index);
    sector[start..start + ENTRY_SIZE].copy_from_slice(&entry.to_disk().to_bytes());
    trace!("write_entry {} ({:?}) -> sector {}", entry.index, entry.name, sector_no);
    inner.device.write_sector(sector_no, &sector)
}

/// Primer slot libre en orden ascendente.
pub fn find_free_entry<D: BlockDevice>(inner: &mut ChainFsInner<D>) -> Result<Entry> {
    for entry in entries(inner) {
        let entry = entry?;
        if entry.is_free() {
            return Ok(entry);
        }
    }
    Err(ChainFsError::NoFreeEntries)
}

pub fn free_count<D: BlockDevice>(inner: &mut ChainFsInner<D>) -> Result<u32> {
    let mut count = 0;
    for entry in entries(inner) {
        if entry?.is_free() {
            count += 1;
        }
    }
    Ok(count)
}

/// Recorrido perezoso de todos los slots en orden de índice. Para volver a
/// empezar basta con pedir otro iterador.
pub fn entries<D: BlockDevice>(inner: &mut ChainFsInner<D>) -> EntryIter<'_, D> {
    EntryIter { inner, next: 0 }
}

pub struct EntryIter<'a, D> {
    inner: &'a mut ChainFsInner<D>,
    next: u32,
}

impl<D: BlockDevice> Iterator for EntryIter<'_, D> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.inner.superblock.total_files() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(read_entry(self.inner, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.inner.superblock.total_files().saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}
