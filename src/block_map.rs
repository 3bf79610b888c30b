// src/block_map.rs
use log::{trace, warn};

use crate::config::{EOF_MARKER, FREE_BLOCK, MAP_ENTRIES_PER_SECTOR, MAP_ENTRY_SIZE};
use crate::device::BlockDevice;
use crate::error::{ChainFsError, Result};
use crate::fs::ChainFsInner;

/// (sector absoluto, offset en bytes) de la entrada del mapa de `block`, o
/// `None` si cae fuera de la región del mapa.
fn locate<D>(inner: &ChainFsInner<D>, block: u32) -> Option<(u32, usize)> {
    let map_block = block / MAP_ENTRIES_PER_SECTOR;
    if map_block >= inner.superblock.block_map_blocks() {
        return None;
    }
    let offset = (block % MAP_ENTRIES_PER_SECTOR) as usize * MAP_ENTRY_SIZE;
    Some((inner.superblock.block_map_start() + map_block, offset))
}

/// Siguiente bloque de la cadena. Fuera de rango devuelve `None` en vez de
/// fallar.
pub fn get_next<D: BlockDevice>(inner: &mut ChainFsInner<D>, block: u32) -> Result<Option<u32>> {
    let Some((sector_no, offset)) = locate(inner, block) else {
        return Ok(None);
    };
    let sector = inner.device.read_sector(sector_no)?;
    let mut raw = [0u8; MAP_ENTRY_SIZE];
    raw.copy_from_slice(&sector[offset..offset + MAP_ENTRY_SIZE]);
    Ok(Some(u32::from_le_bytes(raw)))
}

pub fn set_next<D: BlockDevice>(inner: &mut ChainFsInner<D>, block: u32, value: u32) -> Result<()> {
    let (sector_no, offset) =
        locate(inner, block).ok_or(ChainFsError::BlockMapIndexOutOfRange { index: block })?;
    let mut sector = inner.device.read_sector(sector_no)?;
    sector[offset..offset + MAP_ENTRY_SIZE].copy_from_slice(&value.to_le_bytes());
    trace!("set_next {block} -> {value:#x}");
    inner.device.write_sector(sector_no, &sector)
}

/// Los primeros `count` bloques libres en orden ascendente, sin preferencia
/// por bloques contiguos. `None` si no hay suficientes.
pub fn find_free_blocks<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    count: usize,
) -> Result<Option<Vec<u32>>> {
    let mut found = Vec::with_capacity(count);
    if count == 0 {
        return Ok(Some(found));
    }
    for block in 0..inner.superblock.data_block_count() {
        if get_next(inner, block)? == Some(FREE_BLOCK) {
            found.push(block);
            if found.len() == count {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

pub fn free_count<D: BlockDevice>(inner: &mut ChainFsInner<D>) -> Result<u32> {
    let mut count = 0;
    for block in 0..inner.superblock.data_block_count() {
        if get_next(inner, block)? == Some(FREE_BLOCK) {
            count += 1;
        }
    }
    Ok(count)
}

/// Bloques de la cadena que empieza en `start`, en orden.
///
/// Termina en EOF o en un bloque sin entrada en el mapa (ese bloque no se
/// incluye). Una cadena sin ciclos no puede tener más saltos que entradas
/// tiene el mapa; pasado ese límite se devuelve `UnterminatedChain`.
pub fn chain<D: BlockDevice>(inner: &mut ChainFsInner<D>, start: u32) -> Result<Vec<u32>> {
    let limit = inner.superblock.map_capacity();
    let mut blocks = Vec::new();
    let mut current = start;
    while current != EOF_MARKER {
        if blocks.len() as u32 >= limit {
            return Err(ChainFsError::UnterminatedChain {
                start,
                hops: blocks.len() as u32,
            });
        }
        match get_next(inner, current)? {
            Some(next) => {
                blocks.push(current);
                current = next;
            }
            None => {
                warn!("block {current} has no map entry, chain from {start} cut short");
                break;
            }
        }
    }
    Ok(blocks)
}

/// Enlaza `blocks` en orden y cierra con EOF.
pub fn link_chain<D: BlockDevice>(inner: &mut ChainFsInner<D>, blocks: &[u32]) -> Result<()> {
    for (i, &block) in blocks.iter().enumerate() {
        let next = blocks.get(i + 1).copied().unwrap_or(EOF_MARKER);
        set_next(inner, block, next)?;
    }
    Ok(())
}

/// Marca como libres todos los bloques de la cadena. La cadena se recorre
/// completa antes de tocar el mapa, así que una cadena corrupta se rechaza
/// sin haber liberado nada. Devuelve cuántos bloques se liberaron.
pub fn free_chain<D: BlockDevice>(inner: &mut ChainFsInner<D>, start: u32) -> Result<usize> {
    let blocks = chain(inner, start)?;
    for &block in &blocks {
        set_next(inner, block, FREE_BLOCK)?;
    }
    trace!("free_chain {start}: {} blocks", blocks.len());
    Ok(blocks.len())
}
