// src/file.rs
use log::{debug, warn};

use crate::block_map::{chain, find_free_blocks, free_chain, get_next, link_chain};
use crate::config::*;
use crate::device::BlockDevice;
use crate::entry_table::{find_free_entry, write_entry};
use crate::error::{ChainFsError, Result};
use crate::fs::ChainFsInner;
use crate::layout::{Entry, EntryKind};
use crate::path::{resolve, split_parent, DirContext};

/// Índice del directorio que contendrá `parent_path`. Vacío es el
/// directorio actual y `/` la raíz.
pub(crate) fn parent_index<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    parent_path: &str,
) -> Result<u32> {
    match parent_path {
        "" => Ok(ctx.cwd),
        "/" => Ok(ROOT_INDEX),
        _ => match resolve(inner, ctx, parent_path)? {
            Some(dir) if dir.is_dir() => Ok(dir.index),
            _ => Err(ChainFsError::ParentNotFound),
        },
    }
}

/// Bloques que ocupa un archivo; incluso uno vacío ocupa uno.
pub fn blocks_needed(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE).max(1)
}

/// Contenido de una entrada siguiendo su cadena. Se corta en cuanto se han
/// leído `size` bytes, al llegar a EOF o si falta la entrada del mapa.
pub fn read_entry_data<D: BlockDevice>(inner: &mut ChainFsInner<D>, entry: &Entry) -> Result<Vec<u8>> {
    let limit = inner.superblock.map_capacity();
    let mut remaining = entry.size as usize;
    let mut data = Vec::with_capacity(remaining);
    let mut current = entry.start_block;
    let mut hops = 0u32;

    while remaining > 0 && current != EOF_MARKER {
        if hops >= limit {
            return Err(ChainFsError::UnterminatedChain {
                start: entry.start_block,
                hops,
            });
        }
        let sector = inner
            .device
            .read_sector(inner.superblock.data_area_start.saturating_add(current))?;
        let take = remaining.min(BLOCK_SIZE);
        data.extend_from_slice(&sector[..take]);
        remaining -= take;
        hops += 1;

        if remaining > 0 {
            match get_next(inner, current)? {
                Some(next) => current = next,
                None => {
                    warn!("{:?}: block {current} has no map entry, returning partial data", entry.name);
                    break;
                }
            }
        }
    }
    Ok(data)
}

pub fn read_file<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<Vec<u8>> {
    match resolve(inner, ctx, path)? {
        Some(entry) if entry.is_file() => read_entry_data(inner, &entry),
        _ => Err(ChainFsError::FileNotFound),
    }
}

/// Crea o sobrescribe el archivo en `path`.
///
/// Orden de escritura: datos y enlaces de la cadena primero, registro de la
/// entrada al final. Hasta que se escribe el registro la cadena nueva no es
/// visible; si algo falla antes, lo peor que queda son bloques reservados
/// sin dueño.
pub fn write_file<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
    payload: &[u8],
) -> Result<Entry> {
    let (parent_path, name) = split_parent(path);
    if name.is_empty() {
        return Err(ChainFsError::InvalidPath);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ChainFsError::NameTooLong { what: "filename" });
    }
    let size = u32::try_from(payload.len()).map_err(|_| ChainFsError::NoFreeBlocks)?;

    let parent = parent_index(inner, ctx, parent_path)?;

    let existing = resolve(inner, ctx, path)?;
    if let Some(e) = &existing {
        if !e.is_file() {
            return Err(ChainFsError::NotAFile);
        }
    }

    // Sobrescritura: se libera la cadena vieja antes de reservar para que sus
    // bloques puedan reutilizarse.
    let (mut entry, old_chain) = match existing {
        Some(e) => {
            let old = chain(inner, e.start_block)?;
            free_chain(inner, e.start_block)?;
            (e, Some(old))
        }
        None => (find_free_entry(inner)?, None),
    };

    let needed = blocks_needed(payload.len());
    let Some(blocks) = find_free_blocks(inner, needed)? else {
        if let Some(old) = old_chain {
            // Nada se ha escrito aún: se restaura la cadena y la entrada
            // vieja sigue siendo válida.
            link_chain(inner, &old)?;
        }
        return Err(ChainFsError::NoFreeBlocks);
    };

    for (block, chunk) in blocks.iter().zip(payload.chunks(BLOCK_SIZE)) {
        let mut sector = [0u8; BLOCK_SIZE];
        sector[..chunk.len()].copy_from_slice(chunk);
        inner
            .device
            .write_sector(inner.superblock.data_area_start + block, &sector)?;
    }
    if payload.is_empty() {
        inner
            .device
            .write_sector(inner.superblock.data_area_start + blocks[0], &[0u8; BLOCK_SIZE])?;
    }
    link_chain(inner, &blocks)?;

    entry.status = STATUS_IN_USE;
    entry.kind = EntryKind::File;
    entry.name = name.to_string();
    entry.size = size;
    entry.start_block = blocks[0];
    entry.parent = parent;
    write_entry(inner, &entry)?;

    debug!(
        "write_file {path:?}: slot {}, {} bytes in {} blocks from {}",
        entry.index,
        size,
        blocks.len(),
        entry.start_block
    );
    Ok(entry)
}

/// Libera la cadena y limpia sólo el byte de estado; el resto del registro
/// queda como estaba hasta que el slot se reutilice.
pub fn delete_file<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<()> {
    let mut entry = match resolve(inner, ctx, path)? {
        Some(e) if e.is_file() => e,
        _ => return Err(ChainFsError::FileNotFound),
    };
    let freed = free_chain(inner, entry.start_block)?;
    entry.status = STATUS_FREE;
    write_entry(inner, &entry)?;
    debug!("delete_file {path:?}: slot {}, {freed} blocks freed", entry.index);
    Ok(())
}
