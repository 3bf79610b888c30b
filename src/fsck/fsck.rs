/*El archivo principal del fsck: toma la foto del backend y aplica las
reglas una por una, acumulando errores y advertencias en el reporte. No
modifica la imagen. */
use std::collections::{HashMap, HashSet};

use log::debug;

use super::{fsck_backend::FsckBackend, fsck_types::*};
use crate::config::{EOF_MARKER, FREE_BLOCK, MAX_NAME_LEN, ROOT_INDEX, ROOT_NAME};
use crate::error::Result;
use crate::file::blocks_needed;
use crate::layout::{Entry, EntryKind};
use crate::superblock::Superblock;

struct Snapshot {
    sb: Superblock,
    entries: Vec<Entry>,
    map: Vec<u32>,
}

impl Snapshot {
    fn live(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_in_use())
    }

    fn is_live_dir(&self, index: u32) -> bool {
        self.entries
            .get(index as usize)
            .map(|e| e.is_in_use() && e.is_dir())
            .unwrap_or(false)
    }
}

fn check_superblock(snap: &Snapshot, report: &mut FsckReport) {
    let sb = &snap.sb;

    // 1. La raíz tiene que existir en el slot 0
    let Some(root) = snap.entries.first() else {
        report.entry_error("Superblock: total_files = 0, there is no root entry".into());
        return;
    };
    if !root.is_in_use() {
        report.entry_error("Root entry (slot 0) is not in use".into());
    }
    if !root.is_dir() {
        report.entry_error("Root entry (slot 0) is not a directory".into());
    }
    if root.parent != EOF_MARKER {
        report.entry_error(format!(
            "Root entry: parent = {:#x}, expected the end-of-chain sentinel",
            root.parent
        ));
    }
    if root.name != ROOT_NAME {
        report.warn(format!("Root entry is named {:?}, expected \"/\"", root.name));
    }

    // 2. Regiones
    if sb.data_block_count() == 0 {
        report.warn("Superblock: the image has no data blocks".into());
    }
    if (snap.map.len() as u32) < sb.data_block_count() {
        report.block_error(format!(
            "Superblock: block map covers {} of {} data blocks",
            snap.map.len(),
            sb.data_block_count()
        ));
    }

    // 3. Campo heredado, sin uso
    if sb.root_dir_block() != 0 {
        report.warn(format!(
            "Superblock: legacy root_dir_block = {} is ignored",
            sb.root_dir_block()
        ));
    }
}

fn check_entries_basic(snap: &Snapshot, report: &mut FsckReport) {
    let data_blocks = snap.sb.data_block_count();

    for e in &snap.entries {
        if !e.is_in_use() && !e.is_free() {
            report.warn(format!("Entry {}: unknown status byte {}", e.index, e.status));
        }
    }

    for e in snap.live() {
        report.live_entries += 1;
        if e.index == ROOT_INDEX {
            continue;
        }

        if let EntryKind::Unknown(t) = e.kind {
            report.entry_error(format!("Entry {}: unknown type byte {}", e.index, t));
        }
        if e.name.is_empty() {
            report.entry_error(format!("Entry {}: empty name", e.index));
        } else if e.name.contains('/') {
            report.entry_error(format!("Entry {} ({:?}): name contains '/'", e.index, e.name));
        } else if e.name.len() > MAX_NAME_LEN {
            report.warn(format!(
                "Entry {} ({:?}): name is longer than {} bytes",
                e.index, e.name, MAX_NAME_LEN
            ));
        }

        if e.is_file() && e.start_block >= data_blocks {
            report.block_error(format!(
                "Entry {} ({:?}): start block {} out of range ({} data blocks)",
                e.index, e.name, e.start_block, data_blocks
            ));
        }
        if e.is_dir() && (e.size != 0 || e.start_block != 0) {
            report.warn(format!(
                "Entry {} ({:?}): directory with size {} and start block {}",
                e.index, e.name, e.size, e.start_block
            ));
        }
    }
}

fn check_parents(snap: &Snapshot, report: &mut FsckReport) {
    let mut names: HashMap<(u32, &str), u32> = HashMap::new();

    for e in snap.live().filter(|e| e.index != ROOT_INDEX) {
        let own_sector = e.sector();
        let canonical = e.parent != e.index && snap.is_live_dir(e.parent);
        let legacy = e.parent == own_sector
            && snap
                .live()
                .any(|d| d.is_dir() && d.index != e.index && d.sector() == own_sector);

        if !canonical && !legacy {
            report.entry_error(format!(
                "Entry {} ({:?}): orphan, parent {} is not a live directory",
                e.index, e.name, e.parent
            ));
            continue;
        }
        if legacy && !canonical {
            report.warn(format!(
                "Entry {} ({:?}): uses the legacy sector-based parent encoding",
                e.index, e.name
            ));
        }

        // Ambigüedad conocida: un hijo canónico cuyo padre coincide con el
        // número de sector aparece también bajo los otros directorios de ese
        // sector.
        if canonical && e.parent == own_sector {
            let others: Vec<String> = snap
                .live()
                .filter(|d| d.is_dir() && d.index != e.parent && d.index != e.index)
                .filter(|d| d.sector() == own_sector)
                .map(|d| d.index.to_string())
                .collect();
            if !others.is_empty() {
                report.warn(format!(
                    "Entry {} ({:?}): also visible under directories {} that share sector {}",
                    e.index,
                    e.name,
                    others.join(", "),
                    own_sector
                ));
            }
        }

        // Un directorio cuyo padre coincide con su propio sector cumple la
        // regla heredada para sí mismo: aparece en su propio listado y rmdir
        // nunca lo ve vacío.
        if e.is_dir() && e.parent == own_sector {
            report.warn(format!(
                "Entry {} ({:?}): directory lists itself as a child and cannot be removed",
                e.index, e.name
            ));
        }

        if canonical {
            if let Some(first) = names.insert((e.parent, e.name.as_str()), e.index) {
                report.warn(format!(
                    "Entry {} ({:?}): shadowed by entry {} with the same name in directory {}",
                    e.index, e.name, first, e.parent
                ));
                names.insert((e.parent, e.name.as_str()), first);
            }
        }
    }
}

/// Recorre las cadenas de los archivos vivos. Devuelve bloque -> dueño.
fn check_chains(snap: &Snapshot, report: &mut FsckReport) -> HashMap<u32, u32> {
    let data_blocks = snap.sb.data_block_count();
    let mut owners: HashMap<u32, u32> = HashMap::new();

    for e in snap.live().filter(|e| e.is_file() && e.start_block < data_blocks) {
        let mut seen = HashSet::new();
        let mut len = 0usize;
        let mut current = e.start_block;

        while current != EOF_MARKER {
            if current as usize >= snap.map.len() {
                report.block_error(format!(
                    "Entry {} ({:?}): chain leaves the data area at block {}",
                    e.index, e.name, current
                ));
                break;
            }
            if !seen.insert(current) {
                report.block_error(format!(
                    "Entry {} ({:?}): chain loops back to block {}",
                    e.index, e.name, current
                ));
                break;
            }
            if let Some(other) = owners.insert(current, e.index) {
                report.block_error(format!(
                    "Block {} is shared by entries {} and {}",
                    current, other, e.index
                ));
            }
            len += 1;

            let next = snap.map[current as usize];
            if next == FREE_BLOCK {
                report.block_error(format!(
                    "Entry {} ({:?}): block {} in the chain is marked free",
                    e.index, e.name, current
                ));
                break;
            }
            current = next;
        }

        let expected = blocks_needed(e.size as usize);
        if len < expected {
            report.entry_error(format!(
                "Entry {} ({:?}): size {} needs {} blocks but the chain has {}",
                e.index, e.name, e.size, expected, len
            ));
        } else if len > expected {
            report.warn(format!(
                "Entry {} ({:?}): chain has {} blocks, size {} only needs {}",
                e.index, e.name, len, e.size, expected
            ));
        }
    }

    report.used_blocks = owners.len() as u32;
    owners
}

fn check_block_map(snap: &Snapshot, owners: &HashMap<u32, u32>, report: &mut FsckReport) {
    for (block, &next) in snap.map.iter().enumerate() {
        if next == FREE_BLOCK {
            continue;
        }
        if next != EOF_MARKER && next as usize >= snap.map.len() {
            report.block_error(format!(
                "Block {}: next pointer {} out of range",
                block, next
            ));
        }
        if !owners.contains_key(&(block as u32)) {
            report.warn(format!(
                "Block {}: allocated but not referenced by any entry (leaked)",
                block
            ));
        }
    }
}

pub fn run_fsck<B: FsckBackend + ?Sized>(backend: &mut B) -> Result<FsckReport> {
    let snap = Snapshot {
        sb: backend.load_superblock()?,
        entries: backend.load_all_entries()?,
        map: backend.load_block_map()?,
    };
    let mut report = FsckReport::new();

    // --- Paso 1: superblock y raíz ---
    check_superblock(&snap, &mut report);

    // --- Paso 2: registros ---
    check_entries_basic(&snap, &mut report);

    // --- Paso 3: enlaces al padre ---
    check_parents(&snap, &mut report);

    // --- Paso 4: cadenas ---
    let owners = check_chains(&snap, &mut report);

    // --- Paso 5: mapa de bloques ---
    check_block_map(&snap, &owners, &mut report);

    debug!(
        "fsck: {} live entries, {} used blocks, {} errors, {} warnings",
        report.live_entries,
        report.used_blocks,
        report.errors.len(),
        report.warnings.len()
    );
    Ok(report)
}
