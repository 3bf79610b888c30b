// src/dir.rs
use std::collections::BTreeMap;

use log::debug;

use crate::config::*;
use crate::device::BlockDevice;
use crate::entry_table::{entries, find_free_entry, write_entry};
use crate::error::{ChainFsError, Result};
use crate::file::parent_index;
use crate::fs::ChainFsInner;
use crate::layout::{entry_sector, Entry, EntryKind};
use crate::path::{legacy_parent_matches, resolve, split_parent, DirContext};

/// Índice padre -> hijos, construido bajo demanda con un recorrido completo
/// de la tabla. Es la única forma de la jerarquía: en disco sólo existen los
/// campos `parent`.
#[derive(Debug, Default)]
pub struct DirTree {
    by_parent: BTreeMap<u32, Vec<Entry>>,
}

impl DirTree {
    pub fn build<D: BlockDevice>(inner: &mut ChainFsInner<D>) -> Result<Self> {
        let mut by_parent: BTreeMap<u32, Vec<Entry>> = BTreeMap::new();
        for entry in entries(inner) {
            let entry = entry?;
            if entry.is_in_use() {
                by_parent.entry(entry.parent).or_default().push(entry);
            }
        }
        Ok(Self { by_parent })
    }

    /// Hijos de `dir_index` en orden ascendente de slot, aceptando las dos
    /// codificaciones del padre.
    pub fn children(&self, dir_index: u32) -> Vec<&Entry> {
        let mut out: BTreeMap<u32, &Entry> = BTreeMap::new();
        if let Some(list) = self.by_parent.get(&dir_index) {
            out.extend(list.iter().map(|e| (e.index, e)));
        }
        // Hijos con la codificación heredada: parent == sector del registro.
        if let Some(list) = self.by_parent.get(&entry_sector(dir_index)) {
            out.extend(
                list.iter()
                    .filter(|e| legacy_parent_matches(e, dir_index))
                    .map(|e| (e.index, e)),
            );
        }
        out.into_values().collect()
    }

    pub fn is_empty_dir(&self, dir_index: u32) -> bool {
        self.children(dir_index).is_empty()
    }
}

/// Entradas de un directorio en orden de slot (no hay orden por nombre).
/// Ruta vacía o `.` es el directorio actual.
pub fn list_directory<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<Vec<Entry>> {
    let dir_index = match path {
        "" | "." => ctx.cwd,
        "/" => ROOT_INDEX,
        _ => match resolve(inner, ctx, path)? {
            None => return Err(ChainFsError::ListTargetMissing),
            Some(e) if !e.is_dir() => return Err(ChainFsError::NotADirectory),
            Some(e) => e.index,
        },
    };
    let tree = DirTree::build(inner)?;
    Ok(tree.children(dir_index).into_iter().cloned().collect())
}

pub fn make_directory<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<Entry> {
    let (parent_path, name) = split_parent(path.trim_end_matches('/'));
    if name.is_empty() {
        return Err(ChainFsError::InvalidPath);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ChainFsError::NameTooLong { what: "name" });
    }
    if resolve(inner, ctx, path)?.is_some() {
        return Err(ChainFsError::AlreadyExists);
    }
    let parent = parent_index(inner, ctx, parent_path)?;

    let mut entry = find_free_entry(inner)?;
    entry.status = STATUS_IN_USE;
    entry.kind = EntryKind::Directory;
    entry.name = name.to_string();
    entry.size = 0;
    entry.start_block = 0;
    entry.parent = parent;
    write_entry(inner, &entry)?;

    debug!("mkdir {path:?}: slot {} under {parent}", entry.index);
    Ok(entry)
}

/// Sólo directorios vacíos; la raíz nunca se borra.
pub fn remove_directory<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<()> {
    let mut entry = match resolve(inner, ctx, path)? {
        Some(e) if e.is_dir() => e,
        _ => return Err(ChainFsError::DirectoryNotFound),
    };
    if entry.index == ROOT_INDEX {
        return Err(ChainFsError::RootRemoval);
    }
    if !DirTree::build(inner)?.is_empty_dir(entry.index) {
        return Err(ChainFsError::DirectoryNotEmpty);
    }
    entry.status = STATUS_FREE;
    write_entry(inner, &entry)?;
    debug!("rmdir {path:?}: slot {}", entry.index);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemDevice;
    use crate::file::write_file;

    fn fresh() -> ChainFsInner<MemDevice> {
        ChainFsInner::format(MemDevice::new(64), 64, 32).unwrap()
    }

    fn names(list: &[Entry]) -> Vec<&str> {
        list.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn mkdir_then_list_in_slot_order() {
        let mut inner = fresh();
        let ctx = DirContext::default();
        make_directory(&mut inner, &ctx, "/zeta").unwrap();
        write_file(&mut inner, &ctx, "/alpha", b"a").unwrap();
        let root = list_directory(&mut inner, &ctx, "/").unwrap();
        assert_eq!(names(&root), vec!["zeta", "alpha"]);
        assert_eq!(list_directory(&mut inner, &ctx, "").unwrap(), root);
    }

    #[test]
    fn mkdir_writes_empty_directory_record() {
        let mut inner = fresh();
        let ctx = DirContext::default();
        let d = make_directory(&mut inner, &ctx, "/d/").unwrap();
        assert_eq!(d.name, "d");
        assert!(d.is_dir());
        assert_eq!((d.size, d.start_block, d.parent), (0, 0, ROOT_INDEX));
    }

    #[test]
    fn mkdir_rejections() {
        let mut inner = fresh();
        let ctx = DirContext::default();
        make_directory(&mut inner, &ctx, "/d").unwrap();
        assert!(matches!(
            make_directory(&mut inner, &ctx, "/d"),
            Err(ChainFsError::AlreadyExists)
        ));
        assert!(matches!(
            make_directory(&mut inner, &ctx, "/missing/x"),
            Err(ChainFsError::ParentNotFound)
        ));
        assert!(matches!(
            make_directory(&mut inner, &ctx, "/"),
            Err(ChainFsError::InvalidPath)
        ));
        let long = format!("/{}", "d".repeat(30));
        assert_eq!(
            make_directory(&mut inner, &ctx, &long).unwrap_err().to_string(),
            "name too long (max 29)"
        );
    }

    #[test]
    fn list_on_file_or_missing_path() {
        let mut inner = fresh();
        let ctx = DirContext::default();
        write_file(&mut inner, &ctx, "/f", b"x").unwrap();
        assert!(matches!(
            list_directory(&mut inner, &ctx, "/f"),
            Err(ChainFsError::NotADirectory)
        ));
        assert!(matches!(
            list_directory(&mut inner, &ctx, "/nope"),
            Err(ChainFsError::ListTargetMissing)
        ));
    }

    #[test]
    fn rmdir_rules() {
        let mut inner = fresh();
        let ctx = DirContext::default();
        assert!(matches!(
            remove_directory(&mut inner, &ctx, "/"),
            Err(ChainFsError::RootRemoval)
        ));
        write_file(&mut inner, &ctx, "/f", b"x").unwrap();
        assert!(matches!(
            remove_directory(&mut inner, &ctx, "/f"),
            Err(ChainFsError::DirectoryNotFound)
        ));

        make_directory(&mut inner, &ctx, "/d").unwrap();
        remove_directory(&mut inner, &ctx, "/d").unwrap();
        assert!(resolve(&mut inner, &ctx, "/d").unwrap().is_none());
    }

    #[test]
    fn tree_merges_both_encodings_without_duplicates() {
        let mut inner = fresh();
        // directorio 1 (sector 1); hijo canónico en slot 20 y hijo heredado en
        // slot 5, que vive en el sector 1 y guarda parent = 1.
        let child = |index: u32, name: &str, parent: u32| Entry {
            index,
            status: STATUS_IN_USE,
            kind: EntryKind::File,
            name: name.into(),
            size: 0,
            start_block: 0,
            parent,
        };
        let dir = Entry {
            kind: EntryKind::Directory,
            ..child(1, "d", ROOT_INDEX)
        };
        write_entry(&mut inner, &dir).unwrap();
        write_entry(&mut inner, &child(20, "canon", 1)).unwrap();
        write_entry(&mut inner, &child(5, "legacy", 1)).unwrap();

        let tree = DirTree::build(&mut inner).unwrap();
        let kids: Vec<u32> = tree.children(1).iter().map(|e| e.index).collect();
        assert_eq!(kids, vec![5, 20]);
    }
}
