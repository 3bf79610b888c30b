// src/path.rs
//! Resolución de rutas a slots de la tabla de entradas.
//!
//! La jerarquía no se guarda en disco: un hijo apunta a su directorio con el
//! campo `parent`. Hay imágenes antiguas que guardaron ahí el número de
//! sector del propio registro en lugar del índice del padre, y las dos
//! codificaciones se siguen aceptando (ver [`parent_matches`]).

use log::trace;

use crate::config::ROOT_INDEX;
use crate::device::BlockDevice;
use crate::entry_table::{entries, read_entry};
use crate::error::Result;
use crate::fs::ChainFsInner;
use crate::layout::{entry_sector, Entry};

/// Directorio desde el que se resuelven las rutas relativas. No hay
/// operación para cambiarlo, así que en la práctica siempre es la raíz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirContext {
    pub cwd: u32,
}

impl Default for DirContext {
    fn default() -> Self {
        Self { cwd: ROOT_INDEX }
    }
}

/// Quita la barra inicial y descarta componentes vacíos, así que `//a///b/`
/// equivale a `/a/b`.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.trim();
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').filter(|c| !c.is_empty()).collect()
}

/// Separa `(directorio, nombre)` por la última barra. `"/a/b"` da
/// `("/a", "b")`, `"b"` da `("", "b")` y `"/a/"` da `("/a", "")`.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        None => ("", path),
        Some(i) => {
            let head = &path[..=i];
            let trimmed = head.trim_end_matches('/');
            let head = if trimmed.is_empty() { &head[..1] } else { trimmed };
            (head, &path[i + 1..])
        }
    }
}

/// `true` si `entry` es hijo de `dir_index` en cualquiera de las dos
/// codificaciones del campo `parent`.
///
/// Ambigüedad conocida: la rama heredada compara sectores, así que dos
/// directorios que comparten sector de la tabla ven también a los hijos del
/// directorio cuyo índice coincide con ese número de sector. Un directorio
/// cuyo `parent` es igual a su propio sector (p. ej. el slot 2 con padre 1)
/// cumple la regla para sí mismo y aparece en su propio listado. Se mantiene
/// tal cual para no cambiar el significado de imágenes existentes.
pub fn parent_matches(entry: &Entry, dir_index: u32) -> bool {
    entry.parent == dir_index || legacy_parent_matches(entry, dir_index)
}

/// Codificación obsoleta: `parent` contiene el sector del propio registro, y
/// ese sector es también el del registro del directorio. Sólo se lee; nada
/// escribe ya este formato.
pub fn legacy_parent_matches(entry: &Entry, dir_index: u32) -> bool {
    let own = entry.sector();
    entry.parent == own && own == entry_sector(dir_index)
}

/// Entrada en uso llamada `name` dentro de `dir_index`.
pub fn find_in_directory<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    dir_index: u32,
    name: &str,
) -> Result<Option<Entry>> {
    for entry in entries(inner) {
        let entry = entry?;
        if !entry.is_in_use() || entry.name != name {
            continue;
        }
        if parent_matches(&entry, dir_index) {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Traduce una ruta a su entrada. `None` si algún componente no existe o si
/// un componente intermedio no es directorio. El tipo del último componente
/// lo valida quien llama.
pub fn resolve<D: BlockDevice>(
    inner: &mut ChainFsInner<D>,
    ctx: &DirContext,
    path: &str,
) -> Result<Option<Entry>> {
    if path == "/" {
        return read_entry(inner, ROOT_INDEX).map(Some);
    }

    let parts = split_path(path);
    let mut current = if path.starts_with('/') { ROOT_INDEX } else { ctx.cwd };

    for (i, comp) in parts.iter().enumerate() {
        let Some(entry) = find_in_directory(inner, current, comp)? else {
            trace!("resolve {path:?}: {comp:?} not found under {current}");
            return Ok(None);
        };
        if i == parts.len() - 1 {
            return Ok(Some(entry));
        }
        if !entry.is_dir() {
            return Ok(None);
        }
        current = entry.index;
    }
    Ok(None)
}
