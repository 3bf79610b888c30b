// src/fs.rs
use std::path::Path;

use log::{debug, info};

use crate::block_map;
use crate::device::{BlockDevice, FileDevice};
use crate::dir;
use crate::entry_table;
use crate::error::Result;
use crate::file;
use crate::fsck::{self, FsckReport};
use crate::layout::Entry;
use crate::path::{self, DirContext};
use crate::superblock::{Geometry, Superblock};

// -------------------- Estado del FS --------------------

/// Dispositivo + superblock ya leído. Es lo único que se conserva entre
/// operaciones; todo lo demás se lee del disco en cada llamada.
pub struct ChainFsInner<D> {
    pub device: D,
    pub superblock: Superblock,
}

impl<D: BlockDevice> ChainFsInner<D> {
    pub fn load(mut device: D) -> Result<Self> {
        let superblock = Superblock::load(&mut device)?;
        Ok(Self { device, superblock })
    }

    pub fn format(mut device: D, total_blocks: u32, max_files: u32) -> Result<Self> {
        let superblock = Superblock::format(&mut device, total_blocks, max_files)?;
        Ok(Self { device, superblock })
    }
}

/// Resumen del superblock tal como lo muestra `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Info {
    pub block_count: u32,
    pub file_table_blocks: u32,
    pub block_map_blocks: u32,
    pub total_files: u32,
    pub data_area_start: u32,
    pub root_dir_block: u32,
}

impl Info {
    /// Pares clave/valor en el orden en que se imprimen.
    pub fn fields(&self) -> [(&'static str, u32); 6] {
        [
            ("block_count", self.block_count),
            ("file_table_blocks", self.file_table_blocks),
            ("block_map_blocks", self.block_map_blocks),
            ("total_files", self.total_files),
            ("data_area_start", self.data_area_start),
            ("root_dir_block", self.root_dir_block),
        ]
    }
}

/// API pública: una sesión sobre una imagen.
pub struct ChainFs<D> {
    inner: ChainFsInner<D>,
    ctx: DirContext,
}

impl ChainFs<FileDevice> {
    /// Abre una imagen existente y valida su superblock.
    pub fn open(image: &Path) -> Result<Self> {
        debug!("open {:?}", image);
        Self::with_device(FileDevice::open(image)?)
    }

    /// Crea (o sobrescribe) la imagen con el tamaño justo y la formatea. La
    /// geometría se valida antes de tocar el archivo, así que un formato
    /// rechazado deja la imagen anterior intacta.
    pub fn format_image(image: &Path, total_blocks: u32, max_files: u32) -> Result<Self> {
        Geometry::compute(total_blocks, max_files)?;
        info!("format {:?}", image);
        Self::format(FileDevice::create(image, total_blocks)?, total_blocks, max_files)
    }
}

impl<D: BlockDevice> ChainFs<D> {
    pub fn with_device(device: D) -> Result<Self> {
        Ok(Self {
            inner: ChainFsInner::load(device)?,
            ctx: DirContext::default(),
        })
    }

    pub fn format(device: D, total_blocks: u32, max_files: u32) -> Result<Self> {
        Ok(Self {
            inner: ChainFsInner::format(device, total_blocks, max_files)?,
            ctx: DirContext::default(),
        })
    }

    pub fn superblock(&self) -> &Superblock {
        &self.inner.superblock
    }

    pub fn current_dir(&self) -> u32 {
        self.ctx.cwd
    }

    pub fn info(&self) -> Info {
        let sb = &self.inner.superblock;
        Info {
            block_count: sb.block_count(),
            file_table_blocks: sb.file_table_blocks(),
            block_map_blocks: sb.block_map_blocks(),
            total_files: sb.total_files(),
            data_area_start: sb.data_area_start,
            root_dir_block: sb.root_dir_block(),
        }
    }

    pub fn free_blocks(&mut self) -> Result<u32> {
        block_map::free_count(&mut self.inner)
    }

    pub fn free_entries(&mut self) -> Result<u32> {
        entry_table::free_count(&mut self.inner)
    }

    /// Registro crudo del slot `index`, esté en uso o no.
    pub fn entry(&mut self, index: u32) -> Result<Entry> {
        entry_table::read_entry(&mut self.inner, index)
    }

    pub fn resolve(&mut self, path: &str) -> Result<Option<Entry>> {
        path::resolve(&mut self.inner, &self.ctx, path)
    }

    /// Bloques de datos de la cadena que empieza en `start`.
    pub fn chain(&mut self, start: u32) -> Result<Vec<u32>> {
        block_map::chain(&mut self.inner, start)
    }

    pub fn ls(&mut self, path: &str) -> Result<Vec<Entry>> {
        dir::list_directory(&mut self.inner, &self.ctx, path)
    }

    pub fn cat(&mut self, path: &str) -> Result<Vec<u8>> {
        file::read_file(&mut self.inner, &self.ctx, path)
    }

    pub fn put(&mut self, path: &str, payload: &[u8]) -> Result<Entry> {
        file::write_file(&mut self.inner, &self.ctx, path, payload)
    }

    pub fn rm(&mut self, path: &str) -> Result<()> {
        file::delete_file(&mut self.inner, &self.ctx, path)
    }

    pub fn mkdir(&mut self, path: &str) -> Result<Entry> {
        dir::make_directory(&mut self.inner, &self.ctx, path)
    }

    pub fn rmdir(&mut self, path: &str) -> Result<()> {
        dir::remove_directory(&mut self.inner, &self.ctx, path)
    }

    /// Revisión de consistencia de solo lectura.
    pub fn check(&mut self) -> Result<FsckReport> {
        fsck::run_fsck(&mut self.inner)
    }

    /// Vacía el dispositivo y lo devuelve; la sesión termina aquí.
    pub fn close(mut self) -> Result<D> {
        self.inner.device.flush()?;
        Ok(self.inner.device)
    }
}
