// src/device.rs
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::trace;

use crate::config::BLOCK_SIZE;
use crate::error::{ChainFsError, Result};

pub type Sector = [u8; BLOCK_SIZE];

/// Lectura/escritura posicionada de sectores de 512 bytes.
///
/// No hay caché: cada llamada va directo al almacenamiento y cada escritura
/// se vacía inmediatamente.
pub trait BlockDevice {
    fn read_sector(&mut self, sector: u32) -> Result<Sector>;

    /// `data.len()` debe ser exactamente `BLOCK_SIZE`.
    fn write_sector(&mut self, sector: u32, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn sector_offset(sector: u32) -> u64 {
    sector as u64 * BLOCK_SIZE as u64
}

// -----------------------------------------------------------------------------
// Imagen respaldada por un archivo del host
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileDevice {
    file: File,
}

impl FileDevice {
    /// Abre una imagen existente en modo lectura/escritura.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChainFsError::ImageNotFound(path.to_path_buf()));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Crea (o trunca) la imagen y le da el tamaño de `total_blocks` sectores.
    pub fn create(path: &Path, total_blocks: u32) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(sector_offset(total_blocks))?;
        Ok(Self { file })
    }
}

impl BlockDevice for FileDevice {
    fn read_sector(&mut self, sector: u32) -> Result<Sector> {
        trace!("read_sector {sector}");
        self.file.seek(SeekFrom::Start(sector_offset(sector)))?;
        let mut buf = [0u8; BLOCK_SIZE];
        match self.file.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ChainFsError::ShortRead { sector })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_sector(&mut self, sector: u32, data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(ChainFsError::SectorSizeMismatch { len: data.len() });
        }
        trace!("write_sector {sector}");
        self.file.seek(SeekFrom::Start(sector_offset(sector)))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Imagen en memoria (pruebas, construcción de imágenes sin tocar el disco)
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemDevice {
    data: Vec<u8>,
}

impl MemDevice {
    pub fn new(sectors: u32) -> Self {
        Self {
            data: vec![0u8; sector_offset(sectors) as usize],
        }
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl BlockDevice for MemDevice {
    fn read_sector(&mut self, sector: u32) -> Result<Sector> {
        let start = sector_offset(sector) as usize;
        let end = start + BLOCK_SIZE;
        if end > self.data.len() {
            return Err(ChainFsError::ShortRead { sector });
        }
        let mut buf = [0u8; BLOCK_SIZE];
        buf.copy_from_slice(&self.data[start..end]);
        Ok(buf)
    }

    fn write_sector(&mut self, sector: u32, data: &[u8]) -> Result<()> {
        if data.len() != BLOCK_SIZE {
            return Err(ChainFsError::SectorSizeMismatch { len: data.len() });
        }
        let start = sector_offset(sector) as usize;
        let end = start + BLOCK_SIZE;
        // Igual que un archivo: escribir más allá del final lo agranda.
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(data);
        Ok(())
    }
}
