// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{CHAINFS_MAGIC, MAX_NAME_LEN};

/// Categorías de error que ven las herramientas externas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Capacity,
    NotFound,
    State,
    Io,
    Corruption,
}

#[derive(Debug, Error)]
pub enum ChainFsError {
    // --- Format ---
    #[error("invalid magic 0x{found:x}, expected 0x{:x}", CHAINFS_MAGIC)]
    BadMagic { found: u32 },
    #[error("malformed superblock: {0}")]
    MalformedHeader(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    // --- Capacity ---
    #[error("no free file entries")]
    NoFreeEntries,
    #[error("not enough free blocks")]
    NoFreeBlocks,
    #[error("block map index out of range")]
    BlockMapIndexOutOfRange { index: u32 },
    #[error("entry index {index} out of range (capacity {capacity})")]
    EntryIndexOutOfRange { index: u32, capacity: u32 },

    // --- NotFound ---
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),
    #[error("file not found")]
    FileNotFound,
    #[error("directory not found")]
    DirectoryNotFound,
    #[error("parent directory not found")]
    ParentNotFound,
    /// `ls` sobre una ruta que no resuelve.
    #[error("not a directory")]
    ListTargetMissing,

    // --- State ---
    #[error("not a directory")]
    NotADirectory,
    #[error("path exists and is not a file")]
    NotAFile,
    #[error("directory not empty")]
    DirectoryNotEmpty,
    #[error("cannot remove root")]
    RootRemoval,
    #[error("already exists")]
    AlreadyExists,
    #[error("invalid path")]
    InvalidPath,
    #[error("{what} too long (max {})", MAX_NAME_LEN)]
    NameTooLong { what: &'static str },

    // --- Io ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("short read at block {sector}")]
    ShortRead { sector: u32 },
    #[error("sector write size mismatch")]
    SectorSizeMismatch { len: usize },

    // --- Corruption ---
    #[error("block chain starting at {start} does not terminate after {hops} hops")]
    UnterminatedChain { start: u32, hops: u32 },
}

impl ChainFsError {
    pub fn kind(&self) -> ErrorKind {
        use ChainFsError::*;
        match self {
            BadMagic { .. } | MalformedHeader(_) | InvalidGeometry(_) => ErrorKind::Format,
            NoFreeEntries
            | NoFreeBlocks
            | BlockMapIndexOutOfRange { .. }
            | EntryIndexOutOfRange { .. } => ErrorKind::Capacity,
            ImageNotFound(_) | FileNotFound | DirectoryNotFound | ParentNotFound
            | ListTargetMissing => ErrorKind::NotFound,
            NotADirectory | NotAFile | DirectoryNotEmpty | RootRemoval | AlreadyExists
            | InvalidPath | NameTooLong { .. } => ErrorKind::State,
            Io(_) | ShortRead { .. } | SectorSizeMismatch { .. } => ErrorKind::Io,
            UnterminatedChain { .. } => ErrorKind::Corruption,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainFsError>;
