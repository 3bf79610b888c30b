mod block_map;
mod dir;
mod entry_table;
mod file;
mod fs;
mod path;
mod superblock;

pub mod config;
pub mod device;
pub mod error;
pub mod fsck;
pub mod layout;
pub mod logging;

pub use crate::device::{BlockDevice, FileDevice, MemDevice, Sector};
pub use crate::dir::DirTree;
pub use crate::error::{ChainFsError, ErrorKind, Result};
pub use crate::fs::{ChainFs, ChainFsInner, Info};
pub use crate::fsck::FsckReport;
pub use crate::layout::{Entry, EntryKind};
pub use crate::path::{split_path, DirContext};
pub use crate::superblock::{Geometry, Superblock};
pub use crate::config::{
    BLOCK_SIZE,
    CHAINFS_MAGIC,
    EOF_MARKER,
    FREE_BLOCK,
    MAX_NAME_LEN,
    ROOT_INDEX,
};
