// src/bin/mkfs_chainfs.rs
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chainfs::{logging, ChainFs};

const USAGE: &str = "Usage: mkfs.chainfs image.img total_blocks max_files";

fn main() -> Result<()> {
    logging::init(0);

    // 1. Leer argumentos: imagen, bloques totales y número de entradas
    let mut args = env::args().skip(1);
    let image = args.next().map(PathBuf::from).context(USAGE)?;
    let total_blocks: u32 = args
        .next()
        .context(USAGE)?
        .parse()
        .context("total_blocks must be a positive integer")?;
    let max_files: u32 = args
        .next()
        .context(USAGE)?
        .parse()
        .context("max_files must be a positive integer")?;

    if args.next().is_some() {
        return Err(anyhow!("{USAGE} (exactly three arguments)"));
    }

    // 2. Crear la imagen y escribir superblock, tabla y mapa
    let fs = ChainFs::format_image(&image, total_blocks, max_files)
        .with_context(|| format!("could not format {}", image.display()))?;
    let info = fs.info();
    fs.close()?;

    println!(
        "mkfs.chainfs: {} created with {} blocks, {} entries, {} data blocks (data area at sector {}).",
        image.display(),
        info.block_count,
        info.total_files,
        info.block_count - info.data_area_start,
        info.data_area_start
    );

    Ok(())
}
