// src/bin/chainfs.rs
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chainfs::config::ImageConfig;
use chainfs::{logging, ChainFs, EntryKind, FileDevice};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "ChainFS host utility")]
struct Cli {
    /// Path to disk image (can be placed before or after subcommand)
    #[arg(short, long, global = true)]
    image: Option<PathBuf>,

    /// More output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the superblock
    Info,
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Print a file to stdout
    Cat { path: String },
    /// Copy a file out of the image
    Get { path: String, dest: PathBuf },
    /// Copy a host file into the image
    Put { src: PathBuf, path: String },
    /// Remove a file
    Rm { path: String },
    /// Create a directory
    Mkdir { path: String },
    /// Remove an empty directory
    Rmdir { path: String },
    /// Create a fresh filesystem
    Format { total_blocks: u32, max_files: u32 },
    /// Check the image for inconsistencies
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = ImageConfig::resolve(cli.image);

    match cli.command {
        // el único comando que no necesita una imagen válida
        Commands::Format { total_blocks, max_files } => {
            let fs = ChainFs::format_image(&cfg.image, total_blocks, max_files)?;
            fs.close()?;
        }
        Commands::Info => with_image(&cfg, |fs| {
            for (key, value) in fs.info().fields() {
                println!("{key}: {value}");
            }
            println!("free_blocks: {}", fs.free_blocks()?);
            println!("free_entries: {}", fs.free_entries()?);
            Ok(())
        })?,
        Commands::Ls { path } => with_image(&cfg, |fs| {
            for e in fs.ls(&path)? {
                let t = if e.kind == EntryKind::Directory { "d" } else { "f" };
                println!("{} {:8} {}", t, e.size, e.name);
            }
            Ok(())
        })?,
        Commands::Cat { path } => with_image(&cfg, |fs| {
            let data = fs.cat(&path)?;
            let mut out = io::stdout().lock();
            out.write_all(&data)?;
            out.flush()?;
            Ok(())
        })?,
        Commands::Get { path, dest } => with_image(&cfg, |fs| {
            let data = fs.cat(&path)?;
            std::fs::write(&dest, data)
                .with_context(|| format!("could not write {}", dest.display()))
        })?,
        Commands::Put { src, path } => with_image(&cfg, |fs| {
            let data = std::fs::read(&src)
                .with_context(|| format!("could not read {}", src.display()))?;
            fs.put(&path, &data)?;
            Ok(())
        })?,
        Commands::Rm { path } => with_image(&cfg, |fs| Ok(fs.rm(&path)?))?,
        Commands::Mkdir { path } => with_image(&cfg, |fs| {
            fs.mkdir(&path)?;
            Ok(())
        })?,
        Commands::Rmdir { path } => with_image(&cfg, |fs| Ok(fs.rmdir(&path)?))?,
        Commands::Check => {
            let rep = with_image(&cfg, |fs| Ok(fs.check()?))?;
            for w in &rep.warnings {
                println!("warning: {w}");
            }
            for e in &rep.errors {
                println!("error: {e}");
            }
            println!(
                "{} live entries, {} used blocks, {} errors, {} warnings",
                rep.live_entries,
                rep.used_blocks,
                rep.errors.len(),
                rep.warnings.len()
            );
            if !rep.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Abre la imagen, ejecuta `op` y la cierra (vaciando a disco) si todo fue bien.
fn with_image<T>(
    cfg: &ImageConfig,
    op: impl FnOnce(&mut ChainFs<FileDevice>) -> Result<T>,
) -> Result<T> {
    let mut fs = ChainFs::open(&cfg.image)?;
    let out = op(&mut fs)?;
    fs.close()?;
    Ok(out)
}
