// src/bin/fsck_chainfs.rs
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chainfs::{logging, ChainFs, FsckReport};
use colored::*;

fn main() -> ExitCode {
    logging::init(0);

    match run() {
        Ok(rep) if rep.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<FsckReport> {
    let image = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("Usage: fsck.chainfs image.img")?;

    let mut fs = ChainFs::open(&image)?;
    let rep = fs.check()?;
    fs.close()?;

    print_report(&image, &rep);
    Ok(rep)
}

fn print_report(image: &Path, rep: &FsckReport) {
    println!("\n{}", " CHAINFS FILESYSTEM CHECK ".on_blue().bold());
    println!("{}", image.display().to_string().dimmed());
    println!("{}", "──────────────────────────────────────────".blue());

    // ——————————————————————————————————————————
    //       BLOQUES
    // ——————————————————————————————————————————
    println!("\n{}", "Blocks".bold().underline());

    if rep.blocks_ok {
        println!("  {} Blocks OK ({} in use)", "✓".green(), rep.used_blocks);
    } else {
        println!("  {} Block errors", "✗".red());
    }

    // ——————————————————————————————————————————
    //       ENTRADAS
    // ——————————————————————————————————————————
    println!("\n{}", "Entries".bold().underline());

    if rep.entries_ok {
        println!("  {} Entries OK ({} live)", "✓".green(), rep.live_entries);
    } else {
        println!("  {} Entry errors", "✗".red());
    }

    // ——————————————————————————————————————————
    //       DETALLE
    // ——————————————————————————————————————————
    println!("\n{}", "Problems found".bold().underline());

    if rep.errors.is_empty() && rep.warnings.is_empty() {
        println!("  {} None", "✓".green());
    }
    for err in &rep.errors {
        println!("  {} {}", "•".red(), err.red());
    }
    for w in &rep.warnings {
        println!("  {} {}", "•".yellow(), w.yellow());
    }

    // ——————————————————————————————————————————
    //       RESUMEN
    // ——————————————————————————————————————————
    println!("\n{}", "Summary".bold().underline());

    if rep.is_clean() {
        println!(
            "{} Filesystem clean ({} warnings).\n",
            "✓ OK".green().bold(),
            rep.warnings.len()
        );
    } else {
        println!(
            "{} {} errors found.\n",
            "✗ FSCK finished with errors:".red().bold(),
            rep.errors.len().to_string().yellow()
        );
    }
}
