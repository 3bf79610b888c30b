use std::process::Command;

use chainfs::{ChainFs, EntryKind, ErrorKind};

mod common;

#[test]
fn hello_world_session_on_a_real_image() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");

    let fs = ChainFs::format_image(&image, 64, 16).unwrap();
    fs.close().unwrap();
    assert_eq!(std::fs::metadata(&image).unwrap().len(), 64 * 512);

    let mut fs = ChainFs::open(&image).unwrap();
    fs.put("/hello.txt", b"hi").unwrap();

    let listing = fs.ls("/").unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "hello.txt");
    assert_eq!(listing[0].kind, EntryKind::File);
    assert_eq!(listing[0].size, 2);
    assert_eq!(fs.cat("/hello.txt").unwrap(), b"hi");

    fs.rm("/hello.txt").unwrap();
    assert!(fs.ls("/").unwrap().is_empty());
    fs.close().unwrap();
}

#[test]
fn data_survives_reopening_the_image() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");
    let big = common::payload(3000, 7);

    let mut fs = ChainFs::format_image(&image, 128, 18).unwrap();
    fs.mkdir("/docs").unwrap();
    fs.put("/docs/big.bin", &big).unwrap();
    fs.close().unwrap();

    let mut fs = ChainFs::open(&image).unwrap();
    assert_eq!(fs.cat("/docs/big.bin").unwrap(), big);
    assert!(fs.check().unwrap().is_clean());
}

#[test]
fn opening_garbage_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("junk.img");
    std::fs::write(&image, vec![0x55u8; 4096]).unwrap();

    let err = ChainFs::open(&image).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(err.to_string(), "invalid magic 0x55555555, expected 0xcafebabe");
}

#[test]
fn truncated_image_reports_short_read() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");
    let mut fs = ChainFs::format_image(&image, 64, 16).unwrap();
    fs.put("/x", &common::payload(512 * 20, 1)).unwrap();
    fs.close().unwrap();

    // se corta la imagen en medio del área de datos
    let file = std::fs::OpenOptions::new().write(true).open(&image).unwrap();
    file.set_len(10 * 512).unwrap();
    drop(file);

    let mut fs = ChainFs::open(&image).unwrap();
    let err = fs.cat("/x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.to_string(), "short read at block 10");
}

#[test]
fn rejected_format_leaves_the_old_image_alone() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");
    let mut fs = ChainFs::format_image(&image, 64, 16).unwrap();
    fs.put("/keep.txt", b"still here").unwrap();
    fs.close().unwrap();

    let err = ChainFs::format_image(&image, 2, 9).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert_eq!(std::fs::metadata(&image).unwrap().len(), 64 * 512);

    let mut fs = ChainFs::open(&image).unwrap();
    assert_eq!(fs.cat("/keep.txt").unwrap(), b"still here");
}

/// Imagen escrita byte a byte: superblock de seis u32, registros de 60 bytes
/// (8 por sector), mapa de u32 y área de datos.
#[test]
fn reads_an_image_laid_out_by_hand() {
    const SECTOR: usize = 512;
    const RECORD: usize = 60;
    // 16 entradas -> 2 sectores de tabla, 1 de mapa, datos desde el 4
    let mut img = vec![0u8; 64 * SECTOR];
    for (i, v) in [0xCAFE_BABEu32, 64, 2, 1, 16, 0].iter().enumerate() {
        img[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }

    let mut record = |slot: usize, kind: u8, name: &[u8], size: u32, start: u32, parent: u32| {
        let at = (1 + slot / 8) * SECTOR + (slot % 8) * RECORD;
        img[at] = 1;
        img[at + 1] = kind;
        img[at + 2..at + 2 + name.len()].copy_from_slice(name);
        img[at + 32..at + 36].copy_from_slice(&size.to_le_bytes());
        img[at + 36..at + 40].copy_from_slice(&start.to_le_bytes());
        img[at + 40..at + 44].copy_from_slice(&parent.to_le_bytes());
    };
    record(0, 1, b"/", 0, 0, 0xFFFF_FFFF);
    record(1, 0, b"hello.txt", 5, 0, 0);
    // slot 9: primer registro del segundo sector de la tabla
    record(9, 1, b"docs", 0, 0, 0);
    record(10, 0, b"long.bin", 600, 1, 9);

    // mapa en el sector 3: 0 -> EOF, 1 -> 2 -> EOF
    let map = 3 * SECTOR;
    img[map..map + 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    img[map + 4..map + 8].copy_from_slice(&2u32.to_le_bytes());
    img[map + 8..map + 12].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

    let data = 4 * SECTOR;
    img[data..data + 5].copy_from_slice(b"hello");
    let long = common::payload(600, 3);
    img[data + SECTOR..data + 2 * SECTOR].copy_from_slice(&long[..SECTOR]);
    img[data + 2 * SECTOR..data + 2 * SECTOR + 88].copy_from_slice(&long[SECTOR..]);

    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("hand.img");
    std::fs::write(&image, &img).unwrap();

    let mut fs = ChainFs::open(&image).unwrap();
    let info = fs.info();
    assert_eq!((info.file_table_blocks, info.data_area_start), (2, 4));
    assert_eq!(fs.entry(0).unwrap().name, "/");
    assert_eq!(common::names(&fs.ls("/").unwrap()), vec!["hello.txt", "docs"]);
    assert_eq!(fs.cat("/hello.txt").unwrap(), b"hello");
    assert_eq!(fs.cat("/docs/long.bin").unwrap(), long);
    assert_eq!(fs.free_entries().unwrap(), 12);
    assert!(fs.check().unwrap().is_clean());

    // lo que escribe la biblioteca cae en el mismo sitio
    let e = fs.put("/docs/new", b"n").unwrap();
    assert_eq!(e.index, 2);
    fs.close().unwrap();
    let bytes = std::fs::read(&image).unwrap();
    let at = SECTOR + 2 * RECORD;
    assert_eq!(&bytes[at..at + 5], &[1, 0, b'n', b'e', b'w']);
    assert_eq!(&bytes[at + 40..at + 44], &9u32.to_le_bytes());
}

// -----------------------------------------------------------------------------
// Herramienta de línea de comandos
// -----------------------------------------------------------------------------

fn chainfs(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_chainfs"))
        .args(args)
        .env_remove("CHAINFS_IMAGE")
        .output()
        .unwrap()
}

#[test]
fn cli_image_option_before_or_after_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");
    let img = image.to_str().unwrap();
    let src = dir.path().join("src.txt");
    std::fs::write(&src, b"from host").unwrap();

    assert!(chainfs(&["-i", img, "format", "64", "16"]).status.success());
    assert!(chainfs(&["put", src.to_str().unwrap(), "/note.txt", "--image", img])
        .status
        .success());
    assert!(chainfs(&["-i", img, "mkdir", "/sub"]).status.success());

    let ls = chainfs(&["ls", "-i", img]);
    assert!(ls.status.success());
    let out = String::from_utf8(ls.stdout).unwrap();
    assert_eq!(out, "f        9 note.txt\nd        0 sub\n");

    let cat = chainfs(&["cat", "/note.txt", "-i", img]);
    assert_eq!(cat.stdout, b"from host");

    let info = String::from_utf8(chainfs(&["info", "-i", img]).stdout).unwrap();
    assert!(info.starts_with("block_count: 64\nfile_table_blocks: 2\nblock_map_blocks: 1\n"));
    assert!(info.contains("data_area_start: 4\n"));
}

#[test]
fn cli_failure_exit_status_and_message() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("disk.img");
    let img = image.to_str().unwrap();
    assert!(chainfs(&["-i", img, "format", "64", "16"]).status.success());

    let out = chainfs(&["-i", img, "rmdir", "/"]);
    assert!(!out.status.success());
    assert_eq!(String::from_utf8(out.stderr).unwrap(), "error: cannot remove root\n");

    let out = chainfs(&["-i", img, "cat", "/missing"]);
    assert!(!out.status.success());
    assert_eq!(String::from_utf8(out.stderr).unwrap(), "error: file not found\n");

    let out = chainfs(&["-i", img, "format", "2", "9"]);
    assert!(!out.status.success());
    assert!(String::from_utf8(out.stderr).unwrap().starts_with("error: invalid geometry"));
    assert!(chainfs(&["-i", img, "info"]).status.success());

    let missing = dir.path().join("nope.img");
    let out = chainfs(&["-i", missing.to_str().unwrap(), "info"]);
    assert!(!out.status.success());
    assert!(String::from_utf8(out.stderr).unwrap().starts_with("error: image not found"));
}
