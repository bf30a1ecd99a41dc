mod common;

use std::fs;
use std::path::Path;

use rstest::rstest;
use rvol::{
    Bitmap, ContentEntry, ErrorKind, ResourceExplorer, decode_bitmap, default_resource_explorer,
    flatten_files,
};
use tempfile::TempDir;

const SKY_PIXELS: [u8; 6] = [0, 1, 2, 3, 4, 5];

/// `SIMVOL0.VOL { README.TXT, TEXTURES.VOL { SKY.PBA } }` in a fresh directory.
fn game_dir() -> (TempDir, ResourceExplorer) {
    let dir = TempDir::new().unwrap();

    let sky = common::pbmp(3, 2, 7, &SKY_PIXELS);
    let textures = common::vol_archive(&[("SKY.PBA", &sky)]);
    let simvol = common::vol_archive(&[
        ("README.TXT", b"Red Baron 3D".as_slice()),
        ("TEXTURES.VOL", &textures),
    ]);
    fs::write(dir.path().join("SIMVOL0.VOL"), simvol).unwrap();

    let explorer = default_resource_explorer(dir.path());
    (dir, explorer)
}

#[test]
fn lists_archive_nested_in_archive() {
    let (dir, explorer) = game_dir();

    let listing = explorer.list(Path::new("SIMVOL0.VOL/TEXTURES.VOL")).unwrap();
    assert_eq!(listing.len(), 1);
    match &listing[0] {
        ContentEntry::File(info) => {
            assert_eq!(
                info.filename,
                dir.path().join("SIMVOL0.VOL/TEXTURES.VOL/SKY.PBA")
            );
            assert_eq!(info.name(), "SKY.PBA");
        }
        other => panic!("expected a file, got {other:?}"),
    }
}

#[rstest]
#[case("SIMVOL0.VOL", Some("vol"))]
#[case("SIMVOL0.VOL/TEXTURES.VOL", Some("vol"))]
#[case("SIMVOL0.VOL/README.TXT", None)]
fn identifies_containers(#[case] path: &str, #[case] expected: Option<&str>) {
    let (_dir, explorer) = game_dir();
    assert_eq!(explorer.identify(Path::new(path)).unwrap(), expected);
}

#[test]
fn extracts_every_file_of_an_archive() {
    let (_dir, explorer) = game_dir();

    let listing = explorer.list(Path::new("SIMVOL0.VOL")).unwrap();
    let files = flatten_files(&listing);
    let names: Vec<_> = files.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["README.TXT", "TEXTURES.VOL"]);

    assert_eq!(explorer.extract_to_vec(&files[0]).unwrap(), b"Red Baron 3D");

    let nested = explorer.extract_to_vec(&files[1]).unwrap();
    assert_eq!(&nested[..4], b" VOL");
    assert_eq!(nested.len() as u64, files[1].size);
}

#[test]
fn decodes_bitmap_inside_nested_archive() {
    let (_dir, explorer) = game_dir();

    let mut stream = explorer
        .open(Path::new("SIMVOL0.VOL/TEXTURES.VOL/SKY.PBA"))
        .unwrap();
    let bitmap = decode_bitmap(&mut *stream).unwrap();

    assert_eq!(bitmap.dimensions(), (3, 2, 8));
    assert_eq!(bitmap.pixels(), SKY_PIXELS);
    match bitmap {
        Bitmap::Pbmp(pbmp) => assert_eq!(pbmp.palette_index, Some(7)),
        Bitmap::Windows(_) => panic!("expected a PBMP"),
    }
}

#[rstest]
#[case("MISSING.VOL")]
#[case("SIMVOL0.VOL/MISSING.TXT")]
#[case("SIMVOL0.VOL/TEXTURES.VOL/MISSING.PBA")]
fn missing_paths_are_not_found(#[case] path: &str) {
    let (_dir, explorer) = game_dir();
    let err = explorer.open(Path::new(path)).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn corrupt_archive_is_a_format_error() {
    let (dir, explorer) = game_dir();

    // Valid tag, entry count far beyond the data
    let mut broken = b" VOL".to_vec();
    broken.extend_from_slice(&1000u32.to_le_bytes());
    fs::write(dir.path().join("BROKEN.VOL"), broken).unwrap();

    let err = explorer.list(Path::new("BROKEN.VOL")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn relative_root_lists_then_extracts() {
    // Created directly under the working directory, so its file name is a
    // valid relative root
    let dir = TempDir::new_in(".").unwrap();
    let relative_root = Path::new(dir.path().file_name().unwrap());
    fs::write(
        dir.path().join("A.VOL"),
        common::vol_archive(&[("X.TXT", b"relative".as_slice())]),
    )
    .unwrap();

    let explorer = default_resource_explorer(relative_root);
    assert!(explorer.search_path().is_absolute());

    let listing = explorer.list(Path::new("A.VOL")).unwrap();
    let files = flatten_files(&listing);
    assert_eq!(files.len(), 1);
    assert_eq!(explorer.extract_to_vec(&files[0]).unwrap(), b"relative");

    // Extracting again from the same listing resolves to the same entry
    assert_eq!(explorer.extract_to_vec(&files[0]).unwrap(), b"relative");
}
