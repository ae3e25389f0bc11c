//! Cassette replay integration tests - zero network I/O.
//!
//! All tests set `PIXELPERFECT_REPLAY` to a cassette so the binary never
//! contacts the live API and needs no key.

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn cmd(cassette: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pixelperfect");
    cmd.env("PIXELPERFECT_CONFIG", "/nonexistent/pixelperfect/config.toml")
        .env("PIXELPERFECT_REPLAY", cassette)
        .env_remove("PIXELPERFECT_REC")
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY");
    cmd
}

/// Absolute path to the `test_fixtures` directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

fn red_png() -> PathBuf {
    fixtures_dir().join("red_10x10.png")
}

#[test]
fn successful_edit_writes_returned_png() {
    let out = std::env::temp_dir().join("pixelperfect_test_success.png");
    let _ = std::fs::remove_file(&out);

    cmd(&fixtures_dir().join("edit_success.cassette.yaml"))
        .arg("--output")
        .arg(&out)
        .arg(red_png())
        .arg("remove background")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let blob = std::fs::read_to_string(fixtures_dir().join("transparent_10x10.b64")).unwrap();
    let expected = base64::engine::general_purpose::STANDARD.decode(blob.trim()).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), expected);

    let _ = std::fs::remove_file(&out);
}

#[test]
fn auto_filename_uses_prompt_and_timestamp() {
    let work_dir = std::env::temp_dir().join("pixelperfect_test_autofile");
    let _ = std::fs::remove_dir_all(&work_dir);
    std::fs::create_dir_all(&work_dir).unwrap();

    cmd(&fixtures_dir().join("edit_success.cassette.yaml"))
        .arg(red_png())
        .arg("Remove background!")
        .current_dir(&work_dir)
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(&work_dir).unwrap().flatten().collect();
    assert_eq!(files.len(), 1, "Exactly one file should be created");
    let name = files[0].file_name();
    let name = name.to_string_lossy();
    assert!(
        name.starts_with("pixelperfect-edit-remove-background-"),
        "unexpected file name: {name}"
    );
    assert!(name.ends_with(".png"), "unexpected file name: {name}");

    let _ = std::fs::remove_dir_all(&work_dir);
}

#[test]
fn empty_response_fails() {
    let out = std::env::temp_dir().join("pixelperfect_test_empty.png");
    let _ = std::fs::remove_file(&out);

    cmd(&fixtures_dir().join("edit_empty.cassette.yaml"))
        .arg("--output")
        .arg(&out)
        .arg(red_png())
        .arg("remove background")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no candidates"));

    assert!(!out.exists());
}

#[test]
fn text_only_response_fails() {
    cmd(&fixtures_dir().join("edit_text_only.cassette.yaml"))
        .arg(red_png())
        .arg("remove background")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No image data found in the response"));
}

#[test]
fn network_error_message_is_surfaced() {
    cmd(&fixtures_dir().join("edit_network_error.cassette.yaml"))
        .arg(red_png())
        .arg("remove background")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Generation failed").and(predicate::str::contains("ECONNRESET")));
}

#[test]
fn jpeg_payload_is_saved_as_png() {
    let jpeg_bytes = {
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut buf = std::io::Cursor::new(Vec::<u8>::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    };
    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg_bytes);

    let cassette_content = format!(
        "name: jpeg-payload\nrecorded_at: \"2026-10-01T00:00:00Z\"\ncommit: test\ninteractions:\n  - seq: 0\n    port: image_editor\n    method: edit\n    output:\n      Ok:\n        candidates:\n          - content:\n              parts:\n                - inlineData:\n                    mimeType: image/jpeg\n                    data: {b64}\n"
    );
    let cassette_path = std::env::temp_dir().join("pixelperfect_test_jpeg.cassette.yaml");
    std::fs::write(&cassette_path, cassette_content).unwrap();

    let out = std::env::temp_dir().join("pixelperfect_test_jpeg_output.png");
    let _ = std::fs::remove_file(&out);

    cmd(&cassette_path)
        .arg("--output")
        .arg(&out)
        .arg(red_png())
        .arg("make it dark")
        .assert()
        .success();

    let data = std::fs::read(&out).unwrap();
    assert_eq!(
        &data[..8],
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        "Output should be a valid PNG file"
    );

    let _ = std::fs::remove_file(&out);
    let _ = std::fs::remove_file(&cassette_path);
}

#[test]
fn missing_cassette_is_config_error() {
    cmd(Path::new("/nonexistent/edit.cassette.yaml"))
        .arg(red_png())
        .arg("remove background")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read cassette"));
}
