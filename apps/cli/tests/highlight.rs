use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn highlight_lists_spans_in_rule_order() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("page.html");
    fs::write(&file, r#"<div id="a">"#)?;

    Command::cargo_bin("sitestudio")?
        .args(["highlight", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "0 4 tag <div\n11 12 tag >\n5 7 attribute id\n8 11 string \"a\"\n",
        ));

    Ok(())
}

#[test]
fn highlight_json_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("script.js");
    fs::write(&file, "let s = 'hi';")?;

    let output = Command::cargo_bin("sitestudio")?
        .args(["highlight", file.to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let spans: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        spans,
        serde_json::json!([
            {"start": 8, "end": 12, "category": "string", "text": "'hi'"}
        ])
    );

    Ok(())
}

#[test]
fn styled_output_uses_palette_overrides() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("a.html");
    let palette = dir.path().join("palette.json");
    fs::write(&file, "<b>")?;
    fs::write(&palette, r##"{"tag": {"foreground": "#FF0000"}}"##)?;

    Command::cargo_bin("sitestudio")?
        .args([
            "highlight",
            file.to_str().unwrap(),
            "--styled",
            "--palette",
            palette.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff("0 3 tag #FF0000 <b>\n"));

    Ok(())
}

#[test]
fn highlight_rejects_invalid_utf8() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("logo.png");
    fs::write(&file, [0x89, b'P', b'N', b'G', 0xFF, 0xFE, 0xFD])?;

    Command::cargo_bin("sitestudio")?
        .args(["highlight", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not decode"));

    Ok(())
}
