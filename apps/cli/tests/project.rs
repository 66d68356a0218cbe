use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn new_creates_scaffold_and_prints_root() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("sitestudio")?
        .args(["new", "Demo", "--location", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            dir.path().join("Demo").display().to_string(),
        ));

    let root = dir.path().join("Demo");
    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("project.bws"))?)?;
    assert_eq!(config["name"], "Demo");
    assert_eq!(config["version"], "1.0.0");
    assert!(fs::read_to_string(root.join("src/index.html"))?.contains("Welcome to Demo"));
    assert!(root.join("src/css/style.css").is_file());
    assert!(root.join("src/js/main.js").is_file());
    assert!(root.join("assets/images").is_dir());

    Ok(())
}

#[test]
fn new_rejects_blank_name() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("sitestudio")?
        .args(["new", "   ", "--location", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be empty"));

    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn open_prints_indented_tree() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    Command::cargo_bin("sitestudio")?
        .args(["new", "Site", "--location", dir.path().to_str().unwrap()])
        .assert()
        .success();

    Command::cargo_bin("sitestudio")?
        .args(["open", dir.path().join("Site").to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("Site/\n")
                .and(predicate::str::contains("  assets/\n    images/\n"))
                .and(predicate::str::contains("  project.bws\n"))
                .and(predicate::str::contains("    index.html\n")),
        );

    Ok(())
}

#[test]
fn open_json_lists_nodes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    Command::cargo_bin("sitestudio")?
        .args(["new", "Json", "--location", dir.path().to_str().unwrap()])
        .assert()
        .success();

    let output = Command::cargo_bin("sitestudio")?
        .args(["open", dir.path().join("Json").to_str().unwrap(), "--json"])
        .output()?;
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(tree["root"]["name"], "Json");
    assert_eq!(tree["root"]["kind"], "folder");
    let names: Vec<_> = tree["root"]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["assets", "project.bws", "src"]);

    Ok(())
}

#[test]
fn open_rejects_folder_without_sidecar() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("sitestudio")?
        .args(["open", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project.bws is missing"));

    Ok(())
}

#[test]
fn preview_prints_entry_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    Command::cargo_bin("sitestudio")?
        .args(["new", "Shown", "--location", dir.path().to_str().unwrap()])
        .assert()
        .success();

    let page = dir.path().join("Shown").join("src").join("index.html");
    Command::cargo_bin("sitestudio")?
        .args(["preview", dir.path().join("Shown").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", page.display())));

    Ok(())
}

#[test]
fn preview_reports_missing_entry_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("project.bws"),
        r#"{"name": "Bare", "version": "1.0.0"}"#,
    )?;

    Command::cargo_bin("sitestudio")?
        .args(["preview", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::diff("Error: 'src/index.html' not found.\n"));

    Ok(())
}
