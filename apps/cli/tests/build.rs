#![cfg(unix)]

use std::error::Error;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn new_project(parent: &Path, name: &str) -> Result<(), Box<dyn Error>> {
    Command::cargo_bin("sitestudio")?
        .args(["new", name, "--location", parent.to_str().unwrap()])
        .assert()
        .success();
    Ok(())
}

#[test]
fn build_streams_console_and_succeeds() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    new_project(dir.path(), "Ok")?;

    Command::cargo_bin("sitestudio")?
        .args([
            "build",
            dir.path().join("Ok").to_str().unwrap(),
            "--program",
            "sh",
            "--arg",
            "-c",
            "--arg",
            "echo bundling; echo warning 1>&2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "Starting build process...\nbundling\nwarning\nBuild completed successfully.\n",
        ));

    Ok(())
}

#[test]
fn failing_build_exits_nonzero() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    new_project(dir.path(), "Broken")?;

    Command::cargo_bin("sitestudio")?
        .args([
            "build",
            dir.path().join("Broken").to_str().unwrap(),
            "--program",
            "sh",
            "--arg",
            "-c",
            "--arg",
            "exit 7",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::ends_with("Build failed with exit code: 7\n"));

    Ok(())
}

#[test]
fn missing_build_tool_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    new_project(dir.path(), "NoTool")?;

    Command::cargo_bin("sitestudio")?
        .args([
            "build",
            dir.path().join("NoTool").to_str().unwrap(),
            "--program",
            "sitestudio-no-such-tool",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("command not found"));

    Ok(())
}

#[test]
fn build_logs_the_command_and_working_directory() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    new_project(dir.path(), "Logged")?;
    let root = dir.path().join("Logged");

    Command::cargo_bin("sitestudio")?
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .args([
            "build",
            root.to_str().unwrap(),
            "--program",
            "sh",
            "--arg",
            "-c",
            "--arg",
            "exit 0",
        ])
        .assert()
        .success()
        .stderr(
            predicate::str::contains("running build")
                .and(predicate::str::contains("sh -c exit 0"))
                .and(predicate::str::contains(root.to_str().unwrap())),
        );

    Ok(())
}
