use assert_cmd::Command;
use predicates::prelude::*;
use std::{fs, path::PathBuf};
use tempfile::tempdir;

fn kilate() -> Command {
    let mut cmd = Command::cargo_bin("kilate").expect("binary exists");
    cmd.env_remove("KILATE_NATIVE_PATH").env_remove("RUST_LOG");
    cmd
}

#[test]
fn print_concatenates_literals_exactly() {
    kilate()
        .args(["call", "print", "Hello, ", "World"])
        .assert()
        .success()
        .stdout("Hello, World");
}

#[test]
fn print_resolves_int_variable() {
    kilate()
        .args(["call", "--int", "x=42", "print", "$x"])
        .assert()
        .success()
        .stdout("42");
}

#[test]
fn print_mixes_literals_and_typed_variables() {
    kilate()
        .args([
            "call",
            "--float",
            "pi=3.5",
            "--bool",
            "ok=true",
            "--long",
            "big=9000000000",
            "print",
            "pi=",
            "$pi",
            " ok=",
            "$ok",
            " big=",
            "$big",
        ])
        .assert()
        .success()
        .stdout("pi=3.500000 ok=true big=9000000000");
}

#[cfg(unix)]
#[test]
fn system_discards_exit_status() {
    kilate()
        .args(["call", "system", "exit 4"])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn system_output_reaches_stdout() {
    kilate()
        .args(["call", "--string", "cmd=echo from-shell", "system", "$cmd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-shell"));
}

#[test]
fn unknown_native_fails() {
    kilate()
        .args(["call", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown native function `teleport`"));
}

#[test]
fn natives_lists_builtin_signatures() {
    kilate()
        .arg("natives")
        .assert()
        .success()
        .stdout("print(any)\nsystem(string)\nsleep(long)\n");
}

#[cfg(target_os = "linux")]
#[test]
fn broken_plugin_is_reported_on_stderr() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("broken.so"), b"not a library").unwrap();

    kilate()
        .arg("--plugin-dir")
        .arg(dir.path())
        .arg("natives")
        .assert()
        .success()
        .stdout("print(any)\nsystem(string)\nsleep(long)\n")
        .stderr(predicate::str::contains("Error loading"));
}

#[test]
fn config_file_supplies_plugin_directories() {
    let dir = tempdir().expect("create temp dir");
    let missing = dir.path().join("absent");
    let config = dir.path().join("kilate.toml");
    fs::write(
        &config,
        format!(
            "[natives]\ndirectories = [{:?}]\n",
            missing.to_string_lossy()
        ),
    )
    .unwrap();

    kilate()
        .arg("--config")
        .arg(&config)
        .arg("natives")
        .assert()
        .success()
        .stderr(predicate::str::contains("stopping plugin scan"));
}

#[test]
fn unreadable_config_fails() {
    kilate()
        .args(["--config", "/nonexistent/kilate.toml", "natives"])
        .assert()
        .failure();
}

#[cfg(target_os = "linux")]
fn system_libm() -> Option<PathBuf> {
    [
        "/lib/x86_64-linux-gnu/libm.so.6",
        "/usr/lib/x86_64-linux-gnu/libm.so.6",
        "/lib/aarch64-linux-gnu/libm.so.6",
        "/usr/lib/aarch64-linux-gnu/libm.so.6",
        "/lib64/libm.so.6",
        "/usr/lib64/libm.so.6",
        "/lib/libm.so.6",
        "/usr/lib/libm.so.6",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|path| path.exists())
}

#[cfg(target_os = "linux")]
#[test]
fn library_without_entry_point_is_reported_on_stderr() {
    let Some(libm) = system_libm() else {
        eprintln!("no libm.so.6 found, skipping");
        return;
    };
    let dir = tempdir().expect("create temp dir");
    fs::copy(&libm, dir.path().join("libm.so")).unwrap();

    kilate()
        .arg("--plugin-dir")
        .arg(dir.path())
        .arg("natives")
        .assert()
        .success()
        .stdout("print(any)\nsystem(string)\nsleep(long)\n")
        .stderr(predicate::str::contains(
            "Function KILATE_NATIVE_REGISTER not found",
        ))
        .stderr(predicate::str::contains("libm.so"));
}

#[cfg(target_os = "linux")]
#[test]
fn piped_diagnostics_carry_no_colour_codes() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("broken.so"), b"not a library").unwrap();

    kilate()
        .arg("--plugin-dir")
        .arg(dir.path())
        .arg("natives")
        .assert()
        .success()
        .stderr(predicate::str::contains("Error loading"))
        .stderr(predicate::str::contains("\u{1b}[").not());
}
