use std::time::{Duration, Instant};

use kilate::{CallParam, Environment, Runtime, Value};
use tempfile::tempdir;

#[cfg(unix)]
#[test]
fn system_runs_literal_command_and_discards_status() {
    let runtime = Runtime::new();
    let env = Environment::default();
    for command in ["true", "false", "exit 3"] {
        let result = runtime
            .invoke("system", vec![CallParam::literal(command)], &env)
            .unwrap();
        assert!(result.is_none());
    }
}

#[cfg(unix)]
#[test]
fn system_runs_string_variable() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("marker");
    let mut env = Environment::default();
    env.define("cmd", Value::string(format!("touch '{}'", marker.display())));

    let runtime = Runtime::new();
    runtime
        .invoke("system", vec![CallParam::variable("cmd")], &env)
        .unwrap();
    assert!(marker.exists());
}

#[cfg(unix)]
#[test]
fn system_ignores_non_string_variable() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("never");
    let mut env = Environment::default();
    env.define("cmd", Value::Int(7));

    let runtime = Runtime::new();
    let result = runtime
        .invoke(
            "system",
            vec![CallParam::variable("cmd")],
            &env,
        )
        .unwrap();
    assert!(result.is_none());
    assert!(!marker.exists());
}

#[test]
fn sleep_literal_suspends_for_milliseconds() {
    let runtime = Runtime::new();
    let env = Environment::default();
    let started = Instant::now();
    let result = runtime
        .invoke("sleep", vec![CallParam::literal("1")], &env)
        .unwrap();
    assert!(result.is_none());
    assert!(started.elapsed() >= Duration::from_millis(1));
}

#[test]
fn sleep_non_int_variable_reads_its_name() {
    let runtime = Runtime::new();
    let mut env = Environment::default();
    env.define("20", Value::Long(5_000_000));

    let started = Instant::now();
    runtime
        .invoke("sleep", vec![CallParam::variable("20")], &env)
        .unwrap();
    let elapsed = started.elapsed();
    // Twice the name as milliseconds: once for the non-int branch, once for the literal path.
    assert!(elapsed >= Duration::from_millis(40), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(60), "{elapsed:?}");
}

#[test]
fn print_returns_no_value() {
    let runtime = Runtime::new();
    let mut env = Environment::default();
    env.define("x", Value::Int(42));
    let result = runtime
        .invoke("print", vec![CallParam::variable("x")], &env)
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn unresolved_variable_surfaces_as_error() {
    let runtime = Runtime::new();
    let env = Environment::default();
    let err = runtime
        .invoke("print", vec![CallParam::variable("ghost")], &env)
        .unwrap_err();
    assert!(err.to_string().contains("undefined variable `ghost`"));
}
