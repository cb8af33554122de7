use std::io::{BufRead, BufReader};
use std::process::{Command, Output, Stdio};

fn run_spawner(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scenario_spawner"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute scenario_spawner")
}

/// The obstacle scenario places its six fixed entities and cleans them up
#[test]
fn test_obstacle_scenario_headless() {
    let output = run_spawner(&["obstacles", "--ticks", "3", "--settle-ms", "0", "--seed", "7"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "Scenario failed to run. stderr: {}",
        stderr
    );
    assert!(
        stderr.contains("Spawning Vehicle (vehicle.*)..."),
        "Missing group header. stderr: {}",
        stderr
    );
    assert!(
        stderr.contains("Spawned total 6 fixed obstacles"),
        "Missing fixed obstacle total. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Done. (Vehicles: 6, Walkers: 0)"));
    assert!(stderr.contains("Cleanup done."));
}

/// Traffic scenario logs each phase in order
#[test]
fn test_traffic_scenario_logs_phases() {
    let output = run_spawner(&[
        "traffic",
        "--vehicles",
        "10",
        "--walkers",
        "5",
        "--ticks",
        "2",
        "--settle-ms",
        "0",
        "--seed",
        "11",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "Scenario failed to run. stderr: {}",
        stderr
    );

    let phases = [
        "Spawned total",
        "--- Spawning 10 Random Vehicles ---",
        "Applying Safe-Driving settings...",
        "--- Spawning 5 Walkers ---",
        "Done.",
        "Cleanup done.",
    ];
    let mut cursor = 0;
    for phase in phases {
        let found = stderr[cursor..]
            .find(phase)
            .unwrap_or_else(|| panic!("Missing or out of order: {}. stderr: {}", phase, stderr));
        cursor += found + phase.len();
    }
}

/// Synchronous mode is handed back to the world on exit
#[test]
fn test_dense_scenario_in_synchronous_world() {
    let output = run_spawner(&[
        "dense",
        "--vehicles",
        "5",
        "--walkers",
        "2",
        "--ticks",
        "2",
        "--settle-ms",
        "0",
        "--world-sync",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "Scenario failed to run. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Cleanup done."));
}

/// A bad endpoint fails before anything is created
#[test]
fn test_connection_failure_is_fatal() {
    let output = run_spawner(&["--port", "0", "obstacles"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Could not connect"),
        "Missing connection error. stderr: {}",
        stderr
    );
    assert!(!stderr.contains("Spawning"));
}

/// Route export writes the CSV and draws the plot
#[test]
fn test_route_export() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("global_path.csv");
    let path_arg = path.to_string_lossy().to_string();

    let output = run_spawner(&["route", "--output", &path_arg]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "Route export failed. stderr: {}",
        stderr
    );
    assert!(path.exists(), "CSV not written. stderr: {}", stderr);
    assert!(stdout.contains('S') && stdout.contains('G'));
}

/// A termination signal still destroys everything that was spawned
#[cfg(unix)]
#[test]
fn test_sigterm_tears_down() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_scenario_spawner"))
        .args(["obstacles", "--settle-ms", "0", "--seed", "5"])
        .env("RUST_LOG", "info")
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start scenario_spawner");

    let stderr = child.stderr.take().expect("piped stderr");
    let mut lines = BufReader::new(stderr).lines();
    let mut log = String::new();

    // Wait until the world is populated and stepping
    for line in lines.by_ref() {
        let line = line.expect("readable stderr");
        log.push_str(&line);
        log.push('\n');
        if line.contains("Press Ctrl+C to exit") {
            break;
        }
    }
    assert!(log.contains("Spawned total 6 fixed obstacles"), "stderr: {}", log);

    let killed = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .expect("Failed to run kill");
    assert!(killed.success());

    for line in lines {
        log.push_str(&line.expect("readable stderr"));
        log.push('\n');
    }
    let status = child.wait().expect("child exits");

    assert!(status.success(), "Exited with {:?}. stderr: {}", status, log);
    assert!(log.contains("SIGTERM received"), "stderr: {}", log);
    assert!(
        log.contains("Cleanup done. (Destroyed 6 vehicles"),
        "Missing teardown. stderr: {}",
        log
    );
}
