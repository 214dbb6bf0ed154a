use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_noise_monitor"))
}

#[test]
fn simulate_outputs_json_readings_and_summary() {
    let output = cli()
        .args([
            "simulate",
            "--seed",
            "7",
            "--duration-secs",
            "1",
            "--throttle-ms",
            "200",
            "--light",
            "--json",
            "--config",
            "/nonexistent/noise_config.json",
        ])
        .output()
        .expect("simulate command");

    assert!(
        output.status.success(),
        "simulate exited with {:?}",
        output.status.code()
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert!(lines.len() >= 2, "expected readings plus summary, got {stdout}");

    let summary = lines.last().expect("summary line");
    assert!(summary["readings"].as_u64().unwrap_or(0) >= 1);

    for reading in &lines[..lines.len() - 1] {
        assert_eq!(reading["mode"], "light");
        let level = reading["level"].as_f64().expect("level");
        // simulated feed is 60-90, always above the light medium threshold
        assert!(level > 40.0, "level {level}");
        assert_eq!(reading["compliance"], "exceeding");
    }
}

#[test]
fn replay_of_missing_file_fails() {
    let output = cli()
        .args(["replay", "/nonexistent/recording.wav"])
        .output()
        .expect("replay command");

    assert!(!output.status.success());
}

#[test]
fn typing_m_switches_to_hard_mode() {
    let mut child = cli()
        .args([
            "simulate",
            "--seed",
            "3",
            "--duration-secs",
            "1",
            "--light",
            "--json",
            "--config",
            "/nonexistent/noise_config.json",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn simulate");

    {
        let mut stdin = child.stdin.take().expect("piped stdin");
        stdin.write_all(b"m\n").expect("write toggle");
    }
    let output = child.wait_with_output().expect("simulate output");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let readings = &lines[..lines.len().saturating_sub(1)];

    assert!(
        readings.iter().any(|reading| reading["mode"] == "hard"),
        "no hard-mode reading after toggle: {stdout}"
    );
    // once switched, the mode stays hard
    let first_hard = readings
        .iter()
        .position(|reading| reading["mode"] == "hard")
        .unwrap_or(readings.len());
    assert!(readings[first_hard..].iter().all(|reading| reading["mode"] == "hard"));
}
