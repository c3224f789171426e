// Recorder process coordination
// The store must not have another writer during a real commit, so the
// recording application is stopped first and optionally restarted after.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::constants::{PROCESS_NAMES, SERVER_PROCESS, SERVER_STARTUP_WAIT_SECS};
use crate::error::{RequeueError, Result};

/// One running recorder process. The executable path is kept so the
/// process can be restarted later; it is not always recoverable.
#[derive(Debug, Clone)]
pub struct RecorderProcess {
    pub pid: u32,
    pub path: Option<PathBuf>,
}

/// Stop every listed process, then verify none are left running.
pub fn stop_recorder_processes(processes: &[RecorderProcess]) -> Result<()> {
    for process in processes {
        match kill_process(process.pid) {
            Ok(status) if status.success() => info!("Stopped PID {}", process.pid),
            // The process may have exited on its own between listing and kill.
            Ok(_) => warn!("Could not stop PID {}; it may have already exited", process.pid),
            Err(e) => {
                return Err(RequeueError::ProcessControl(format!(
                    "invoking the kill tool for PID {}: {}",
                    process.pid, e
                )))
            }
        }
    }

    // Give forced kills a moment to land before re-checking.
    thread::sleep(Duration::from_secs(1));
    let remaining = find_recorder_processes()?;
    if !remaining.is_empty() {
        return Err(RequeueError::ProcessControl(format!(
            "{} recorder process(es) still running after stop",
            remaining.len()
        )));
    }
    Ok(())
}

/// Restart the recorder from the saved executable paths. The server binary
/// starts first and gets a fixed window to initialize; failures on the
/// remaining binaries are reported but do not abort.
pub fn start_recorder_processes(paths: &[PathBuf]) -> Result<()> {
    if let Some(server) = paths.iter().find(|p| is_server_binary(p)) {
        info!("Starting server: {}", server.display());
        Command::new(server).spawn().map_err(|e| {
            RequeueError::ProcessControl(format!("starting {}: {}", server.display(), e))
        })?;
        info!("Waiting {} seconds for the server to initialize", SERVER_STARTUP_WAIT_SECS);
        thread::sleep(Duration::from_secs(SERVER_STARTUP_WAIT_SECS));
    }

    for path in paths.iter().filter(|p| !is_server_binary(p)) {
        info!("Starting: {}", path.display());
        if let Err(e) = Command::new(path).spawn() {
            warn!("Failed to start {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn is_server_binary(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| stem.eq_ignore_ascii_case(SERVER_PROCESS))
        .unwrap_or(false)
}

#[cfg(windows)]
pub fn find_recorder_processes() -> Result<Vec<RecorderProcess>> {
    // wmic reports both PID and executable path; fall back to tasklist
    // (PIDs only, so restart paths are unavailable) if it is missing.
    let where_clause = PROCESS_NAMES
        .iter()
        .map(|name| format!("name='{}.exe'", name))
        .collect::<Vec<_>>()
        .join(" or ");

    let output = Command::new("wmic")
        .args([
            "process",
            "where",
            &where_clause,
            "get",
            "ProcessId,ExecutablePath",
            "/format:csv",
        ])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            let mut processes = Vec::new();
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()).skip(1) {
                let parts: Vec<&str> = line.split(',').collect();
                if parts.len() == 3 {
                    if let Ok(pid) = parts[2].parse::<u32>() {
                        let path = (!parts[1].is_empty()).then(|| PathBuf::from(parts[1]));
                        processes.push(RecorderProcess { pid, path });
                    }
                }
            }
            Ok(processes)
        }
        _ => find_processes_fallback(),
    }
}

#[cfg(windows)]
fn find_processes_fallback() -> Result<Vec<RecorderProcess>> {
    let out = Command::new("tasklist")
        .args(["/FO", "CSV"])
        .output()
        .map_err(|e| RequeueError::ProcessControl(format!("running tasklist: {}", e)))?;

    let text = String::from_utf8_lossy(&out.stdout);
    let mut processes = Vec::new();
    for line in text.lines().skip(1) {
        let cols: Vec<&str> = line.split(',').map(|c| c.trim_matches('"')).collect();
        if cols.len() >= 2 {
            let image = cols[0].split('.').next().unwrap_or("");
            if PROCESS_NAMES.contains(&image) {
                if let Ok(pid) = cols[1].parse::<u32>() {
                    processes.push(RecorderProcess { pid, path: None });
                }
            }
        }
    }
    Ok(processes)
}

#[cfg(windows)]
fn kill_process(pid: u32) -> std::io::Result<std::process::ExitStatus> {
    Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .status()
}

#[cfg(not(windows))]
pub fn find_recorder_processes() -> Result<Vec<RecorderProcess>> {
    let mut processes = Vec::new();
    for name in PROCESS_NAMES {
        let Ok(out) = Command::new("pgrep").args(["-x", name]).output() else {
            continue;
        };
        for line in String::from_utf8_lossy(&out.stdout).lines() {
            if let Ok(pid) = line.trim().parse::<u32>() {
                let path = std::fs::read_link(format!("/proc/{}/exe", pid)).ok();
                processes.push(RecorderProcess { pid, path });
            }
        }
    }
    Ok(processes)
}

#[cfg(not(windows))]
fn kill_process(pid: u32) -> std::io::Result<std::process::ExitStatus> {
    Command::new("kill").args(["-9", &pid.to_string()]).status()
}
