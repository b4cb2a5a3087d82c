//! Pidfile handling for SystemV-style supervision.
//!
//! Before writing our own PID we honor an existing pidfile: if the process
//! it names is still alive, a second exporter instance must not start.
//! A stale pidfile (dead process, garbage content) is simply overwritten.

use std::path::Path;

use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PidError {
    #[error("pid already running: {0}")]
    AlreadyRunning(u32),
    #[error("failed to access pidfile: {0}")]
    Io(#[from] std::io::Error),
}

/// Claims the pidfile for this process.
pub fn acquire(path: &Path) -> Result<(), PidError> {
    if let Ok(contents) = std::fs::read_to_string(path) {
        if let Ok(pid) = contents.trim().parse::<u32>() {
            if pid != std::process::id() && is_alive(pid) {
                return Err(PidError::AlreadyRunning(pid));
            }
        }
    }
    std::fs::write(path, std::process::id().to_string())?;
    Ok(())
}

fn is_alive(pid: u32) -> bool {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new()),
    );
    system.process(Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_a_fresh_pidfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridwatch.pid");
        acquire(&path).unwrap();
        let written: u32 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written, std::process::id());
    }

    #[test]
    fn overwrites_a_stale_pidfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridwatch.pid");
        // Near the Linux pid ceiling; all but guaranteed dead.
        std::fs::write(&path, "4194200").unwrap();
        acquire(&path).unwrap();
        let written: u32 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written, std::process::id());
    }

    #[test]
    fn overwrites_garbage_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridwatch.pid");
        std::fs::write(&path, "not a pid").unwrap();
        assert!(acquire(&path).is_ok());
    }

    #[test]
    fn refuses_while_the_recorded_process_lives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gridwatch.pid");
        // PID 1 is always alive.
        std::fs::write(&path, "1").unwrap();
        match acquire(&path) {
            Err(PidError::AlreadyRunning(1)) => {}
            other => panic!("expected already-running error, got {other:?}"),
        }
    }
}
