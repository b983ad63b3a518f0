//! Endpoint discovery and opening.
//!
//! The controller creates both endpoints (normally named pipes). The agent waits
//! for them to appear, then opens the inbound one for reading and the outbound
//! one for writing, in that order.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::backoff::{Backoff, PollSettings};

pub const DEFAULT_INBOUND_PATH: &str = "/tmp/python_to_swift";
pub const DEFAULT_OUTBOUND_PATH: &str = "/tmp/swift_to_python";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    /// Controller → agent.
    pub inbound: PathBuf,
    /// Agent → controller.
    pub outbound: PathBuf,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            inbound: PathBuf::from(DEFAULT_INBOUND_PATH),
            outbound: PathBuf::from(DEFAULT_OUTBOUND_PATH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// An endpoint exists but can't be opened for its direction. Fatal at startup.
#[derive(Debug)]
pub struct EndpointError {
    pub direction: Direction,
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot open {} endpoint {}: {}",
            self.direction,
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for EndpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Both endpoints, opened.
#[derive(Debug)]
pub struct Endpoints {
    pub inbound: tokio::fs::File,
    pub outbound: std::fs::File,
}

/// Polls until both paths exist. Never gives up; the controller may start later.
pub async fn wait_for_endpoints(paths: &EndpointPaths, poll: PollSettings) {
    let mut backoff = Backoff::new(poll);
    let mut announced = false;
    loop {
        let inbound = exists(&paths.inbound).await;
        let outbound = exists(&paths.outbound).await;
        if inbound && outbound {
            info!(
                "Endpoints present: {} / {}",
                paths.inbound.display(),
                paths.outbound.display()
            );
            return;
        }
        if !announced {
            info!(
                "Waiting for endpoints {} / {}",
                paths.inbound.display(),
                paths.outbound.display()
            );
            announced = true;
        }
        let delay = backoff.next_delay();
        debug!(
            "Endpoints not ready (inbound: {}, outbound: {}), retrying in {:?}",
            inbound, outbound, delay
        );
        tokio::time::sleep(delay).await;
    }
}

/// Opens inbound for reading, then outbound for writing.
///
/// On a named pipe each open blocks until the controller has the other end open.
pub async fn open_endpoints(paths: &EndpointPaths) -> Result<Endpoints, EndpointError> {
    let inbound = tokio::fs::OpenOptions::new()
        .read(true)
        .open(&paths.inbound)
        .await
        .map_err(|source| EndpointError {
            direction: Direction::Inbound,
            path: paths.inbound.clone(),
            source,
        })?;

    let outbound = tokio::fs::OpenOptions::new()
        .append(true)
        .open(&paths.outbound)
        .await
        .map_err(|source| EndpointError {
            direction: Direction::Outbound,
            path: paths.outbound.clone(),
            source,
        })?
        .into_std()
        .await;

    info!("Endpoints open");
    Ok(Endpoints { inbound, outbound })
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("paramon-endpoint-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_default_paths_match_controller() {
        let paths = EndpointPaths::default();
        assert_eq!(paths.inbound, PathBuf::from("/tmp/python_to_swift"));
        assert_eq!(paths.outbound, PathBuf::from("/tmp/swift_to_python"));
    }

    #[tokio::test]
    async fn test_wait_returns_once_both_exist() {
        let paths = EndpointPaths {
            inbound: temp_path("wait-in"),
            outbound: temp_path("wait-out"),
        };
        let _ = std::fs::remove_file(&paths.inbound);
        let _ = std::fs::remove_file(&paths.outbound);
        let poll = PollSettings {
            interval: Duration::from_millis(2),
            max_backoff: Duration::from_millis(4),
        };

        let waiter = {
            let paths = paths.clone();
            tokio::spawn(async move { wait_for_endpoints(&paths, poll).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        std::fs::write(&paths.inbound, b"").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        std::fs::write(&paths.outbound, b"").unwrap();
        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("wait_for_endpoints never returned")
            .unwrap();

        let _ = std::fs::remove_file(&paths.inbound);
        let _ = std::fs::remove_file(&paths.outbound);
    }

    #[tokio::test]
    async fn test_open_failure_names_the_direction() {
        let paths = EndpointPaths {
            inbound: temp_path("missing-in"),
            outbound: temp_path("missing-out"),
        };
        let _ = std::fs::remove_file(&paths.inbound);
        let err = match open_endpoints(&paths).await {
            Ok(_) => panic!("opening a missing endpoint succeeded"),
            Err(e) => e,
        };
        assert_eq!(err.direction, Direction::Inbound);
        assert!(err.to_string().starts_with("cannot open inbound endpoint"));
    }
}
