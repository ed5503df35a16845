//! Host preflight: required tools and free ports.

use std::net::TcpListener;
use std::process::Command;

use tracing::{debug, error, info};

use fastfood_core::{OpsError, OpsResult, StackConfig};

/// Facts about the machine the stack is deployed on.
pub trait Host: Send + Sync {
    /// Whether `tool` resolves on `PATH`.
    fn tool_available(&self, tool: &str) -> bool;

    /// Whether nothing is listening on `port`.
    fn port_free(&self, port: u16) -> bool;
}

/// The local machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn tool_available(&self, tool: &str) -> bool {
        match Command::new("which").arg(tool).output() {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!(%tool, error = %e, "`which` unavailable");
                false
            }
        }
    }

    fn port_free(&self, port: u16) -> bool {
        TcpListener::bind(("0.0.0.0", port)).is_ok()
    }
}

/// Fail fast when a required tool is missing or a required port is taken.
///
/// Tools are checked before ports; the first problem found is returned.
pub fn preflight<H: Host + ?Sized>(host: &H, stack: &StackConfig, check_ports: bool) -> OpsResult<()> {
    for tool in &stack.required_tools {
        if !host.tool_available(tool) {
            error!(%tool, "required tool not found");
            return Err(OpsError::MissingDependency(tool.clone()));
        }
    }
    debug!(tools = ?stack.required_tools, "required tools present");

    if check_ports {
        for &port in &stack.required_ports {
            if !host.port_free(port) {
                error!(port, "required port already in use");
                return Err(OpsError::PortConflict(port));
            }
        }
        debug!(ports = ?stack.required_ports, "required ports free");
    }

    info!("preflight checks passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeHost {
        tools: Vec<&'static str>,
        busy_ports: Vec<u16>,
    }

    impl Host for FakeHost {
        fn tool_available(&self, tool: &str) -> bool {
            self.tools.contains(&tool)
        }

        fn port_free(&self, port: u16) -> bool {
            !self.busy_ports.contains(&port)
        }
    }

    fn stack() -> StackConfig {
        StackConfig {
            required_tools: vec!["docker".to_string()],
            required_ports: vec![80, 5432],
            ..StackConfig::default()
        }
    }

    #[test]
    fn passes_when_everything_is_available() {
        let host = FakeHost {
            tools: vec!["docker"],
            busy_ports: vec![],
        };
        assert!(preflight(&host, &stack(), true).is_ok());
    }

    #[test]
    fn missing_tool_fails() {
        let host = FakeHost {
            tools: vec![],
            busy_ports: vec![],
        };
        let err = preflight(&host, &stack(), true).unwrap_err();
        assert!(matches!(err, OpsError::MissingDependency(ref t) if t == "docker"));
    }

    #[test]
    fn busy_port_fails() {
        let host = FakeHost {
            tools: vec!["docker"],
            busy_ports: vec![5432],
        };
        let err = preflight(&host, &stack(), true).unwrap_err();
        assert!(matches!(err, OpsError::PortConflict(5432)));
    }

    #[test]
    fn port_check_can_be_skipped() {
        let host = FakeHost {
            tools: vec!["docker"],
            busy_ports: vec![80],
        };
        assert!(preflight(&host, &stack(), false).is_ok());
    }

    #[test]
    fn system_host_sees_bound_port() {
        let listener = TcpListener::bind("0.0.0.0:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!SystemHost.port_free(port));
    }
}
