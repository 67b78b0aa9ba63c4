//! Session configuration

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use pepterm_core::{DEFAULT_LOCAL_PORT, DEFAULT_TERMINAL_PORT};

/// Default DF11 system identification string
pub const DEFAULT_SYSTEM_INFO: &str = "PepTerm;CashRegister;1.0";

/// Configuration for a terminal session
///
/// `Default` gives working values for a terminal on the local broadcast
/// domain; `from_env` layers environment overrides on top, and the `with_*`
/// builders cover the rest.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pepterm::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_bind_timeout(Duration::from_secs(3))
///     .with_test_mode(false);
/// assert_eq!(config.local_port, 5000);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// UDP port the register listens on; zero lets the OS pick
    pub local_port: u16,

    /// UDP port the terminal listens on
    pub terminal_port: u16,

    /// Address binding discovery broadcasts go to
    pub broadcast_addr: IpAddr,

    /// How long to wait for a binding acknowledgment
    pub bind_timeout: Duration,

    /// Terminal address assumed when discovery times out; without one the
    /// bind fails instead
    pub fallback_terminal_ip: Option<IpAddr>,

    /// Local IPv4 advertised in discovery packets; detected via the
    /// outbound interface when unset
    pub local_ip: Option<Ipv4Addr>,

    /// DF11 system identification sent with every payment request
    pub system_info: String,

    /// Report failed transactions as successful. Integration testing only,
    /// never production; every interception logs a warning.
    pub test_mode: bool,

    /// Depth of the event channel handed out at connect time
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_LOCAL_PORT,
            terminal_port: DEFAULT_TERMINAL_PORT,
            broadcast_addr: IpAddr::V4(Ipv4Addr::BROADCAST),
            bind_timeout: Duration::from_secs(10),
            fallback_terminal_ip: None,
            local_ip: None,
            system_info: DEFAULT_SYSTEM_INFO.to_string(),
            test_mode: false,
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Defaults with environment overrides applied
    ///
    /// Recognized variables: `LOCAL_PORT`, `TERMINAL_PORT`,
    /// `BROADCAST_ADDRESS`, `TERMINAL_IP` (fallback address),
    /// `BIND_TIMEOUT` (milliseconds), `TEST_MODE` (`"true"` enables).
    /// Unparseable values are logged and skipped.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(name: &str, value: String) -> Option<T> {
            match value.parse() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    warn!("Ignoring unparseable {} value {:?}", name, value);
                    None
                }
            }
        }

        if let Some(value) = lookup("LOCAL_PORT") {
            if let Some(port) = parsed("LOCAL_PORT", value) {
                self.local_port = port;
            }
        }
        if let Some(value) = lookup("TERMINAL_PORT") {
            if let Some(port) = parsed("TERMINAL_PORT", value) {
                self.terminal_port = port;
            }
        }
        if let Some(value) = lookup("BROADCAST_ADDRESS") {
            if let Some(addr) = parsed("BROADCAST_ADDRESS", value) {
                self.broadcast_addr = addr;
            }
        }
        if let Some(value) = lookup("TERMINAL_IP") {
            if let Some(addr) = parsed("TERMINAL_IP", value) {
                self.fallback_terminal_ip = Some(addr);
            }
        }
        if let Some(value) = lookup("BIND_TIMEOUT") {
            if let Some(millis) = parsed::<u64>("BIND_TIMEOUT", value) {
                self.bind_timeout = Duration::from_millis(millis);
            }
        }
        if let Some(value) = lookup("TEST_MODE") {
            self.test_mode = value == "true";
        }

        self
    }

    /// Set the local UDP port
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    /// Set the terminal UDP port
    pub fn with_terminal_port(mut self, port: u16) -> Self {
        self.terminal_port = port;
        self
    }

    /// Set the discovery broadcast address
    pub fn with_broadcast_addr(mut self, addr: IpAddr) -> Self {
        self.broadcast_addr = addr;
        self
    }

    /// Set the binding acknowledgment timeout
    pub fn with_bind_timeout(mut self, timeout: Duration) -> Self {
        self.bind_timeout = timeout;
        self
    }

    /// Set the fallback terminal address used when discovery times out
    pub fn with_fallback_terminal_ip(mut self, addr: IpAddr) -> Self {
        self.fallback_terminal_ip = Some(addr);
        self
    }

    /// Pin the local IPv4 advertised in discovery packets
    pub fn with_local_ip(mut self, addr: Ipv4Addr) -> Self {
        self.local_ip = Some(addr);
        self
    }

    /// Set the DF11 system identification string
    pub fn with_system_info(mut self, info: impl Into<String>) -> Self {
        self.system_info = info.into();
        self
    }

    /// Toggle test mode
    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    /// Set the event channel depth
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();

        assert_eq!(config.local_port, 5000);
        assert_eq!(config.terminal_port, 5010);
        assert_eq!(config.broadcast_addr, IpAddr::V4(Ipv4Addr::BROADCAST));
        assert_eq!(config.bind_timeout, Duration::from_secs(10));
        assert!(config.fallback_terminal_ip.is_none());
        assert!(config.local_ip.is_none());
        assert_eq!(config.system_info, "PepTerm;CashRegister;1.0");
        assert!(!config.test_mode);
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_local_port(6000)
            .with_terminal_port(6010)
            .with_bind_timeout(Duration::from_millis(500))
            .with_fallback_terminal_ip("10.42.0.75".parse().unwrap())
            .with_local_ip(Ipv4Addr::new(192, 168, 1, 50))
            .with_system_info("Kiosk;Demo;2.0")
            .with_test_mode(true)
            .with_event_capacity(8);

        assert_eq!(config.local_port, 6000);
        assert_eq!(config.terminal_port, 6010);
        assert_eq!(config.bind_timeout, Duration::from_millis(500));
        assert_eq!(
            config.fallback_terminal_ip,
            Some("10.42.0.75".parse().unwrap())
        );
        assert_eq!(config.local_ip, Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(config.system_info, "Kiosk;Demo;2.0");
        assert!(config.test_mode);
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::default().with_overrides(|name| {
            let value = match name {
                "LOCAL_PORT" => "5100",
                "TERMINAL_PORT" => "5110",
                "BROADCAST_ADDRESS" => "10.42.0.255",
                "TERMINAL_IP" => "10.42.0.75",
                "BIND_TIMEOUT" => "2500",
                "TEST_MODE" => "true",
                _ => return None,
            };
            Some(value.to_string())
        });

        assert_eq!(config.local_port, 5100);
        assert_eq!(config.terminal_port, 5110);
        assert_eq!(config.broadcast_addr, "10.42.0.255".parse::<IpAddr>().unwrap());
        assert_eq!(
            config.fallback_terminal_ip,
            Some("10.42.0.75".parse().unwrap())
        );
        assert_eq!(config.bind_timeout, Duration::from_millis(2500));
        assert!(config.test_mode);
    }

    #[test]
    fn test_env_overrides_skip_garbage() {
        let config = SessionConfig::default().with_overrides(|name| {
            let value = match name {
                "LOCAL_PORT" => "not-a-port",
                "BIND_TIMEOUT" => "soon",
                "TEST_MODE" => "yes",
                _ => return None,
            };
            Some(value.to_string())
        });

        assert_eq!(config.local_port, 5000);
        assert_eq!(config.bind_timeout, Duration::from_secs(10));
        assert!(!config.test_mode);
    }
}
