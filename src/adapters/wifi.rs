//! WiFi station-mode adapter.
//!
//! Both nodes need the radio in station mode for ESP-NOW. The sensor node
//! additionally joins the household access point so the status page is
//! reachable; the notifier never associates.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation with an injectable failure count.
//!
//! ## Join policy
//!
//! Up to [`JoinPolicy::attempts`] connection attempts, `retry_delay_ms`
//! apart. Running out of attempts is not fatal: the node keeps working
//! without the status page.

use core::fmt;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    InvalidSsid,
    InvalidPassword,
    /// The driver refused to initialise or start.
    Driver,
    /// Every join attempt failed.
    JoinFailed { attempts: u32 },
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::Driver => write!(f, "WiFi driver error"),
            Self::JoinFailed { attempts } => write!(f, "could not join AP after {} attempts", attempts),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), WifiError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(WifiError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), WifiError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(WifiError::InvalidPassword);
    }
    Ok(())
}

/// Validated access-point credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, WifiError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds.ssid.push_str(ssid).map_err(|_| WifiError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| WifiError::InvalidPassword)?;
        Ok(creds)
    }

    /// Credentials baked in at build time through `DISHDUTY_WIFI_SSID` and
    /// `DISHDUTY_WIFI_PASS`. `None` when the SSID was not set.
    pub fn from_build_env() -> Option<Result<Self, WifiError>> {
        let ssid = option_env!("DISHDUTY_WIFI_SSID")?;
        Some(Self::new(ssid, option_env!("DISHDUTY_WIFI_PASS").unwrap_or("")))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Join policy
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPolicy {
    pub attempts: u32,
    pub retry_delay_ms: u32,
}

impl Default for JoinPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            retry_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    /// Radio off.
    Stopped,
    /// Radio on, not associated (enough for ESP-NOW).
    RadioOnly,
    Connected,
}

// ───────────────────────────────────────────────────────────────
// Station adapter
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_FAILURES: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);

/// Simulation: make the next `n` join attempts fail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_fail_next_joins(n: u32) {
    SIM_FAILURES.store(n, core::sync::atomic::Ordering::SeqCst);
}

pub struct WifiStation {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    state: WifiState,
    ip: Option<heapless::String<16>>,
}

impl WifiStation {
    /// Initialise the driver and start the radio in station mode.
    #[cfg(target_os = "espidf")]
    pub fn start(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, WifiError> {
        let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| {
            warn!("WiFi: driver init failed: {}", e);
            WifiError::Driver
        })?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|_| WifiError::Driver)?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|_| WifiError::Driver)?;
        wifi.start().map_err(|_| WifiError::Driver)?;
        info!("WiFi: radio started (station mode)");
        Ok(Self {
            wifi,
            state: WifiState::RadioOnly,
            ip: None,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start() -> Result<Self, WifiError> {
        info!("WiFi(sim): radio started (station mode)");
        Ok(Self {
            state: WifiState::RadioOnly,
            ip: None,
        })
    }

    /// Join the access point, retrying per `policy`. Returns the station
    /// IP address on success.
    pub fn join(&mut self, creds: &WifiCredentials, policy: JoinPolicy) -> Result<&str, WifiError> {
        info!("WiFi: joining '{}'", creds.ssid());
        self.platform_configure(creds)?;

        for attempt in 1..=policy.attempts {
            match self.platform_connect() {
                Ok(ip) => {
                    info!("WiFi: connected at {} (attempt {})", ip, attempt);
                    self.state = WifiState::Connected;
                    self.ip = Some(ip);
                    return Ok(self.ip.as_deref().unwrap_or_default());
                }
                Err(()) => {
                    warn!("WiFi: attempt {}/{} failed", attempt, policy.attempts);
                    if attempt < policy.attempts {
                        sleep_ms(policy.retry_delay_ms);
                    }
                }
            }
        }
        Err(WifiError::JoinFailed {
            attempts: policy.attempts,
        })
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self, creds: &WifiCredentials) -> Result<(), WifiError> {
        let config = ClientConfiguration {
            ssid: creds.ssid.as_str().try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(config))
            .map_err(|_| WifiError::Driver)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self, _creds: &WifiCredentials) -> Result<(), WifiError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<heapless::String<16>, ()> {
        use core::fmt::Write as _;

        self.wifi.connect().map_err(|_| ())?;
        self.wifi.wait_netif_up().map_err(|_| ())?;
        let info = self.wifi.wifi().sta_netif().get_ip_info().map_err(|_| ())?;
        let mut ip = heapless::String::new();
        let _ = write!(ip, "{}", info.ip);
        Ok(ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<heapless::String<16>, ()> {
        use core::sync::atomic::Ordering;

        let remaining = SIM_FAILURES.load(Ordering::SeqCst);
        if remaining > 0 {
            SIM_FAILURES.store(remaining - 1, Ordering::SeqCst);
            return Err(());
        }
        let mut ip = heapless::String::new();
        let _ = ip.push_str("192.168.4.2");
        Ok(ip)
    }
}

#[cfg(target_os = "espidf")]
fn sleep_ms(ms: u32) {
    esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
}

#[cfg(not(target_os = "espidf"))]
fn sleep_ms(_ms: u32) {}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
