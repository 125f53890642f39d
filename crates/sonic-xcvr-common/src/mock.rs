//! In-memory platform manager.
//!
//! Stands in for the vendor platform management service. Used by unit
//! and integration tests across the workspace and by standalone daemon
//! runs on platforms where the real service is not linked in.
//!
//! The mock records every RPC in arrival order so tests can assert call
//! sequences (e.g., reset must assert before it deasserts).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::client::{MgmtClient, MgmtConnection};
use crate::error::{XcvrError, XcvrResult};

/// One recorded RPC against the mock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MgmtCall {
    /// Max port query.
    MaxQsfpPort,
    /// Presence read for a port.
    Presence(u32),
    /// Low-power mode read for a port.
    LowPowerMode(u32),
    /// Low-power mode write: (port, enable).
    SetLowPowerMode(u32, bool),
    /// Reset line write: (port, asserted).
    SetReset(u32, bool),
    /// Raw EEPROM dump for a port.
    EepromHex(u32),
}

#[derive(Debug, Default)]
struct MockState {
    max_port: u32,
    reachable: bool,
    presence: HashMap<u32, bool>,
    lpmode: HashMap<u32, bool>,
    eeprom: HashMap<u32, String>,
    presence_failures: HashSet<u32>,
    calls: Vec<MgmtCall>,
    connects: u64,
}

/// In-memory platform manager implementing [`MgmtClient`].
///
/// Clones share state, so a test can hand one clone to the daemon and
/// keep another to mutate the simulated hardware underneath it.
#[derive(Debug, Clone)]
pub struct MockPltfmMgr {
    state: Arc<Mutex<MockState>>,
}

impl MockPltfmMgr {
    /// Creates a reachable mock with the given number of ports, all
    /// empty.
    pub fn new(max_port: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                max_port,
                reachable: true,
                ..MockState::default()
            })),
        }
    }

    /// Creates a mock whose endpoint is initially down.
    ///
    /// Useful for startup-ordering scenarios where the daemon comes up
    /// before the management service.
    pub fn unreachable(max_port: u32) -> Self {
        let mock = Self::new(max_port);
        mock.set_reachable(false);
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock platform state poisoned")
    }

    /// Makes the endpoint accept or refuse connections.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Simulates inserting a module into `port`.
    pub fn insert_module(&self, port: u32) {
        self.lock().presence.insert(port, true);
    }

    /// Simulates removing the module from `port`.
    pub fn remove_module(&self, port: u32) {
        self.lock().presence.insert(port, false);
    }

    /// Seeds the low-power mode flag for `port`.
    pub fn set_low_power(&self, port: u32, enabled: bool) {
        self.lock().lpmode.insert(port, enabled);
    }

    /// Seeds the raw EEPROM hex dump returned for `port`.
    pub fn set_eeprom_hex(&self, port: u32, hex: impl Into<String>) {
        self.lock().eeprom.insert(port, hex.into());
    }

    /// Makes presence reads for `port` fail at the RPC level while the
    /// connection itself stays healthy.
    pub fn fail_presence_on(&self, port: u32) {
        self.lock().presence_failures.insert(port);
    }

    /// Clears a presence failure injected via [`fail_presence_on`].
    ///
    /// [`fail_presence_on`]: MockPltfmMgr::fail_presence_on
    pub fn clear_presence_failure(&self, port: u32) {
        self.lock().presence_failures.remove(&port);
    }

    /// Returns every RPC issued so far, in order.
    pub fn calls(&self) -> Vec<MgmtCall> {
        self.lock().calls.clone()
    }

    /// Forgets all recorded RPCs.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Returns how many connections have been opened successfully.
    pub fn connect_count(&self) -> u64 {
        self.lock().connects
    }
}

/// Connection handle vended by [`MockPltfmMgr`].
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock platform state poisoned")
    }
}

#[async_trait]
impl MgmtClient for MockPltfmMgr {
    async fn connect(&self) -> XcvrResult<Box<dyn MgmtConnection>> {
        let mut state = self.lock();
        if !state.reachable {
            return Err(XcvrError::connection("mock endpoint down"));
        }
        state.connects += 1;
        Ok(Box::new(MockConnection {
            state: self.state.clone(),
        }))
    }
}

#[async_trait]
impl MgmtConnection for MockConnection {
    async fn max_qsfp_port(&mut self) -> XcvrResult<u32> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::MaxQsfpPort);
        Ok(state.max_port)
    }

    async fn presence(&mut self, port: u32) -> XcvrResult<bool> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::Presence(port));
        if state.presence_failures.contains(&port) {
            return Err(XcvrError::rpc("presence", format!("injected failure for port {port}")));
        }
        Ok(state.presence.get(&port).copied().unwrap_or(false))
    }

    async fn low_power_mode(&mut self, port: u32) -> XcvrResult<bool> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::LowPowerMode(port));
        Ok(state.lpmode.get(&port).copied().unwrap_or(false))
    }

    async fn set_low_power_mode(&mut self, port: u32, enable: bool) -> XcvrResult<i32> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::SetLowPowerMode(port, enable));
        state.lpmode.insert(port, enable);
        Ok(0)
    }

    async fn set_reset(&mut self, port: u32, asserted: bool) -> XcvrResult<i32> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::SetReset(port, asserted));
        Ok(0)
    }

    async fn eeprom_hex(&mut self, port: u32) -> XcvrResult<String> {
        let mut state = self.lock();
        state.calls.push(MgmtCall::EepromHex(port));
        Ok(state.eeprom.get(&port).cloned().unwrap_or_default())
    }
}
