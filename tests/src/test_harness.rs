// Test harness for RAVEN integration tests
//
// Provides:
// - A scripted in-memory controller implementing `ControllerApi`
// - Inventory builders using OpenFlow-style device ids and MAC host ids
// - Tracing setup for test output

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use raven_control::{ControllerApi, Error, FlowRule, Result};
use raven_core::inventory::{Device, Host, HostLocation, Inventory, InventoryLink};

/// Test result type alias
pub type TestResult<T> = anyhow::Result<T>;

/// OpenFlow device id of switch `n` (`of:0000000000000003`).
pub fn switch_id(n: u8) -> String {
    format!("of:{n:016x}")
}

/// MAC of host `n` (`00:00:00:00:00:02`).
pub fn host_mac(n: u8) -> String {
    format!("00:00:00:00:00:{n:02x}")
}

/// Inventory host id of host `n` (`00:00:00:00:00:02/None`).
pub fn host_id(n: u8) -> String {
    format!("{}/None", host_mac(n))
}

/// Fluent builder for controller inventories.
#[derive(Debug, Default, Clone)]
pub struct InventoryBuilder {
    inventory: Inventory,
}

impl InventoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Available switches `s<n>`.
    pub fn switches(mut self, ns: &[u8]) -> Self {
        for &n in ns {
            self.inventory.devices.push(Device::available(switch_id(n)));
        }
        self
    }

    /// A switch the controller reports as unavailable.
    pub fn unavailable_switch(mut self, n: u8) -> Self {
        let mut device = Device::available(switch_id(n));
        device.available = false;
        self.inventory.devices.push(device);
        self
    }

    /// Active link `s<a>:<a_port>` to `s<b>:<b_port>`.
    pub fn link(mut self, a: u8, a_port: u16, b: u8, b_port: u16) -> Self {
        self.inventory.links.push(InventoryLink::active(
            &switch_id(a),
            &a_port.to_string(),
            &switch_id(b),
            &b_port.to_string(),
        ));
        self
    }

    /// Host `h<n>` attached to `s<switch>` on `port`.
    pub fn host(mut self, n: u8, switch: u8, port: u16) -> Self {
        self.inventory
            .hosts
            .push(Host::attached(&host_mac(n), &switch_id(switch), &port.to_string()));
        self
    }

    /// Host with neither MAC nor usable id, attached to `s<switch>`.
    pub fn unaddressed_host(mut self, switch: u8, port: u16) -> Self {
        self.inventory.hosts.push(Host {
            id: "/None".into(),
            mac: None,
            locations: vec![HostLocation {
                element_id: switch_id(switch),
                port: Some(port.to_string()),
            }],
        });
        self
    }

    pub fn build(self) -> Inventory {
        self.inventory
    }
}

/// `h1 - s1 - s2 - s3 - h2` plus the detour `s1 - s4 - s3`.
pub fn diamond() -> Inventory {
    InventoryBuilder::new()
        .switches(&[1, 2, 3, 4])
        .link(1, 2, 2, 1)
        .link(2, 2, 3, 1)
        .link(1, 3, 4, 1)
        .link(4, 2, 3, 2)
        .host(1, 1, 1)
        .host(2, 3, 3)
        .build()
}

/// In-memory controller whose answers and failures are scripted by the test.
#[derive(Default)]
pub struct FakeController {
    inventory: Mutex<Inventory>,
    fail_links_read: AtomicBool,
    /// `(device, dst_mac)` pairs to reject; `None` rejects every destination.
    failing_rules: Mutex<HashSet<(String, Option<String>)>>,
    attempts: Mutex<Vec<FlowRule>>,
    fetches: AtomicUsize,
}

impl FakeController {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory: Mutex::new(inventory),
            ..Self::default()
        }
    }

    pub fn set_inventory(&self, inventory: Inventory) {
        *self.inventory.lock() = inventory;
    }

    /// Make the link read fail, which fails the whole inventory fetch.
    pub fn fail_fetch(&self, fail: bool) {
        self.fail_links_read.store(fail, Ordering::SeqCst);
    }

    /// Reject every rule written to `device_id`.
    pub fn fail_installs_on(&self, device_id: &str) {
        self.failing_rules.lock().insert((device_id.to_string(), None));
    }

    /// Reject rules written to `device_id` that match `dst_mac` only.
    pub fn fail_installs_towards(&self, device_id: &str, dst_mac: &str) {
        self.failing_rules
            .lock()
            .insert((device_id.to_string(), Some(dst_mac.to_string())));
    }

    pub fn heal_installs(&self) {
        self.failing_rules.lock().clear();
    }

    /// Every rule write attempted, including rejected ones.
    pub fn attempts(&self) -> Vec<FlowRule> {
        self.attempts.lock().clone()
    }

    pub fn clear_attempts(&self) {
        self.attempts.lock().clear();
    }

    /// Number of device reads, i.e. inventory fetch attempts.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControllerApi for FakeController {
    async fn fetch_devices(&self) -> Result<Vec<Device>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.inventory.lock().devices.clone())
    }

    async fn fetch_links(&self) -> Result<Vec<InventoryLink>> {
        if self.fail_links_read.load(Ordering::SeqCst) {
            return Err(Error::Transport("timed out reading /links".into()));
        }
        Ok(self.inventory.lock().links.clone())
    }

    async fn fetch_hosts(&self) -> Result<Vec<Host>> {
        Ok(self.inventory.lock().hosts.clone())
    }

    async fn install_flow(&self, rule: &FlowRule) -> Result<()> {
        self.attempts.lock().push(rule.clone());
        let rejected = {
            let failing = self.failing_rules.lock();
            failing.contains(&(rule.device_id.clone(), None))
                || failing.contains(&(rule.device_id.clone(), Some(rule.dst_mac.clone())))
        };
        if rejected {
            return Err(Error::Status {
                code: 500,
                url: format!("/onos/v1/flows/{}", rule.device_id),
            });
        }
        Ok(())
    }
}

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .try_init();
}
