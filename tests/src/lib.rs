// Integration test support for RAVEN end-to-end tests
//
// Scenarios drive the real topology store, metrics store, selector and
// monitoring loop against a scripted controller.

pub mod test_harness;

pub use test_harness::{
    diamond, host_id, host_mac, init_tracing, switch_id, FakeController, InventoryBuilder,
    TestResult,
};
