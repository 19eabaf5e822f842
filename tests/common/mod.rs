//! Common test utilities
#![allow(dead_code)]

use shapr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use shapr::runtime::Runtime;

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}
