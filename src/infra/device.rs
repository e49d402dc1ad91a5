// ============================================================
// Layer 6 — Devices and the Accelerator Probe
// ============================================================
// Inference needs a working accelerator. WGPU only finds out
// whether an adapter exists when the first tensor is created,
// and reports a missing adapter by panicking, so the probe
// allocates a one-element tensor on every requested device
// inside catch_unwind and turns a panic into an error.

use anyhow::{bail, Result};
use burn::{
    backend::{
        ndarray::NdArrayDevice,
        wgpu::{Wgpu, WgpuDevice},
    },
    prelude::*,
};
use std::panic::{self, AssertUnwindSafe};

use crate::domain::traits::AcceleratorProbe;

/// One WGPU device per requested rank
pub fn wgpu_devices(count: usize) -> Vec<WgpuDevice> {
    match count {
        0 | 1 => vec![WgpuDevice::default()],
        n => (0..n).map(WgpuDevice::DiscreteGpu).collect(),
    }
}

/// CPU ranks all share the host
pub fn cpu_devices(count: usize) -> Vec<NdArrayDevice> {
    vec![NdArrayDevice::Cpu; count.max(1)]
}

pub struct WgpuProbe {
    devices: Vec<WgpuDevice>,
}

impl WgpuProbe {
    pub fn new(devices: Vec<WgpuDevice>) -> Self {
        Self { devices }
    }
}

impl AcceleratorProbe for WgpuProbe {
    fn ensure_available(&self) -> Result<()> {
        if self.devices.is_empty() {
            bail!("No accelerator devices requested");
        }
        for device in &self.devices {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                Tensor::<Wgpu, 1>::zeros([1], device).into_data()
            }));
            if outcome.is_err() {
                bail!("Accelerator {:?} is not available; a GPU is required for inference", device);
            }
            tracing::debug!("Accelerator {:?} is available", device);
        }
        Ok(())
    }
}
