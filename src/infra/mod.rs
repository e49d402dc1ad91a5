// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the outside world:
//
//   config_loader.rs         — JSON config file + dotted overrides
//   device.rs                — WGPU/CPU devices, accelerator probe
//   checkpoint.rs            — restores the frozen encoder
//   representation_writer.rs — one safetensors file per sequence
//   manifest.rs              — CSV index of the written files

/// Configuration file loading and command-line overrides
pub mod config_loader;

/// Device lists and the accelerator precondition
pub mod device;

/// Model checkpoint saving and restoring
pub mod checkpoint;

/// Per-sequence representation files
pub mod representation_writer;

/// CSV manifest of written representations
pub mod manifest;
