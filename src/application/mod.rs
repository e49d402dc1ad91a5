// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor code, no printing,
// no direct file access. The predict use case tells the other
// layers what to do, in order.

// The configuration tree for an inference run
pub mod config;

// The inference workflow
pub mod predict_use_case;
