//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-playback`, `bridge-desktop`). Host applications can
//! depend on `mavrix-workspace` and enable the documented features without
//! needing to wire each crate individually.
