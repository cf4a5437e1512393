//! # Architecture Abstraction Layer
//!
//! Board ports implementing [`HardwareClock`](crate::clock::HardwareClock).
//! Currently implements the Cortex-M4 SysTick port; extensible to other
//! architectures by adding sibling modules.

pub mod cortex_m4;
