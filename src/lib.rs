//! Bit-packed bridge deals, random dealing and batched double dummy solving.
//!
//! Cards, holdings, hands and deals are small [`Copy`] values backed by
//! fixed-width integers.  Random deals are generated from a shuffled deck, and
//! partial deals can be completed from the cards nobody holds yet.  Any number
//! of deals can be solved through [`dds-bridge/dds`][dds], the fundamental C++
//! double dummy solver, which is reached via [its system crate][sys] and fed in
//! packs no larger than it accepts in one call.
//!
//! [dds]: https://github.com/dds-bridge/dds
//! [sys]: https://lib.rs/crates/dds-bridge-sys
#![warn(missing_docs)]

mod deal;
mod record;
mod solver;
mod strain;

pub use deal::*;
pub use record::*;
pub use solver::*;
pub use strain::*;

/// Raw bindings to DDS, as used by [`Engine`]
pub use dds_bridge_sys as sys;
