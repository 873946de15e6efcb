//! # cyl-stage: Cylinder Stage System
//!
//! Defines the canonical stages a spin cycle passes through and the timed
//! trace that records them.
//!
//! ## Philosophy
//!
//! Every cycle of the machine walks the same semantic path:
//! - Spin starts → Reels start one by one → Hold → Reels stop → Grid collected → Patterns evaluated
//!
//! Presentation layers listen to stages, never to sequencer internals.

pub mod event;
pub mod stage;
pub mod trace;

pub use event::*;
pub use stage::*;
pub use trace::*;
