//! # ld-draw — Live draw engine
//!
//! Draws unique winners from a pool of ticket numbers or names, one prize
//! tier at a time, and dramatizes each result with a timed reveal.
//!
//! ## Features
//!
//! - **Entry Pool**: range or list specs, zero-padded tickets, name lists
//! - **Prize Sequencer**: ordered tiers, editable between draws
//! - **Uniform Selection**: unbiased sampling without replacement
//! - **Reveal Animator**: digit locking, deceleration, final fake-out
//! - **Undo / Reset**: exact inverse of the last committed batch
//! - **Timing Profiles**: Normal, Turbo, Instant
//!
//! ## Architecture
//!
//! ```text
//! DrawEngine
//!     │
//!     ├── EntryPool (all + remaining)
//!     ├── PrizeList (ordered tiers)
//!     ├── DrawHistory (committed batches)
//!     └── RevealAnimator (one per winner)
//!           │
//!           v
//!     DrawSnapshot + DrawEvent
//! ```
//!
//! The engine is driven by time passed in from outside. See [`clock`] for
//! the driver loop.

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod pool;
pub mod prize;
pub mod reveal;
pub mod selector;
pub mod timing;

pub use clock::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use history::*;
pub use pool::*;
pub use prize::*;
pub use reveal::*;
pub use selector::*;
pub use timing::*;
