//! Pipeline stages for turning one page into thumbnails.
//!
//! Each submodule implements exactly one step and is independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ resolve ──▶ fetch ──▶ decode ──▶ transform ──▶ encode ──▶ catalog
//! (<img src>)  (abs URL)   (HTTP)   (filter)   (200×200)     (JPEG)
//! ```
//!
//! 1. [`extract`]   — tolerant HTML parse, every `<img src>` in order
//! 2. [`resolve`]   — join relative sources onto the page origin
//! 3. [`fetch`]     — the only stage with network I/O
//! 4. [`decode`]    — sniff + size-check from the header, then decode to RGB
//! 5. [`transform`] — resize to 200 px high, center-crop, caption
//! 6. [`encode`]    — JPEG output for the [`crate::catalog`]

pub mod decode;
pub mod encode;
pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod transform;
