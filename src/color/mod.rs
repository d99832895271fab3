//! Color and attribute model.
//!
//! Two native models have to be reconciled:
//!
//! - **Packed** (Windows console): one attribute byte, foreground in the
//!   low nibble and background in the high nibble. Either half can be
//!   rewritten without touching the other. See [`PackedAttr`].
//! - **Paired** (curses-style terminals): colors only exist as registered
//!   (foreground, background) pairs, and brightness is a bold overlay.
//!   See [`ColorPairRegistry`].
//!
//! The session tracks the logical [`AttributePair`] and hands the whole pair
//! to the backend on every change, so neither model can lose the half that
//! was not mentioned.

pub mod palette;
pub mod pairs;

pub use palette::{AttributePair, BaseColor, Color, PackedAttr};
pub use pairs::{ColorPairRegistry, PairHandle, PairStyle, FIRST_DYNAMIC_PAIR, RESERVED_PAIRS};
