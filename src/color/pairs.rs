//! Color pair registry for backends that cannot set foreground and
//! background independently.
//!
//! Such a backend only knows numbered pairs. Every (foreground, background)
//! combination has to be registered under a handle before it can be
//! activated, and brightness is a separate bold overlay on top of the pair.
//!
//! # Handle layout
//!
//! ```text
//! 0        the terminal's own default colors (never registered)
//! 1..=8    reserved: hue N-1 on black, registered when a session starts
//! 9..=15   unused
//! 16..     allocated on first use of a combination
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::palette::{AttributePair, BaseColor};
use crate::error::{ConioError, Result};

/// Number of handles reserved for single-foreground pairs.
pub const RESERVED_PAIRS: u16 = 8;

/// First handle handed out for dynamically registered combinations.
pub const FIRST_DYNAMIC_PAIR: u16 = 16;

/// Handle of a registered color pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairHandle(pub u16);

impl PairHandle {
    /// The terminal's default colors.
    pub const DEFAULT: PairHandle = PairHandle(0);
}

/// Native rendition in the pair model: a pair plus the bold overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairStyle {
    pub handle: PairHandle,
    pub bold: bool,
}

impl PairStyle {
    /// No pair, no bold.
    pub const NORMAL: PairStyle = PairStyle {
        handle: PairHandle::DEFAULT,
        bold: false,
    };
}

/// Lazily populated mapping from base-hue combinations to handles.
///
/// A combination resolves to the same handle for the lifetime of the
/// registry. There is no eviction: the universe is 64 combinations.
#[derive(Debug, Clone)]
pub struct ColorPairRegistry {
    by_colors: HashMap<(BaseColor, BaseColor), PairHandle>,
    by_handle: HashMap<PairHandle, (BaseColor, BaseColor)>,
    next: u16,
    max_pairs: u16,
}

impl ColorPairRegistry {
    /// Create a registry with the reserved pairs already in place.
    ///
    /// `max_pairs` is the backend's pair limit; handles must stay below it.
    pub fn new(max_pairs: u16) -> Self {
        let mut registry = Self {
            by_colors: HashMap::new(),
            by_handle: HashMap::new(),
            next: FIRST_DYNAMIC_PAIR,
            max_pairs,
        };
        for base in BaseColor::ALL {
            let handle = PairHandle(base.index() as u16 + 1);
            if handle.0 < max_pairs {
                registry.insert(handle, base, BaseColor::Black);
            }
        }
        registry
    }

    fn insert(&mut self, handle: PairHandle, fg: BaseColor, bg: BaseColor) {
        self.by_colors.insert((fg, bg), handle);
        self.by_handle.insert(handle, (fg, bg));
    }

    /// Handle for a combination, registering it on first use.
    pub fn resolve(&mut self, fg: BaseColor, bg: BaseColor) -> Result<PairHandle> {
        if let Some(handle) = self.by_colors.get(&(fg, bg)) {
            return Ok(*handle);
        }
        if self.next >= self.max_pairs {
            return Err(ConioError::PairsExhausted(self.max_pairs));
        }
        let handle = PairHandle(self.next);
        self.next += 1;
        self.insert(handle, fg, bg);
        debug!("Registered color pair {} = {:?} on {:?}", handle.0, fg, bg);
        Ok(handle)
    }

    /// Handle for a combination without registering it.
    pub fn lookup(&self, fg: BaseColor, bg: BaseColor) -> Option<PairHandle> {
        self.by_colors.get(&(fg, bg)).copied()
    }

    /// Colors registered under a handle.
    pub fn colors(&self, handle: PairHandle) -> Option<(BaseColor, BaseColor)> {
        self.by_handle.get(&handle).copied()
    }

    /// Decompose an attribute pair into the native pair rendition.
    ///
    /// Each side is reduced to its base hue. Only a bright foreground turns
    /// on the bold overlay; a bright background renders as its base hue.
    pub fn style_for(&mut self, pair: AttributePair) -> Result<PairStyle> {
        let handle = self.resolve(pair.fg.base(), pair.bg.base())?;
        Ok(PairStyle {
            handle,
            bold: pair.fg.is_bright(),
        })
    }

    /// Number of registered pairs, reserved ones included.
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    pub fn max_pairs(&self) -> u16 {
        self.max_pairs
    }

    /// Drop dynamic registrations, keeping the reserved pairs.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_reserved_pairs() {
        let registry = ColorPairRegistry::new(256);
        assert_eq!(registry.len(), RESERVED_PAIRS as usize);
        assert_eq!(
            registry.lookup(BaseColor::Black, BaseColor::Black),
            Some(PairHandle(1))
        );
        assert_eq!(
            registry.lookup(BaseColor::White, BaseColor::Black),
            Some(PairHandle(8))
        );
        assert_eq!(
            registry.colors(PairHandle(5)),
            Some((BaseColor::Red, BaseColor::Black))
        );
        assert_eq!(registry.colors(PairHandle::DEFAULT), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = ColorPairRegistry::new(256);
        let a = registry.resolve(BaseColor::Yellow, BaseColor::Blue).unwrap();
        let b = registry.resolve(BaseColor::Yellow, BaseColor::Blue).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, PairHandle(FIRST_DYNAMIC_PAIR));
        assert_eq!(registry.len(), RESERVED_PAIRS as usize + 1);
    }

    #[test]
    fn test_dynamic_handles_skip_reserved_range() {
        let mut registry = ColorPairRegistry::new(256);
        for fg in BaseColor::ALL {
            for bg in BaseColor::ALL {
                let handle = registry.resolve(fg, bg).unwrap();
                if bg == BaseColor::Black {
                    assert!(handle.0 >= 1 && handle.0 <= RESERVED_PAIRS);
                } else {
                    assert!(handle.0 >= FIRST_DYNAMIC_PAIR);
                }
            }
        }
        // 8 reserved + 56 dynamic.
        assert_eq!(registry.len(), 64);
    }

    #[test]
    fn test_capacity() {
        let mut registry = ColorPairRegistry::new(FIRST_DYNAMIC_PAIR + 1);
        registry.resolve(BaseColor::Red, BaseColor::Blue).unwrap();
        let err = registry.resolve(BaseColor::Red, BaseColor::Green).unwrap_err();
        assert!(matches!(err, ConioError::PairsExhausted(17)));
        // Known combinations still resolve when full.
        assert!(registry.resolve(BaseColor::Red, BaseColor::Blue).is_ok());
        assert!(registry.resolve(BaseColor::Red, BaseColor::Black).is_ok());
    }

    #[test]
    fn test_style_bright_foreground_is_bold() {
        let mut registry = ColorPairRegistry::new(256);
        let style = registry
            .style_for(AttributePair::new(Color::BrightRed, Color::Black))
            .unwrap();
        assert!(style.bold);
        assert_eq!(style.handle, PairHandle(5));
    }

    #[test]
    fn test_style_bright_background_is_base_hue() {
        let mut registry = ColorPairRegistry::new(256);
        let bright_bg = registry
            .style_for(AttributePair::new(Color::Green, Color::BrightBlue))
            .unwrap();
        let plain_bg = registry
            .style_for(AttributePair::new(Color::Green, Color::Blue))
            .unwrap();
        assert!(!bright_bg.bold);
        assert_eq!(bright_bg.handle, plain_bg.handle);
    }

    #[test]
    fn test_reset_keeps_reserved() {
        let mut registry = ColorPairRegistry::new(256);
        registry.resolve(BaseColor::Cyan, BaseColor::Magenta).unwrap();
        registry.reset();
        assert_eq!(registry.len(), RESERVED_PAIRS as usize);
        assert_eq!(registry.lookup(BaseColor::Cyan, BaseColor::Magenta), None);
    }
}
