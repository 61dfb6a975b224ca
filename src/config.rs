//! Decode configuration and the per-call context derived from it.

use crate::error::DecodeError;

/// Default maximum nesting depth for embedded messages and groups.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Configuration for decoding untrusted buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Maximum nesting depth of embedded messages and (skipped) groups.
    ///
    /// The top-level message is depth 0, every embedded message or group
    /// entered adds one. Default: [`DEFAULT_MAX_DEPTH`].
    pub max_depth: u32,
}

impl DecodeConfig {
    /// Returns a config with the provided maximum nesting depth.
    pub const fn with_max_depth(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Recursion bookkeeping threaded through a single decode call.
///
/// Cheap to copy, each nested level gets its own context from
/// [`DecodeContext::enter_recursion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeContext {
    remaining: u32,
    limit: u32,
}

impl DecodeContext {
    pub const fn new(config: &DecodeConfig) -> Self {
        Self {
            remaining: config.max_depth,
            limit: config.max_depth,
        }
    }

    /// Returns the context for one level deeper, or
    /// [`DecodeError::RecursionLimitExceeded`] if the budget is spent.
    #[inline]
    pub fn enter_recursion(self) -> Result<Self, DecodeError> {
        match self.remaining.checked_sub(1) {
            Some(remaining) => Ok(Self { remaining, ..self }),
            None => Err(DecodeError::RecursionLimitExceeded { limit: self.limit }),
        }
    }

    /// Nesting levels still available below this one.
    pub const fn remaining_depth(&self) -> u32 {
        self.remaining
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(&DecodeConfig::default())
    }
}
