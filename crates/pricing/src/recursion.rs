use alloy::primitives::Address;
use oracle_types::{TokenKey, MAX_RECURSION_DEPTH};

use crate::RouterError;

/// Tracks how many composite-token unwraps deep the current price
/// resolution is, so a misconfigured or malicious pair of tokens that
/// price each other can't recurse forever.
///
/// The limit is fixed at `MAX_RECURSION_DEPTH` (10).
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursionGuard {
    depth: u8,
}

impl RecursionGuard {
    /// A guard at the top of a resolution (depth 0).
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Produce a guard one level deeper, failing if that would exceed
    /// [`MAX_RECURSION_DEPTH`].
    pub fn descend(self, token: TokenKey, via: Address) -> Result<Self, RouterError> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RouterError::RecursionLimit { token, via });
        }
        Ok(Self { depth: self.depth + 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use oracle_types::Chain;

    #[test]
    fn descend_fails_past_max_depth() {
        let token = TokenKey { chain: Chain::new(1), address: Address::ZERO };
        let mut guard = RecursionGuard::new();
        for _ in 0..MAX_RECURSION_DEPTH {
            guard = guard.descend(token, Address::ZERO).unwrap();
        }
        assert!(guard.descend(token, Address::ZERO).is_err());
    }
}
