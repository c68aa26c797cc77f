//! # Authority Roles
//!
//! A role answers two questions about an object, independently:
//! who may author its state on *this* side (proxy or authority), and who
//! does on the *remote* side (remote proxy or remote authority).
//!
//! ## Invariant
//!
//! Exactly one local flag and exactly one remote flag is set. [`Role`] can
//! only be built through constructors that uphold this, so an invalid mask
//! never reaches an object.

use std::fmt;

/// Raw role flags as they appear in a bitmask.
pub mod flags {
    /// This side holds a read-only copy.
    pub const PROXY: u8 = 0x01;
    /// This side may author changes.
    pub const AUTHORITY: u8 = 0x02;
    /// The remote side holds a read-only copy.
    pub const REMOTE_PROXY: u8 = 0x04;
    /// A specific remote peer is authoritative, its updates are accepted.
    pub const REMOTE_AUTHORITY: u8 = 0x08;
}

/// Validated role bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Role(u8);

impl Role {
    /// Client view of an object owned by somebody else.
    pub const PROXY_REMOTE_PROXY: Self = Self(flags::PROXY | flags::REMOTE_PROXY);
    /// Client view of an object this client owns.
    pub const PROXY_REMOTE_AUTHORITY: Self = Self(flags::PROXY | flags::REMOTE_AUTHORITY);
    /// Server view of an object it owns.
    pub const AUTHORITY_REMOTE_PROXY: Self = Self(flags::AUTHORITY | flags::REMOTE_PROXY);
    /// Server view of an object delegated to a client.
    pub const AUTHORITY_REMOTE_AUTHORITY: Self =
        Self(flags::AUTHORITY | flags::REMOTE_AUTHORITY);

    /// Validates a raw bitmask.
    ///
    /// Returns `None` unless exactly one of `PROXY`/`AUTHORITY` and exactly
    /// one of `REMOTE_PROXY`/`REMOTE_AUTHORITY` is set, and no other bit.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        let local = bits & (flags::PROXY | flags::AUTHORITY);
        let remote = bits & (flags::REMOTE_PROXY | flags::REMOTE_AUTHORITY);
        let known = local | remote;
        if bits != known || local.count_ones() != 1 || remote.count_ones() != 1 {
            return None;
        }
        Some(Self(bits))
    }

    /// Builds a role from its two halves.
    #[must_use]
    pub const fn new(local_authority: bool, remote_authority: bool) -> Self {
        let local = if local_authority {
            flags::AUTHORITY
        } else {
            flags::PROXY
        };
        let remote = if remote_authority {
            flags::REMOTE_AUTHORITY
        } else {
            flags::REMOTE_PROXY
        };
        Self(local | remote)
    }

    /// Raw bitmask.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every flag in `mask` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// This side holds a read-only copy.
    #[inline]
    #[must_use]
    pub const fn is_proxy(self) -> bool {
        self.contains(flags::PROXY)
    }

    /// This side may author changes.
    #[inline]
    #[must_use]
    pub const fn has_authority(self) -> bool {
        self.contains(flags::AUTHORITY)
    }

    /// The remote side holds a read-only copy.
    #[inline]
    #[must_use]
    pub const fn is_remote_proxy(self) -> bool {
        self.contains(flags::REMOTE_PROXY)
    }

    /// A remote peer is authoritative.
    #[inline]
    #[must_use]
    pub const fn has_remote_authority(self) -> bool {
        self.contains(flags::REMOTE_AUTHORITY)
    }

    /// Objects with either authority flag are written into replication frames.
    #[inline]
    #[must_use]
    pub const fn is_replicated(self) -> bool {
        self.0 & (flags::AUTHORITY | flags::REMOTE_AUTHORITY) != 0
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = if self.has_authority() { "Authority" } else { "Proxy" };
        let remote = if self.has_remote_authority() {
            "RemoteAuthority"
        } else {
            "RemoteProxy"
        };
        write!(f, "Role({local} | {remote})")
    }
}

#[cfg(test)]
mod tests {
    use super::flags::*;
    use super::*;

    #[test]
    fn test_invalid_masks_rejected() {
        assert!(Role::from_bits(0).is_none());
        assert!(Role::from_bits(PROXY).is_none());
        assert!(Role::from_bits(REMOTE_AUTHORITY).is_none());
        assert!(Role::from_bits(PROXY | AUTHORITY | REMOTE_PROXY).is_none());
        assert!(Role::from_bits(PROXY | REMOTE_PROXY | REMOTE_AUTHORITY).is_none());
        assert!(Role::from_bits(PROXY | REMOTE_PROXY | 0x10).is_none());
    }

    #[test]
    fn test_all_valid_masks_accepted() {
        for (local, remote) in [
            (PROXY, REMOTE_PROXY),
            (PROXY, REMOTE_AUTHORITY),
            (AUTHORITY, REMOTE_PROXY),
            (AUTHORITY, REMOTE_AUTHORITY),
        ] {
            let role = Role::from_bits(local | remote).unwrap();
            assert_eq!(role.bits(), local | remote);
        }
    }

    #[test]
    fn test_new_matches_constants() {
        assert_eq!(Role::new(false, false), Role::PROXY_REMOTE_PROXY);
        assert_eq!(Role::new(false, true), Role::PROXY_REMOTE_AUTHORITY);
        assert_eq!(Role::new(true, false), Role::AUTHORITY_REMOTE_PROXY);
        assert_eq!(Role::new(true, true), Role::AUTHORITY_REMOTE_AUTHORITY);
    }

    #[test]
    fn test_replicated_iff_any_authority() {
        assert!(!Role::PROXY_REMOTE_PROXY.is_replicated());
        assert!(Role::PROXY_REMOTE_AUTHORITY.is_replicated());
        assert!(Role::AUTHORITY_REMOTE_PROXY.is_replicated());
        assert!(Role::AUTHORITY_REMOTE_AUTHORITY.is_replicated());
    }

    #[test]
    fn test_debug_names_both_halves() {
        assert_eq!(
            format!("{:?}", Role::AUTHORITY_REMOTE_PROXY),
            "Role(Authority | RemoteProxy)"
        );
    }
}
