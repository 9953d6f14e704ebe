//! String primitives supplied by the host.
//!
//! The walker never measures or compares names itself. It asks a [`StrOps`] implementation, which
//! is handed to [`DevTree::with_str_ops`]. [`DevTree::new`] uses [`NulStrOps`].

#[cfg(doc)]
use crate::base::DevTree;

use core::cmp::Ordering;

/// Length and comparison over NUL-terminated byte strings.
pub trait StrOps: Sync {
    /// Returns the number of bytes in `buf` before the first NUL, or `None` when `buf` holds no
    /// NUL terminator at all.
    fn strlen(&self, buf: &[u8]) -> Option<usize>;

    /// Three-way comparison of two byte strings. Neither operand includes its terminator.
    fn strcmp(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Plain C semantics: length up to the first NUL, byte-wise unsigned comparison.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NulStrOps;

impl StrOps for NulStrOps {
    #[inline]
    fn strlen(&self, buf: &[u8]) -> Option<usize> {
        buf.iter().position(|&b| b == 0)
    }

    #[inline]
    fn strcmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_strlen() {
        assert_eq!(NulStrOps.strlen(b"cpus\0\0\0\0"), Some(4));
        assert_eq!(NulStrOps.strlen(b"\0"), Some(0));
        assert_eq!(NulStrOps.strlen(b"unterminated"), None);
    }

    #[test]
    fn nul_strcmp() {
        assert_eq!(NulStrOps.strcmp(b"cpu", b"cpu"), Ordering::Equal);
        assert_eq!(NulStrOps.strcmp(b"cpu", b"cpus"), Ordering::Less);
        assert_eq!(NulStrOps.strcmp(b"memory", b"cpus"), Ordering::Greater);
        assert_eq!(NulStrOps.strcmp(b"cpu@0", b"cpu"), Ordering::Greater);
    }
}
