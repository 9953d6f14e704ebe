use core::cmp::Ordering;

use crate::host::StrOps;

/// Separates a node's name from its unit address, as in `uart@10000000`.
pub const UNIT_ADDRESS_SEPARATOR: u8 = b'@';

/// How a requested node name is compared against the names found in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Byte-for-byte equality, unit address included.
    Strict,
    /// Equality up to the first `@` in either name. `"cpu"` matches `"cpu@0"`, and `"cpu@0"`
    /// matches `"cpu@1"`.
    Lenient,
}

impl NameMatch {
    pub fn matches(self, ops: &dyn StrOps, wanted: &[u8], candidate: &[u8]) -> bool {
        match self {
            NameMatch::Strict => ops.strcmp(wanted, candidate) == Ordering::Equal,
            NameMatch::Lenient => lenient_cmp(wanted, candidate) == Ordering::Equal,
        }
    }
}

/// Compares two names, stopping successfully as soon as either reaches a unit address separator.
pub fn lenient_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let mut a = a.iter().copied().chain(core::iter::once(0));
    let mut b = b.iter().copied().chain(core::iter::once(0));
    loop {
        // Both iterators end with a NUL, and comparison stops at the first mismatch or NUL.
        let (ca, cb) = match (a.next(), b.next()) {
            (Some(ca), Some(cb)) => (ca, cb),
            _ => return Ordering::Equal,
        };
        if ca == UNIT_ADDRESS_SEPARATOR || cb == UNIT_ADDRESS_SEPARATOR {
            return Ordering::Equal;
        }
        match ca.cmp(&cb) {
            Ordering::Equal if ca == 0 => return Ordering::Equal,
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
}

/// Splits `name@address` into its two halves. The address is `None` without a separator.
pub fn split_unit_address(name: &[u8]) -> (&[u8], Option<&[u8]>) {
    match name.iter().position(|&b| b == UNIT_ADDRESS_SEPARATOR) {
        Some(at) => (&name[..at], Some(&name[at + 1..])),
        None => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NulStrOps;

    #[test]
    fn strict_keeps_unit_address() {
        assert!(NameMatch::Strict.matches(&NulStrOps, b"cpu@0", b"cpu@0"));
        assert!(!NameMatch::Strict.matches(&NulStrOps, b"cpu@0", b"cpu"));
        assert!(!NameMatch::Strict.matches(&NulStrOps, b"cpu", b"cpu@0"));
    }

    #[test]
    fn lenient_ignores_unit_address() {
        assert!(NameMatch::Lenient.matches(&NulStrOps, b"cpu", b"cpu@0"));
        assert!(NameMatch::Lenient.matches(&NulStrOps, b"cpu@0", b"cpu"));
        assert!(NameMatch::Lenient.matches(&NulStrOps, b"cpu@0", b"cpu@1"));
        assert!(NameMatch::Lenient.matches(&NulStrOps, b"memory", b"memory"));
        assert!(!NameMatch::Lenient.matches(&NulStrOps, b"cpu", b"cpus"));
        assert!(!NameMatch::Lenient.matches(&NulStrOps, b"cpus", b"cpu"));
        assert!(!NameMatch::Lenient.matches(&NulStrOps, b"cpu", b"uart@0"));
    }

    #[test]
    fn lenient_ordering() {
        assert_eq!(lenient_cmp(b"abc", b"abd"), Ordering::Less);
        assert_eq!(lenient_cmp(b"b@1", b"a@1"), Ordering::Greater);
        assert_eq!(lenient_cmp(b"", b"@"), Ordering::Equal);
    }

    #[test]
    fn unit_address_split() {
        assert_eq!(
            split_unit_address(b"uart@10000000"),
            (&b"uart"[..], Some(&b"10000000"[..]))
        );
        assert_eq!(split_unit_address(b"cpus"), (&b"cpus"[..], None));
        assert_eq!(split_unit_address(b"cpu@"), (&b"cpu"[..], Some(&b""[..])));
    }
}
