//! Module exporting traits of this library.
pub(crate) use crate::priv_util::SliceRead;

pub use crate::common::name::NameMatch;
pub use crate::common::prop::PropReader;
pub use crate::host::StrOps;

pub use fallible_iterator::FallibleIterator;
