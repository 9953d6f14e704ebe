use core::str::from_utf8;

use crate::prelude::*;

use crate::base::DevTree;
use crate::error::DevTreeError;
use crate::spec::Phandle;

#[cfg(doc)]
use crate::base::DevTreeProp;

pub trait PropReader<'dt> {
    type NodeType;

    /// Returns the buffer associtated with the property's data.
    #[doc(hidden)]
    fn propbuf(&self) -> &'dt [u8];

    /// Returns offset of this property's name in the strings block.
    #[doc(hidden)]
    fn nameoff(&self) -> usize;

    #[doc(hidden)]
    fn fdt(&self) -> &DevTree<'dt>;

    /// Returns the raw name of the property, resolved through the strings block.
    fn name_bytes(&self) -> Result<&'dt [u8], DevTreeError> {
        PropTraitWrap(self).get_prop_name()
    }

    /// Returns the name of the property within the device tree.
    #[inline]
    fn name(&self) -> Result<&'dt str, DevTreeError> {
        Ok(from_utf8(self.name_bytes()?)?)
    }

    /// Returns the length of the property value within the device tree
    #[inline]
    #[must_use]
    fn length(&self) -> usize {
        self.propbuf().len()
    }

    /// Returns the node which this property is contained within.
    fn node(&self) -> Self::NodeType;

    /// Read a big-endian [`u32`] from the provided offset in this device tree property's value.
    /// Convert the read value into the machines' native [`u32`] format and return it.
    ///
    /// Offsets are in bytes and are normally a multiple of four, but unaligned offsets are read
    /// just the same.
    ///
    /// If an offset which would cause this read to access memory outside of this property's value
    /// an [`Err`] containing [`DevTreeError::InvalidOffset`] will be returned.
    ///
    /// This method will *not* panic.
    #[inline]
    fn get_u32(&self, offset: usize) -> Result<u32, DevTreeError> {
        self.propbuf()
            .read_be_u32(offset)
            .or(Err(DevTreeError::InvalidOffset))
    }

    /// Read a big-endian [`u64`] from the provided offset in this device tree property's value.
    ///
    /// The cell at `offset` is the high word and the cell at `offset + 4` the low word.
    /// Out of range reads fail as with [`PropReader::get_u32`].
    #[inline]
    fn get_u64(&self, offset: usize) -> Result<u64, DevTreeError> {
        self.propbuf()
            .read_be_u64(offset)
            .or(Err(DevTreeError::InvalidOffset))
    }

    /// A Phandle is simply defined as a u32 value, as such this method performs the same action as
    /// [`self.get_u32`]
    #[inline]
    fn get_phandle(&self, offset: usize) -> Result<Phandle, DevTreeError> {
        self.get_u32(offset)
    }

    /// Returns the string property as a string if it can be parsed as one.
    #[inline]
    fn get_str(&self) -> Result<&'dt str, DevTreeError> {
        self.get_str_at(0)
    }

    /// Returns the `str` at the given offset within the property.
    #[inline]
    fn get_str_at(&self, offset: usize) -> Result<&'dt str, DevTreeError> {
        let (_, s) = PropTraitWrap(self).get_string(offset)?;
        Ok(s)
    }

    /// Returns the number of NUL-terminated strings in the property's value.
    #[inline]
    fn get_str_count(&self) -> Result<usize, DevTreeError> {
        PropTraitWrap(self).iter_str_list(None)
    }

    /// Fills the supplied slice of references with [`str`] slices parsed from the given property.
    /// If parsing is successful, the number of parsed strings will be returned.
    ///
    /// Strings beyond the length of `list` are counted but not stored.
    ///
    /// If an error occurred while parsing one or more of the strings an [`Err`] of type
    /// [`DevTreeError`] will be returned.
    #[inline]
    fn get_strlist(&self, list: &mut [Option<&'dt str>]) -> Result<usize, DevTreeError> {
        PropTraitWrap(self).iter_str_list(Some(list))
    }

    /// Returns this property's data as a raw slice
    #[inline]
    fn get_raw(&self) -> &'dt [u8] {
        self.propbuf()
    }
}

struct PropTraitWrap<'r, T: ?Sized>(&'r T);

impl<'r, 'dt: 'r, T: PropReader<'dt> + ?Sized> PropTraitWrap<'r, T> {
    fn get_prop_name(&self) -> Result<&'dt [u8], DevTreeError> {
        let fdt = self.0.fdt();
        let tail = fdt
            .strings()
            .get(self.0.nameoff()..)
            .ok_or(DevTreeError::InvalidOffset)?;
        match fdt.str_ops().strlen(tail) {
            Some(len) if len < tail.len() => Ok(&tail[..len]),
            _ => Err(DevTreeError::ParseError),
        }
    }

    /// Returns the string starting at `offset` and the number of bytes it occupies including
    /// its terminator.
    fn get_string(&self, offset: usize) -> Result<(usize, &'dt str), DevTreeError> {
        let res_u8 = self.0.propbuf().read_bstring0(offset)?;
        // Include null byte
        let len = res_u8.len() + 1;
        Ok((len, from_utf8(res_u8)?))
    }

    fn iter_str_list(
        &self,
        mut list_opt: Option<&mut [Option<&'dt str>]>,
    ) -> Result<usize, DevTreeError> {
        let mut offset = 0;
        let mut count = 0;
        while offset < self.0.length() {
            let (len, s) = self.get_string(offset)?;
            offset += len;

            if let Some(slot) = list_opt.as_deref_mut().and_then(|list| list.get_mut(count)) {
                *slot = Some(s);
            }
            count += 1;
        }
        Ok(count)
    }
}
