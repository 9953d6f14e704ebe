use core::mem::size_of;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SliceReadError {
    InvalidOffset(usize, usize),
    UnexpectedEndOfInput,
}

pub(crate) type SliceReadResult<T> = Result<T, SliceReadError>;

/// Bounded big-endian reads out of a borrowed byte buffer.
///
/// Every value is decoded as big-endian regardless of the host's byte order, and every read is
/// checked against the end of the slice before any byte is touched.
pub(crate) trait SliceRead<'a> {
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32>;
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64>;
    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]>;
}

macro_rules! be_read {
    ( $buf:ident, $type:ident , $off:expr ) => {{
        let end = $off
            .checked_add(size_of::<$type>())
            .ok_or(SliceReadError::InvalidOffset($off, size_of::<$type>()))?;
        match $buf.get($off..end) {
            Some(bytes) => {
                let mut raw = [0u8; size_of::<$type>()];
                raw.copy_from_slice(bytes);
                Ok($type::from_be_bytes(raw))
            }
            None => Err(SliceReadError::InvalidOffset($off, size_of::<$type>())),
        }
    }};
}

impl<'a> SliceRead<'a> for &'a [u8] {
    #[inline]
    fn read_be_u32(&self, pos: usize) -> SliceReadResult<u32> {
        be_read!(self, u32, pos)
    }

    #[inline]
    fn read_be_u64(&self, pos: usize) -> SliceReadResult<u64> {
        be_read!(self, u64, pos)
    }

    fn read_bstring0(&self, pos: usize) -> SliceReadResult<&'a [u8]> {
        let buf: &'a [u8] = *self;
        let tail = buf.get(pos..).ok_or(SliceReadError::UnexpectedEndOfInput)?;
        match tail.iter().position(|&b| b == 0) {
            Some(len) => Ok(&tail[..len]),
            None => Err(SliceReadError::UnexpectedEndOfInput),
        }
    }
}

/// Number of whole cells needed to hold `len` bytes.
#[inline]
pub(crate) const fn cells_for(len: usize, cell: usize) -> usize {
    len / cell + (len % cell != 0) as usize
}
