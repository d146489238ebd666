use super::{Pack, Result, Unpack};

/// The zero-size XDR `void`, used by procedures with no arguments or no
/// results.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Void;

impl Pack for Void {
    fn packed_size(&self) -> usize {
        0
    }

    fn pack(&self, _out: &mut impl std::io::Write) -> Result<usize> {
        Ok(0)
    }
}

impl Unpack for Void {
    fn unpack(_input: &mut impl std::io::Read) -> Result<(Self, usize)> {
        Ok((Self, 0))
    }
}
