use std::io::{Read, Write};

use crate::xdr::util::{pad_bytes, padded_len, zero_padding};
use crate::xdr::{Error, Pack, Result, Unpack};

impl Pack for u32 {
    fn packed_size(&self) -> usize {
        4
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        out.write_all(&self.to_be_bytes()).map_err(Error::Io)?;
        Ok(4)
    }
}

impl Unpack for u32 {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let mut bytes = [0u8; 4];
        input.read_exact(&mut bytes).map_err(Error::Io)?;
        Ok((Self::from_be_bytes(bytes), 4))
    }
}

impl Pack for u64 {
    fn packed_size(&self) -> usize {
        8
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        out.write_all(&self.to_be_bytes()).map_err(Error::Io)?;
        Ok(8)
    }
}

impl Unpack for u64 {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let mut bytes = [0u8; 8];
        input.read_exact(&mut bytes).map_err(Error::Io)?;
        Ok((Self::from_be_bytes(bytes), 8))
    }
}

impl Pack for bool {
    fn packed_size(&self) -> usize {
        4
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        u32::from(*self).pack(out)
    }
}

impl Unpack for bool {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (val, read) = u32::unpack(input)?;
        match val {
            0 => Ok((false, read)),
            1 => Ok((true, read)),
            _ => Err(Error::InvalidEnumValue(val)),
        }
    }
}

// Fixed-length opaque data: no length prefix, padded to four octets.
impl<const N: usize> Pack for [u8; N] {
    fn packed_size(&self) -> usize {
        padded_len(N)
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        out.write_all(self).map_err(Error::Io)?;
        let padding = zero_padding(N);
        out.write_all(padding).map_err(Error::Io)?;
        Ok(N + padding.len())
    }
}

impl<const N: usize> Unpack for [u8; N] {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let mut buf = [0u8; N];
        input.read_exact(&mut buf).map_err(Error::Io)?;

        let padding = pad_bytes(N);
        if padding > 0 {
            let mut pad = [0u8; 4];
            input.read_exact(&mut pad[..padding]).map_err(Error::Io)?;
        }

        Ok((buf, N + padding))
    }
}

// Variable-length array of fixed-size items, e.g. the gid list of AUTH_UNIX.
impl Pack for Vec<u32> {
    fn packed_size(&self) -> usize {
        4 + self.len() * 4
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let mut written = u32::try_from(self.len())
            .map_err(|_| Error::ObjectTooLarge(self.len()))?
            .pack(out)?;
        for item in self {
            written += item.pack(out)?;
        }
        Ok(written)
    }
}

impl Unpack for Vec<u32> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (len, mut read) = u32::unpack(input)?;
        let mut vec = Self::with_capacity(len as usize);
        for _ in 0..len {
            let (item, n) = u32::unpack(input)?;
            read += n;
            vec.push(item);
        }
        Ok((vec, read))
    }
}
