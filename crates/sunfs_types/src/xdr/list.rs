use std::io::{Read, Write};

use crate::xdr::{Pack, Result, Unpack};

/// An XDR optional-data list (RFC 4506 §4.19).
///
/// The wire form flattens a linked list into the stream: each element is
/// preceded by a `true` boolean and the list is terminated by `false`.
/// Decoding therefore needs no lookahead and no length prefix.
#[derive(Debug)]
pub struct List<T>(pub Vec<T>);

impl<T> Default for List<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> List<T> {
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: Pack> Pack for List<T> {
    fn packed_size(&self) -> usize {
        let mut size = 4;
        for item in &self.0 {
            size += 4 + item.packed_size();
        }
        size
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let mut written = 0;
        for item in &self.0 {
            written += true.pack(out)?;
            written += item.pack(out)?;
        }
        written += false.pack(out)?;
        Ok(written)
    }
}

impl<T: Unpack> Unpack for List<T> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let mut items = Vec::new();
        let mut read = 0;
        loop {
            let (more, n) = bool::unpack(input)?;
            read += n;
            if !more {
                break;
            }
            let (item, n) = T::unpack(input)?;
            read += n;
            items.push(item);
        }
        Ok((Self(items), read))
    }
}

/// A [`List`] builder that refuses elements once a packed-size budget is
/// exhausted. Servers use it to honor the `maxcount` of READDIRPLUS.
pub struct BoundedList<T> {
    list: List<T>,
    current_size: usize,
    max_size: usize,
}

impl<T: Pack> BoundedList<T> {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        let list = List(Vec::new());
        let current_size = list.packed_size();
        Self {
            list,
            current_size,
            max_size,
        }
    }

    /// Appends `item`, or hands it back if it would overflow the budget.
    pub fn try_push(&mut self, item: T) -> std::result::Result<(), T> {
        let item_size = 4 + item.packed_size();
        if self.current_size + item_size > self.max_size {
            return Err(item);
        }
        self.list.0.push(item);
        self.current_size += item_size;
        Ok(())
    }

    #[must_use]
    pub fn into_inner(self) -> List<T> {
        self.list
    }
}
