/// Cursor over a borrowed byte slice with big-endian integer accessors.
///
/// Every accessor is bounds-checked and returns `None` past the end of the
/// slice; the cursor never advances on a failed read.
pub struct Reader<'a> {
    pub data: &'a [u8],
    pub x: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, x: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x >= self.data.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    #[inline]
    pub fn u8(&mut self) -> Option<u8> {
        let v = self.peek()?;
        self.x += 1;
        Some(v)
    }

    #[inline]
    pub fn u16(&mut self) -> Option<u16> {
        let buf = self.buf(2)?;
        Some(u16::from_be_bytes([buf[0], buf[1]]))
    }

    #[inline]
    pub fn u32(&mut self) -> Option<u32> {
        let buf = self.buf(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(buf);
        Some(u32::from_be_bytes(bytes))
    }

    #[inline]
    pub fn u64(&mut self) -> Option<u64> {
        let buf = self.buf(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(buf);
        Some(u64::from_be_bytes(bytes))
    }

    /// Returns the next `size` bytes and advances past them.
    #[inline]
    pub fn buf(&mut self, size: usize) -> Option<&'a [u8]> {
        if self.remaining() < size {
            return None;
        }
        let slice = &self.data[self.x..self.x + size];
        self.x += size;
        Some(slice)
    }

    #[inline]
    pub fn skip(&mut self, size: usize) -> Option<()> {
        if self.remaining() < size {
            return None;
        }
        self.x += size;
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_accessors() {
        let mut reader = Reader::new(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(reader.u8(), Some(0x01));
        assert_eq!(reader.u16(), Some(0x0203));
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.u32(), None);
        assert_eq!(reader.x, 3);
    }

    #[test]
    fn failed_reads_do_not_advance() {
        let mut reader = Reader::new(&[0x01]);
        assert_eq!(reader.buf(2), None);
        assert_eq!(reader.x, 0);
        assert_eq!(reader.u8(), Some(0x01));
        assert!(reader.is_empty());
        assert_eq!(reader.u8(), None);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut reader = Reader::new(&[0xaa, 0xbb]);
        assert_eq!(reader.peek(), Some(0xaa));
        assert_eq!(reader.peek(), Some(0xaa));
        assert_eq!(reader.skip(1), Some(()));
        assert_eq!(reader.peek(), Some(0xbb));
    }
}
