//! Binary buffer writer.

/// An append-only binary buffer writer.
///
/// All multi-byte integers are written big-endian, which is the byte order of
/// every wire format in this workspace.
///
/// # Example
///
/// ```
/// use algopack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x02, 0x03]);
/// ```
#[derive(Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Discards everything written so far, keeping the allocation.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Returns the written bytes and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// View of the written bytes without flushing.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.bytes.push(val);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.bytes.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a u8 marker followed by a big-endian u16.
    pub fn u8u16(&mut self, u8_val: u8, u16_val: u16) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u16_val.to_be_bytes());
    }

    /// Writes a u8 marker followed by a big-endian u32.
    pub fn u8u32(&mut self, u8_val: u8, u32_val: u32) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u32_val.to_be_bytes());
    }

    /// Writes a u8 marker followed by a big-endian u64.
    pub fn u8u64(&mut self, u8_val: u8, u64_val: u64) {
        self.bytes.push(u8_val);
        self.bytes.extend_from_slice(&u64_val.to_be_bytes());
    }

    /// Writes a byte slice as-is.
    pub fn buf(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.bytes.extend_from_slice(s.as_bytes());
        s.len()
    }

    /// Writes an ASCII string (a subset of UTF-8).
    pub fn ascii(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }
}
