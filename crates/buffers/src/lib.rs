//! Binary buffer utilities for algopack.
//!
//! Provides the [`Writer`] used by every wire encoder in the workspace and
//! the cursor [`Reader`] used by the decoders. The writer appends big-endian
//! integers, raw byte slices and UTF-8 text to a growable byte buffer; the
//! reader walks a borrowed slice with bounds-checked accessors.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;
