//! Input preprocessing.

use crate::error::DecodeError;
use std::borrow::Cow;
use std::io::Read;

/// LZ4 frame format magic number, little-endian on the wire.
const LZ4_FRAME_MAGIC: [u8; 4] = [0x04, 0x22, 0x4d, 0x18];

/// Decompress the row source if it is an LZ4 frame.
///
/// Exports may be stored either as plain CSV or as `.csv.lz4`. Plain
/// input is borrowed unchanged.
///
/// # Errors
///
/// Returns `Structure` if the data carries the LZ4 magic number but does
/// not decompress.
pub fn decode_input(data: &[u8]) -> Result<Cow<'_, [u8]>, DecodeError> {
    if !data.starts_with(&LZ4_FRAME_MAGIC) {
        return Ok(Cow::Borrowed(data));
    }

    let mut decoder = lz4_flex::frame::FrameDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::Structure(format!("decompression error: {}", e)))?;

    tracing::debug!(
        "Decompressed input from {} to {} bytes",
        data.len(),
        decompressed.len()
    );

    Ok(Cow::Owned(decompressed))
}
