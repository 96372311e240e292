use rqrr::PreparedImage;
use tracing::{debug, trace};

/// QR matrix decode algorithm operating on an 8-bit luma buffer.
///
/// Implementations must only return payloads that passed the symbol's
/// error-correction check, and must return `None` (never panic) for buffers
/// without a readable code.
pub trait MatrixDecoder: Send + Sync {
    /// Decode the first readable QR code in `luma` (`width * height` bytes, row-major)
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String>;
}

impl<D: MatrixDecoder + ?Sized> MatrixDecoder for &D {
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
        (**self).decode(luma, width, height)
    }
}

impl<D: MatrixDecoder + ?Sized> MatrixDecoder for Box<D> {
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
        (**self).decode(luma, width, height)
    }
}

impl<D: MatrixDecoder + ?Sized> MatrixDecoder for std::sync::Arc<D> {
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
        (**self).decode(luma, width, height)
    }
}

/// Matrix decoder backed by `rqrr`.
///
/// Payload bytes are interpreted as UTF-8 with invalid sequences replaced by
/// U+FFFD. Only the first grid that decodes is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl MatrixDecoder for RqrrDecoder {
    fn decode(&self, luma: &[u8], width: usize, height: usize) -> Option<String> {
        if width == 0 || height == 0 || luma.len() < width * height {
            return None;
        }

        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), width, height, "rqrr grid detection");

        for grid in grids {
            let mut bytes = Vec::new();
            match grid.decode_to(&mut bytes) {
                Ok(_) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
                Err(err) => debug!(error = ?err, "grid located but failed to decode"),
            }
        }
        None
    }
}
