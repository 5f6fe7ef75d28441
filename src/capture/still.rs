//! A captured still image.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// One still image, produced and consumed within a single loop iteration.
#[derive(Clone)]
pub struct Capture {
    /// Encoded JPEG bytes as written by the camera.
    jpeg: Vec<u8>,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Capture {
    /// Creates a capture from encoded JPEG bytes.
    pub fn new(jpeg: Vec<u8>, sequence: u64) -> Self {
        Self {
            jpeg,
            sequence,
        }
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    /// True if the camera produced no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }

    /// Sequence number assigned by the camera.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Checks the buffer starts with a JPEG SOI marker.
    pub fn is_jpeg(&self) -> bool {
        self.jpeg.starts_with(&JPEG_SOI)
    }

    /// Encodes the image for a `binaryData` field (URL-safe, padded).
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(&self.jpeg)
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("sequence", &self.sequence)
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_creation() {
        let capture = Capture::new(vec![0xFF, 0xD8, 0xFF, 0xD9], 3);

        assert_eq!(capture.len(), 4);
        assert_eq!(capture.sequence(), 3);
        assert!(capture.is_jpeg());
    }

    #[test]
    fn test_not_jpeg() {
        let capture = Capture::new(b"PNG".to_vec(), 1);
        assert!(!capture.is_jpeg());
        assert!(!Capture::new(Vec::new(), 1).is_jpeg());
    }

    #[test]
    fn test_base64_uses_url_safe_alphabet() {
        // 0xFB 0xFF encodes to "-_8=" in the URL-safe alphabet and "+/8=" in standard.
        let capture = Capture::new(vec![0xFB, 0xFF], 1);
        assert_eq!(capture.to_base64(), "-_8=");
    }
}
