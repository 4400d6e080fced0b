//! Incremental UTF-8 decoding of raw body chunks.
//!
//! Transports hand out bytes in arbitrary pieces, so a multi-byte character
//! can be split across two chunks. `Utf8ChunkDecoder` holds the incomplete
//! tail of one chunk and prepends it to the next one.

/// Longest possible UTF-8 sequence.
const MAX_SEQUENCE_LEN: usize = 4;

/// Stateful UTF-8 decoder for a single stream consumption.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk.
    ///
    /// When `more_expected` is true, an incomplete sequence at the end of the
    /// chunk is kept for the next call. When false, everything left is
    /// flushed with replacement characters.
    ///
    /// # Example
    /// ```
    /// use chatpace::decode::Utf8ChunkDecoder;
    ///
    /// let mut decoder = Utf8ChunkDecoder::new();
    /// let bytes = "é".as_bytes();
    /// assert_eq!(decoder.decode(&bytes[..1], true), "");
    /// assert_eq!(decoder.decode(&bytes[1..], true), "é");
    /// ```
    pub fn decode(&mut self, chunk: &[u8], more_expected: bool) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::with_capacity(self.pending.len());

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));

                    match err.error_len() {
                        Some(bad) => {
                            // Invalid bytes in the middle: degrade, keep going.
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + bad);
                        }
                        None => {
                            // Truncated sequence at the end of the buffer.
                            self.pending.drain(..valid_up_to);
                            debug_assert!(self.pending.len() < MAX_SEQUENCE_LEN);
                            if !more_expected {
                                out.push_str(&String::from_utf8_lossy(&self.pending));
                                self.pending.clear();
                            }
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is left at end of stream.
    pub fn finish(&mut self) -> String {
        self.decode(&[], false)
    }

    /// Number of bytes carried over to the next chunk.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii_passthrough() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"data: hi", true), "data: hi");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_decode_split_multibyte_every_position() {
        let text = "Olá, você está aí? 😢 ok";
        let bytes = text.as_bytes();

        for split in 0..=bytes.len() {
            let mut decoder = Utf8ChunkDecoder::new();
            let mut out = decoder.decode(&bytes[..split], true);
            out.push_str(&decoder.decode(&bytes[split..], true));
            out.push_str(&decoder.finish());
            assert_eq!(out, text, "split at byte {}", split);
        }
    }

    #[test]
    fn test_decode_byte_by_byte() {
        let text = "日本語のテキスト";
        let mut decoder = Utf8ChunkDecoder::new();
        let mut out = String::new();
        for byte in text.as_bytes() {
            out.push_str(&decoder.decode(std::slice::from_ref(byte), true));
        }
        assert_eq!(out, text);
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decode_invalid_bytes_degrade() {
        let mut decoder = Utf8ChunkDecoder::new();
        let out = decoder.decode(b"a\xffb", true);
        assert_eq!(out, "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_flushes_truncated_sequence() {
        let mut decoder = Utf8ChunkDecoder::new();
        let bytes = "€".as_bytes();
        assert_eq!(decoder.decode(&bytes[..2], true), "");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }
}
