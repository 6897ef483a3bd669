// Incremental gzip decompression over an in-memory blob.
//
// The inflater sees the compressed bytes one fixed-size slice at a time and
// yields decoded chunks of bounded size on demand; the full decoded text is
// never held at once.

use std::io::{self, BufRead, ErrorKind, Read};
use std::sync::Arc;

use flate2::bufread::GzDecoder;

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::metrics;

/// `BufRead` over a shared blob that exposes at most `slice` bytes per fill.
struct SliceFeed {
    data: Arc<[u8]>,
    pos: usize,
    slice: usize,
}

impl Read for SliceFeed {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for SliceFeed {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let end = (self.pos + self.slice).min(self.data.len());
        Ok(&self.data[self.pos..end])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.data.len());
    }
}

/// Lazy sequence of decoded chunks from a gzip blob.
pub struct Inflater {
    decoder: GzDecoder<SliceFeed>,
    chunk_bytes: usize,
    total_bytes: usize,
    finished: bool,
    truncated: bool,
}

impl Inflater {
    pub fn new(data: Arc<[u8]>, config: &ReplayConfig) -> Self {
        let config = config.normalized();
        let total_bytes = data.len();
        let feed = SliceFeed {
            data,
            pos: 0,
            slice: config.slice_bytes,
        };
        Inflater {
            decoder: GzDecoder::new(feed),
            chunk_bytes: config.chunk_bytes,
            total_bytes,
            finished: false,
            truncated: false,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.decoder.get_ref().pos
    }

    /// Fraction of the compressed blob consumed, in `0.0..=1.0`.
    pub fn consumed_fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        self.consumed() as f64 / self.total_bytes as f64
    }

    /// No further chunk will be produced.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The gzip stream ended before its trailer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Iterator for Inflater {
    type Item = Result<Vec<u8>, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut chunk = vec![0u8; self.chunk_bytes];
        loop {
            let before = self.consumed();
            let result = self.decoder.read(&mut chunk);
            metrics::COMPRESSED_BYTES_TOTAL.inc_by((self.consumed() - before) as u64);
            match result {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    metrics::INFLATED_BYTES_TOTAL.inc_by(n as u64);
                    return Some(Ok(chunk));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    tracing::debug!(consumed = self.consumed(), "gzip stream ended early: {e}");
                    self.finished = true;
                    self.truncated = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(ReplayError::Decompress(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(text: &[u8]) -> Arc<[u8]> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text).unwrap();
        encoder.finish().unwrap().into()
    }

    fn sample_text() -> Vec<u8> {
        (0..2000)
            .map(|i| format!("{{\"step\": {i}}},"))
            .collect::<String>()
            .into_bytes()
    }

    #[test]
    fn test_chunks_concatenate_to_original() {
        let text = sample_text();
        let data = gzip(&text);
        for size in [1, 7, 4096] {
            let inflater = Inflater::new(data.clone(), &ReplayConfig::with_chunk_size(size));
            let mut out = Vec::new();
            for chunk in inflater {
                let chunk = chunk.unwrap();
                assert!(chunk.len() <= size);
                out.extend_from_slice(&chunk);
            }
            assert_eq!(out, text, "chunk size {size}");
        }
    }

    #[test]
    fn test_progress_reaches_one() {
        let data = gzip(&sample_text());
        let mut inflater = Inflater::new(data, &ReplayConfig::with_chunk_size(64));
        // The gzip header is read on construction.
        let mut last = inflater.consumed_fraction();
        assert!(last < 1.0);
        while let Some(chunk) = inflater.next() {
            chunk.unwrap();
            let now = inflater.consumed_fraction();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(inflater.consumed_fraction(), 1.0);
        assert!(inflater.is_finished());
        assert!(!inflater.is_truncated());
    }

    #[test]
    fn test_cut_blob_reports_truncation() {
        let data = gzip(&sample_text());
        let cut: Arc<[u8]> = data[..data.len() / 2].into();
        let mut inflater = Inflater::new(cut, &ReplayConfig::default());
        let decoded: usize = inflater.by_ref().map(|chunk| chunk.unwrap().len()).sum();
        assert!(decoded < sample_text().len());
        assert!(inflater.is_truncated());
    }

    #[test]
    fn test_empty_blob_is_truncated() {
        let mut inflater = Inflater::new(Arc::from(Vec::new()), &ReplayConfig::default());
        assert!(inflater.next().is_none());
        assert!(inflater.is_truncated());
    }

    #[test]
    fn test_checksum_mismatch_is_decompress_error() {
        let data = gzip(b"{\"init\": {}}");
        let mut corrupt = data.to_vec();
        let crc_at = corrupt.len() - 8;
        corrupt[crc_at] ^= 0xff;
        let inflater = Inflater::new(corrupt.into(), &ReplayConfig::default());
        let results: Vec<_> = inflater.collect();
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ReplayError::Decompress(_)))));
    }
}
