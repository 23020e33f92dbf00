// ========================= zlib adapter =========================
//
// Encode side compresses the whole internal frame at the best level. Decode
// side cannot know where the compressed stream ends (the grid keeps going with
// background blocks), so it inflates one byte at a time and stops on the
// stream's own end marker.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{PaperError, Result};

pub fn zlib_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::best());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

const SCRATCH_LEN: usize = 32 * 1024;

pub struct StreamInflater {
    inner: Decompress,
    scratch: Vec<u8>,
    output: Vec<u8>,
    consumed: usize,
    finished: bool,
}

impl StreamInflater {
    pub fn new() -> Self {
        Self { inner: Decompress::new(true), scratch: vec![0u8; SCRATCH_LEN], output: Vec::new(), consumed: 0, finished: false }
    }

    /// Feeds a single compressed byte. Returns `true` once the logical end of
    /// the stream has been reached; further bytes are ignored after that.
    pub fn push(&mut self, byte: u8) -> Result<bool> {
        if self.finished { return Ok(true); }
        let one = [byte];
        let mut input: &[u8] = &one;
        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let status = self
                .inner
                .decompress(input, &mut self.scratch, FlushDecompress::None)
                .map_err(|e| PaperError::CorruptPayload(format!("inflate failed at byte {}: {e}", self.consumed)))?;
            let used = (self.inner.total_in() - before_in) as usize;
            let produced = (self.inner.total_out() - before_out) as usize;
            self.output.extend_from_slice(&self.scratch[..produced]);
            input = &input[used..];
            if let Status::StreamEnd = status {
                self.consumed += 1;
                self.finished = true;
                return Ok(true);
            }
            // a full scratch buffer may hide more pending output
            if input.is_empty() && produced < self.scratch.len() { break; }
            if used == 0 && produced == 0 { break; }
        }
        self.consumed += 1;
        Ok(false)
    }

    pub fn is_finished(&self) -> bool { self.finished }

    /// Compressed bytes accepted so far.
    pub fn consumed(&self) -> usize { self.consumed }

    pub fn finish(self) -> Result<Vec<u8>> {
        if !self.finished {
            return Err(PaperError::CorruptPayload(format!(
                "compressed stream ended after {} bytes without an end marker",
                self.consumed
            )));
        }
        Ok(self.output)
    }
}

impl Default for StreamInflater {
    fn default() -> Self { Self::new() }
}
