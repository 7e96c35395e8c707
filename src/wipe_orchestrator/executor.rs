// Single-pass write and verify over a whole device
//
// One pass = seek to 0, then ceil(N / B) chunks, the last one N mod B bytes
// (or B when N divides evenly). The buffer is refilled for every chunk.

use crate::algorithms::{fill_pattern, find_pattern_mismatch, PassSpec};
use crate::crypto::RandomSource;
use crate::error::{WipeError, WipeErrorResult};
use crate::io::{AlignedBuffer, RawDeviceChannel};
use crate::WipeProgress;
use std::io;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

/// Called between chunks. `ControlFlow::Break` stops the pass.
pub type ProgressCallback<'a> = dyn FnMut(&WipeProgress) -> ControlFlow<()> + 'a;

/// Minimum spacing between progress reports
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Chunking of one pass over a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassGeometry {
    /// Bytes covered by every pass
    pub length: u64,
    pub chunk_size: usize,
}

impl PassGeometry {
    /// Lengths are rounded down to `alignment`; a device tail shorter than
    /// one alignment unit cannot be addressed by the handle and is skipped.
    pub fn new(device_size: u64, buffer_size: usize, alignment: usize) -> Self {
        let alignment = alignment.max(1);
        let chunk_size = (buffer_size / alignment * alignment).max(alignment);
        let length = device_size - device_size % alignment as u64;
        Self { length, chunk_size }
    }

    pub fn chunk_count(&self) -> u64 {
        (self.length + self.chunk_size as u64 - 1) / self.chunk_size as u64
    }

    /// Length of the chunk starting at `offset`
    pub fn chunk_len(&self, offset: u64) -> usize {
        (self.length - offset).min(self.chunk_size as u64) as usize
    }
}

/// Bytes a pass got through before it finished or failed.
#[derive(Debug)]
pub struct PassReport {
    pub bytes: u64,
    pub error: Option<WipeError>,
}

impl PassReport {
    pub fn into_result(self) -> WipeErrorResult<u64> {
        match self.error {
            None => Ok(self.bytes),
            Some(e) => Err(e),
        }
    }
}

struct ProgressClock {
    interval: Duration,
    phase_start: Instant,
    last_report: Instant,
}

impl ProgressClock {
    fn start(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            phase_start: now,
            last_report: now,
        }
    }

    fn due(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_report) >= self.interval {
            self.last_report = now;
            true
        } else {
            false
        }
    }

    /// Speed over the whole phase, and time left at that speed
    fn rates(&self, done: u64, total: u64) -> (f64, Duration) {
        let elapsed = self.phase_start.elapsed().as_secs_f64();
        if elapsed <= 0.0 || done == 0 {
            return (0.0, Duration::ZERO);
        }
        let speed = done as f64 / elapsed;
        let eta = (total - done) as f64 / speed;
        (speed, Duration::from_secs_f64(eta))
    }
}

/// Identifies the pass being executed
#[derive(Debug, Clone, Copy)]
pub struct PassLabel<'s> {
    pub index: usize,
    pub count: usize,
    pub spec: &'s PassSpec,
}

/// Runs passes with one reusable aligned buffer.
pub struct WipeExecutor<'r> {
    rng: &'r dyn RandomSource,
    buffer: AlignedBuffer,
    geometry: PassGeometry,
    progress_interval: Duration,
}

impl<'r> WipeExecutor<'r> {
    pub fn new(
        rng: &'r dyn RandomSource,
        geometry: PassGeometry,
        progress_interval: Duration,
    ) -> WipeErrorResult<Self> {
        let buffer = AlignedBuffer::page_aligned(geometry.chunk_size)?;
        Ok(Self {
            rng,
            buffer,
            geometry,
            progress_interval,
        })
    }

    pub fn geometry(&self) -> PassGeometry {
        self.geometry
    }

    /// Write `label.spec` over the whole device, then flush to media.
    pub fn write_pass(
        &mut self,
        channel: &mut dyn RawDeviceChannel,
        label: PassLabel<'_>,
        progress: &mut ProgressCallback<'_>,
    ) -> PassReport {
        let mut offset = 0u64;
        let error = self
            .write_chunks(channel, label, progress, &mut offset)
            .err();
        PassReport {
            bytes: offset,
            error,
        }
    }

    fn write_chunks(
        &mut self,
        channel: &mut dyn RawDeviceChannel,
        label: PassLabel<'_>,
        progress: &mut ProgressCallback<'_>,
        offset: &mut u64,
    ) -> WipeErrorResult<()> {
        let pass = label.index;
        let total = self.geometry.length;
        let description = format!(
            "Pass {}/{}: {}",
            label.index, label.count, label.spec.description
        );

        channel
            .seek(0)
            .map_err(|source| WipeError::SeekFailed { pass, source })?;

        let mut clock = ProgressClock::start(self.progress_interval);
        while *offset < total {
            let len = self.geometry.chunk_len(*offset);
            let chunk = &mut self.buffer.as_mut_slice()[..len];

            if label.spec.is_random {
                self.rng.fill_random(chunk)?;
            } else {
                fill_pattern(chunk, label.spec.pattern, *offset);
            }

            write_chunk(channel, chunk, pass, *offset)?;
            *offset += len as u64;

            if *offset < total && clock.due() {
                let report = snapshot(&clock, label, *offset, total, &description, false);
                if progress(&report).is_break() {
                    return Err(WipeError::UserAborted {
                        pass,
                        offset: *offset,
                    });
                }
            }
        }

        channel
            .sync()
            .map_err(|source| WipeError::SyncFailed { pass, source })?;

        // Final report for the pass; the pass is done so an abort here is moot
        let _ = progress(&snapshot(&clock, label, *offset, total, &description, false));
        Ok(())
    }

    /// Read the device back. Pattern passes are compared byte for byte;
    /// random passes only have to be readable.
    pub fn verify_pass(
        &mut self,
        channel: &mut dyn RawDeviceChannel,
        label: PassLabel<'_>,
        progress: &mut ProgressCallback<'_>,
    ) -> PassReport {
        let mut offset = 0u64;
        let error = self
            .verify_chunks(channel, label, progress, &mut offset)
            .err();
        PassReport {
            bytes: offset,
            error,
        }
    }

    fn verify_chunks(
        &mut self,
        channel: &mut dyn RawDeviceChannel,
        label: PassLabel<'_>,
        progress: &mut ProgressCallback<'_>,
        offset: &mut u64,
    ) -> WipeErrorResult<()> {
        let pass = label.index;
        let total = self.geometry.length;
        let description = format!("Verifying pass {}/{}", label.index, label.count);

        channel
            .seek(0)
            .map_err(|source| WipeError::VerifyReadFailed {
                pass,
                offset: 0,
                source,
            })?;

        let mut clock = ProgressClock::start(self.progress_interval);
        while *offset < total {
            let len = self.geometry.chunk_len(*offset);
            let chunk = &mut self.buffer.as_mut_slice()[..len];

            read_chunk(channel, chunk, pass, *offset)?;

            if label.spec.is_deterministic() {
                if let Some(bad) = find_pattern_mismatch(chunk, label.spec.pattern, *offset) {
                    return Err(WipeError::VerifyMismatch { pass, offset: bad });
                }
            }
            *offset += len as u64;

            if *offset < total && clock.due() {
                let report = snapshot(&clock, label, *offset, total, &description, true);
                if progress(&report).is_break() {
                    return Err(WipeError::UserAborted {
                        pass,
                        offset: *offset,
                    });
                }
            }
        }

        let _ = progress(&snapshot(&clock, label, *offset, total, &description, true));
        Ok(())
    }
}

fn snapshot(
    clock: &ProgressClock,
    label: PassLabel<'_>,
    done: u64,
    total: u64,
    description: &str,
    is_verify_phase: bool,
) -> WipeProgress {
    let (speed, eta) = clock.rates(done, total);
    WipeProgress {
        pass_index: label.index,
        pass_count: label.count,
        bytes_done: done,
        bytes_total: total,
        speed,
        eta,
        description: description.to_string(),
        is_verify_phase,
    }
}

/// One chunk, one accepted write. EINTR is retried; anything shorter than
/// the chunk is a short write.
fn write_chunk(
    channel: &mut dyn RawDeviceChannel,
    chunk: &[u8],
    pass: usize,
    offset: u64,
) -> WipeErrorResult<()> {
    loop {
        match channel.write(chunk) {
            Ok(n) if n == chunk.len() => return Ok(()),
            Ok(n) => {
                return Err(WipeError::ShortWrite {
                    pass,
                    offset,
                    written: n,
                    expected: chunk.len(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(WipeError::WriteError {
                    pass,
                    offset,
                    source,
                })
            }
        }
    }
}

/// Fill `chunk` completely; hitting the end of the device early is an error.
fn read_chunk(
    channel: &mut dyn RawDeviceChannel,
    chunk: &mut [u8],
    pass: usize,
    offset: u64,
) -> WipeErrorResult<()> {
    let mut filled = 0;
    while filled < chunk.len() {
        match channel.read(&mut chunk[filled..]) {
            Ok(0) => {
                return Err(WipeError::VerifyReadFailed {
                    pass,
                    offset: offset + filled as u64,
                    source: io::Error::from(io::ErrorKind::UnexpectedEof),
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(WipeError::VerifyReadFailed {
                    pass,
                    offset: offset + filled as u64,
                    source,
                })
            }
        }
    }
    Ok(())
}
