//! PCM feed over the USB CDC link
//!
//! The host streams raw audio to the board over the virtual serial port:
//! signed 16-bit little-endian stereo at 46 875 Hz, in chunks of
//! [`CHUNK_SIZE`] bytes sent in real time. Chunk `n` is due
//! [`chunk_deadline(n)`](chunk_deadline) after the start of playback.
//!
//! [`Feeder`] does the sending side over any [`embedded_io::Write`]:
//!
//! ```
//! use feed_bsp::stream::{Elapsed, Feeder, CHUNK_SIZE};
//!
//! let mut out = [0u8; 2 * CHUNK_SIZE];
//! let mut pcm = [0x10u8; 2 * CHUNK_SIZE];
//!
//! let mut feeder = Feeder::new(&mut out[..]).with_total(pcm.len());
//! feeder.set_gain(0.5);
//! feeder.feed(&mut pcm).unwrap();
//!
//! assert_eq!(feeder.chunks_sent(), 2);
//! assert_eq!(feeder.progress(), 1.0);
//! assert_eq!(Elapsed(feeder.position()).to_string(), "00:00");
//! ```

use core::fmt;

use embedded_io::Write;
use fugit::{HertzU32, MicrosDurationU32, MicrosDurationU64};

/// Frames per second.
pub const SAMPLE_RATE: HertzU32 = HertzU32::from_raw(46_875);

/// Interleaved channels per frame (left, right).
pub const CHANNELS: usize = 2;

/// Bytes per sample, `s16le`.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes per frame.
pub const BYTES_PER_FRAME: usize = CHANNELS * BYTES_PER_SAMPLE;

/// Bytes per write.
pub const CHUNK_SIZE: usize = 4096;

/// Frames per full chunk.
pub const FRAMES_PER_CHUNK: usize = CHUNK_SIZE / BYTES_PER_FRAME;

/// Playing time of a full chunk, rounded down.
pub const CHUNK_DURATION: MicrosDurationU32 =
    MicrosDurationU32::from_ticks(duration_of(CHUNK_SIZE).ticks() as u32);

/// Baud rate the host opens the serial port with.
///
/// CDC ignores it; data moves at USB full speed.
pub const SERIAL_BAUD: u32 = 115_200;

/// Largest volume gain. `1.0` plays samples unchanged.
pub const MAX_GAIN: f32 = 2.0;

/// Whole frames in `bytes` bytes of PCM.
#[inline]
pub const fn frames_in(bytes: usize) -> usize {
    bytes / BYTES_PER_FRAME
}

/// Playing time of `bytes` bytes of PCM, rounded down to the microsecond.
pub const fn duration_of(bytes: usize) -> MicrosDurationU64 {
    let frames = frames_in(bytes) as u64;
    MicrosDurationU64::from_ticks(frames * 1_000_000 / SAMPLE_RATE.raw() as u64)
}

/// Time after the start of playback at which chunk `index` is due.
///
/// Computed from the frame count so that rounding does not accumulate.
pub const fn chunk_deadline(index: u32) -> MicrosDurationU64 {
    let frames = index as u64 * FRAMES_PER_CHUNK as u64;
    MicrosDurationU64::from_ticks(frames * 1_000_000 / SAMPLE_RATE.raw() as u64)
}

/// Scales every whole sample of `pcm` by `gain`, in place.
///
/// `gain` is clamped to `0.0..=MAX_GAIN`; results saturate at the `i16`
/// range. A trailing odd byte is left untouched.
pub fn apply_volume(pcm: &mut [u8], gain: f32) {
    let gain = clamp_gain(gain);
    if gain == 1.0 {
        return;
    }
    for sample in pcm.chunks_exact_mut(BYTES_PER_SAMPLE) {
        let value = i16::from_le_bytes([sample[0], sample[1]]);
        // float to int casts saturate
        let scaled = (value as f32 * gain) as i16;
        sample.copy_from_slice(&scaled.to_le_bytes());
    }
}

fn clamp_gain(gain: f32) -> f32 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, MAX_GAIN)
    }
}

/// Sends PCM chunks over a writer and keeps track of the playback position.
pub struct Feeder<W> {
    writer: W,
    gain: f32,
    written: usize,
    chunks: u32,
    total: Option<usize>,
}

impl<W: Write> Feeder<W> {
    /// Feeder at unity gain, at the start of a stream of unknown length.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            gain: 1.0,
            written: 0,
            chunks: 0,
            total: None,
        }
    }

    /// Sets the stream length in bytes, used by [`Feeder::progress`].
    pub fn with_total(mut self, total_bytes: usize) -> Self {
        self.total = Some(total_bytes);
        self
    }

    /// Current volume gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Changes the volume gain for the following chunks, clamped to `0.0..=MAX_GAIN`.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = clamp_gain(gain);
    }

    /// Scales and sends one chunk.
    ///
    /// Chunks longer than [`CHUNK_SIZE`] are sent whole but still count as
    /// one; use [`Feeder::feed`] to split a buffer. If the writer fails
    /// partway, the bytes it accepted still count towards
    /// [`Feeder::bytes_sent`] but the chunk does not.
    pub fn feed_chunk(&mut self, chunk: &mut [u8]) -> Result<(), W::Error> {
        apply_volume(chunk, self.gain);
        let mut rest: &[u8] = chunk;
        while !rest.is_empty() {
            match self.writer.write(rest) {
                Ok(0) => panic!("write() returned Ok(0)"),
                Ok(n) => {
                    self.written += n;
                    rest = &rest[n..];
                }
                Err(e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "PCM write failed at chunk {} ({} bytes sent)",
                        self.chunks,
                        self.written
                    );
                    return Err(e);
                }
            }
        }
        self.chunks += 1;
        #[cfg(feature = "defmt")]
        defmt::trace!("chunk {} sent, {} bytes", self.chunks, chunk.len());
        Ok(())
    }

    /// Scales and sends `pcm` in [`CHUNK_SIZE`] pieces, then flushes.
    ///
    /// Pieces are sent back to back; pacing them against
    /// [`Feeder::next_deadline`] is up to the caller.
    pub fn feed(&mut self, pcm: &mut [u8]) -> Result<(), W::Error> {
        for chunk in pcm.chunks_mut(CHUNK_SIZE) {
            self.feed_chunk(chunk)?;
        }
        self.writer.flush()
    }

    /// When the next chunk is due, relative to the start of playback.
    pub fn next_deadline(&self) -> MicrosDurationU64 {
        chunk_deadline(self.chunks)
    }

    /// Chunks sent so far.
    pub fn chunks_sent(&self) -> u32 {
        self.chunks
    }

    /// Bytes sent so far.
    pub fn bytes_sent(&self) -> usize {
        self.written
    }

    /// Playing time of everything sent so far.
    pub fn position(&self) -> MicrosDurationU64 {
        duration_of(self.written)
    }

    /// Playing time of the whole stream, if its length is known.
    pub fn total_duration(&self) -> Option<MicrosDurationU64> {
        self.total.map(duration_of)
    }

    /// Fraction of the stream sent, `0.0..=1.0`.
    ///
    /// `0.0` when the length is unknown or zero.
    pub fn progress(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => (self.written as f32 / total as f32).min(1.0),
            _ => 0.0,
        }
    }

    /// Rewinds the position for a new stream, keeping the writer and gain.
    pub fn restart(&mut self, total_bytes: Option<usize>) {
        self.written = 0;
        self.chunks = 0;
        self.total = total_bytes;
    }

    /// Releases the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// A playback position, displayed as `mm:ss`, or `hh:mm:ss` from one hour on.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elapsed(pub MicrosDurationU64);

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.to_secs();
        let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
        if hours > 0 {
            write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            write!(f, "{:02}:{:02}", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embedded_io::{ErrorKind, ErrorType};
    use std::{string::ToString, vec, vec::Vec};

    type Micros = MicrosDurationU64;

    struct Sink {
        data: Vec<u8>,
        capacity: usize,
        flushed: bool,
    }

    impl Sink {
        fn new(capacity: usize) -> Self {
            Sink {
                data: Vec::new(),
                capacity,
                flushed: false,
            }
        }
    }

    impl ErrorType for Sink {
        type Error = ErrorKind;
    }

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let room = self.capacity - self.data.len();
            if room == 0 {
                return Err(ErrorKind::OutOfMemory);
            }
            let n = buf.len().min(room);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushed = true;
            Ok(())
        }
    }

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn format_constants() {
        assert_eq!(BYTES_PER_FRAME, 4);
        assert_eq!(FRAMES_PER_CHUNK, 1024);
        assert_eq!(CHUNK_DURATION.ticks(), 21_845);
    }

    #[test]
    fn durations() {
        assert_eq!(frames_in(4099), 1024);
        assert_eq!(duration_of(46_875 * 4), Micros::secs(1));
        assert_eq!(duration_of(3), Micros::micros(0));
        assert_eq!(chunk_deadline(0), Micros::micros(0));
        assert_eq!(chunk_deadline(1).ticks(), 21_845);
        // 375 chunks play for exactly 8.192 s
        assert_eq!(chunk_deadline(375), Micros::micros(8_192_000));
    }

    #[test]
    fn volume_scales_and_saturates() {
        let mut buf = pcm(&[1000, -1000, 20_000, -20_000, i16::MAX, i16::MIN]);
        apply_volume(&mut buf, 2.0);
        assert_eq!(
            buf,
            pcm(&[2000, -2000, i16::MAX, i16::MIN, i16::MAX, i16::MIN])
        );

        let mut buf = pcm(&[1001, -1001]);
        apply_volume(&mut buf, 0.5);
        assert_eq!(buf, pcm(&[500, -500]));
    }

    #[test]
    fn volume_gain_is_clamped() {
        let mut buf = pcm(&[100]);
        apply_volume(&mut buf, 10.0);
        assert_eq!(buf, pcm(&[200]));

        let mut buf = pcm(&[100]);
        apply_volume(&mut buf, -1.0);
        assert_eq!(buf, pcm(&[0]));

        let mut buf = pcm(&[100]);
        apply_volume(&mut buf, f32::NAN);
        assert_eq!(buf, pcm(&[0]));
    }

    #[test]
    fn volume_leaves_odd_byte() {
        let mut buf = vec![0x10, 0x00, 0x7F];
        apply_volume(&mut buf, 2.0);
        assert_eq!(buf, [0x20u8, 0x00, 0x7F]);
    }

    #[test]
    fn feeder_tracks_position() {
        let mut data = vec![0u8; CHUNK_SIZE * 2 + 400];
        let mut feeder = Feeder::new(Sink::new(usize::MAX)).with_total(data.len() * 2);

        assert_eq!(feeder.next_deadline(), Micros::micros(0));
        feeder.feed(&mut data).unwrap();
        assert_eq!(feeder.chunks_sent(), 3);
        assert_eq!(feeder.bytes_sent(), CHUNK_SIZE * 2 + 400);
        assert_eq!(feeder.next_deadline(), chunk_deadline(3));
        assert_eq!(feeder.position(), duration_of(CHUNK_SIZE * 2 + 400));
        assert_eq!(feeder.progress(), 0.5);
        assert_eq!(
            feeder.total_duration(),
            Some(duration_of((CHUNK_SIZE * 2 + 400) * 2))
        );

        let sink = feeder.into_inner();
        assert!(sink.flushed);
        assert_eq!(sink.data.len(), CHUNK_SIZE * 2 + 400);
    }

    #[test]
    fn feeder_applies_gain() {
        let mut data = pcm(&[300, -300]);
        let mut feeder = Feeder::new(Sink::new(usize::MAX));
        feeder.set_gain(3.0);
        assert_eq!(feeder.gain(), MAX_GAIN);
        feeder.feed_chunk(&mut data).unwrap();
        assert_eq!(feeder.into_inner().data, pcm(&[600, -600]));
    }

    #[test]
    fn feeder_stops_on_error() {
        let mut data = vec![0u8; CHUNK_SIZE * 3];
        let mut feeder = Feeder::new(Sink::new(CHUNK_SIZE + 10));
        assert_eq!(feeder.feed(&mut data), Err(ErrorKind::OutOfMemory));
        assert_eq!(feeder.chunks_sent(), 1);
        assert_eq!(feeder.progress(), 0.0);
        // the 10 bytes of the failed chunk did go out
        assert_eq!(feeder.bytes_sent(), CHUNK_SIZE + 10);
        assert_eq!(feeder.position(), duration_of(CHUNK_SIZE + 10));

        feeder.restart(Some(8));
        assert_eq!(feeder.bytes_sent(), 0);
        assert_eq!(feeder.next_deadline(), Micros::micros(0));
    }

    #[test]
    fn elapsed_display() {
        assert_eq!(Elapsed(Micros::secs(0)).to_string(), "00:00");
        assert_eq!(Elapsed(Micros::secs(65)).to_string(), "01:05");
        assert_eq!(Elapsed(Micros::micros(3_599_999_999)).to_string(), "59:59");
        assert_eq!(Elapsed(Micros::secs(3725)).to_string(), "01:02:05");
        assert_eq!(Elapsed(Micros::secs(36_000)).to_string(), "10:00:00");
    }
}
