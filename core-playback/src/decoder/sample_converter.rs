//! # Sample Format Converter
//!
//! Normalizes Symphonia's decoded buffers to interleaved `f32`.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;
use tracing::warn;

/// Sample converter that normalizes audio to f32 interleaved format.
///
/// Symphonia outputs planar audio in the codec's native sample type (i16,
/// i24, f32, ...). The engine stores every clip as interleaved f32 in
/// `[-1.0, 1.0]` (LRLR... for stereo).
pub struct SampleConverter;

impl SampleConverter {
    /// Append the samples of `buffer` to `out`, interleaved and converted to f32.
    pub fn append_interleaved(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::F32(buf) => Self::interleave_f32(&**buf, out),
            AudioBufferRef::F64(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::S32(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::S24(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::S16(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::S8(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::U32(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::U24(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::U16(buf) => Self::interleave(&**buf, out),
            AudioBufferRef::U8(buf) => Self::interleave(&**buf, out),
        }
    }

    fn interleave_f32(buf: &AudioBuffer<f32>, out: &mut Vec<f32>) {
        let channels = buf.spec().channels.count();
        out.reserve(buf.frames() * channels);

        for frame in 0..buf.frames() {
            for channel in 0..channels {
                out.push(buf.chan(channel)[frame]);
            }
        }
    }

    /// Planar (LLLL...RRRR...) to interleaved (LRLR...), converting each sample.
    fn interleave<T>(buf: &AudioBuffer<T>, out: &mut Vec<f32>)
    where
        T: Sample + IntoSample<f32>,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        out.reserve(frames * channels);

        for frame in 0..frames {
            for channel in 0..channels {
                out.push(buf.chan(channel)[frame].into_sample());
            }
        }
    }

    /// Clamp samples to `[-1.0, 1.0]`, returning how many were out of range.
    pub fn clamp_samples(samples: &mut [f32]) -> usize {
        let mut clipped = 0;
        for sample in samples.iter_mut() {
            if !(-1.0..=1.0).contains(sample) {
                clipped += 1;
                *sample = sample.clamp(-1.0, 1.0);
            }
        }

        if clipped > 0 {
            warn!(
                clipped,
                percent = (clipped as f64 / samples.len() as f64) * 100.0,
                "Clamped out-of-range samples"
            );
        }

        clipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AsAudioBufferRef, Channels, SignalSpec};

    #[test]
    fn test_interleave_stereo_i16() {
        let spec = SignalSpec::new(8000, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buf = AudioBuffer::<i16>::new(2, spec);
        buf.render_reserved(Some(2));
        buf.chan_mut(0).copy_from_slice(&[i16::MAX, 0]);
        buf.chan_mut(1).copy_from_slice(&[0, i16::MIN]);

        let mut out = Vec::new();
        SampleConverter::append_interleaved(&buf.as_audio_buffer_ref(), &mut out);

        assert_eq!(out.len(), 4);
        assert!((out[0] - 1.0).abs() < 1e-3);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 0.0);
        assert!((out[3] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_clamp_samples() {
        let mut samples = vec![0.0, 1.5, -1.5, 0.5, -0.5];
        let clipped = SampleConverter::clamp_samples(&mut samples);

        assert_eq!(clipped, 2);
        assert_eq!(samples, vec![0.0, 1.0, -1.0, 0.5, -0.5]);
    }
}
