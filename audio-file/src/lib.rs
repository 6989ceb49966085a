use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use lifesong_core::{Stereo, StereoBuffer};
use std::{fs, io::BufReader, path::Path};

const BITS_PER_SAMPLE: u16 = 16;

fn parse_wav_stereo(buffer: &[u8]) -> anyhow::Result<StereoBuffer> {
    let mut reader = WavReader::new(BufReader::new(buffer))?;
    let spec = reader.spec();
    let max_value = (1 << (spec.bits_per_sample - 1)) as i64;
    let data_int = reader.samples::<i32>().collect::<Result<Vec<_>, _>>()?;
    let mut out: StereoBuffer = Stereo::default();
    for chunk in data_int.chunks(spec.channels as usize) {
        let left = chunk[0];
        let right = chunk.get(1).cloned().unwrap_or(left);
        out.left.push(left as f32 / max_value as f32);
        out.right.push(right as f32 / max_value as f32);
    }
    Ok(out)
}

/// Mono files are read with the same signal in both channels.
pub fn read_wav_stereo(path: impl AsRef<Path>) -> anyhow::Result<StereoBuffer> {
    let raw = fs::read(path)?;
    parse_wav_stereo(&raw)
}

/// Writes 16-bit PCM. Samples outside -1..=1 are clipped.
pub fn write_wav_stereo(
    path: impl AsRef<Path>,
    buffer: &StereoBuffer,
    sample_rate_hz: u32,
) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: sample_rate_hz,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec)?;
    let max_value = i16::MAX as f32;
    for (&left, &right) in buffer.left.iter().zip(buffer.right.iter()) {
        writer.write_sample((left.clamp(-1.0, 1.0) * max_value) as i16)?;
        writer.write_sample((right.clamp(-1.0, 1.0) * max_value) as i16)?;
    }
    writer.finalize()?;
    log::info!("wrote {} frames to {}", buffer.len(), path.display());
    Ok(())
}
