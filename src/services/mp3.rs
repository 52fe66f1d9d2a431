use anyhow::Context;
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::{CodecType, CODEC_TYPE_MP1, CODEC_TYPE_MP2, CODEC_TYPE_MP3, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// True when the file's contents probe as MPEG audio, whatever its extension says.
pub fn is_valid_mp3(path: &Path) -> bool {
    match probe_codec(path) {
        Ok(codec) if is_mpeg_audio(codec) => true,
        Ok(codec) => {
            debug!("Rejecting {}: not MPEG audio (codec {:?})", path.display(), codec);
            false
        }
        Err(e) => {
            debug!("Rejecting {}: {:#}", path.display(), e);
            false
        }
    }
}

fn is_mpeg_audio(codec: CodecType) -> bool {
    codec == CODEC_TYPE_MP3 || codec == CODEC_TYPE_MP2 || codec == CODEC_TYPE_MP1
}

fn probe_codec(path: &Path) -> Result<CodecType, anyhow::Error> {
    let file = File::open(path).context("Failed to open file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    Ok(track.codec_params.codec)
}

/// Silent MPEG-1 Layer III frames (128 kbps, 44.1 kHz, stereo) for fixtures.
#[cfg(test)]
pub(crate) fn sample_mp3_bytes() -> Vec<u8> {
    const FRAME_LEN: usize = 417;
    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

    let mut bytes = Vec::with_capacity(FRAME_LEN * 32);
    for _ in 0..32 {
        bytes.extend_from_slice(&HEADER);
        bytes.resize(bytes.len() + FRAME_LEN - HEADER.len(), 0);
    }
    bytes
}
