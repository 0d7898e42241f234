mod audio_transcoder;
mod whisper_api_engine;

pub use audio_transcoder::{probe_duration, transcode_to_wav_16k_mono};
pub use whisper_api_engine::WhisperApiEngine;
