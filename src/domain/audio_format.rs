/// Container format hint derived from the transport's declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Opus,
    Ogg,
    M4a,
    Wav,
    Webm,
    Flac,
    Mp3,
}

impl AudioFormat {
    /// Map a `Content-Type` header value to a format hint. The whole header
    /// is matched so `audio/ogg; codecs=opus` resolves to Opus. Unknown or
    /// missing types fall back to MP3, which the transcription engine probes
    /// anyway.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();

        if ct.contains("opus") {
            AudioFormat::Opus
        } else if ct.contains("ogg") {
            AudioFormat::Ogg
        } else if ct.contains("m4a") || ct.contains("mp4") || ct.contains("aac") {
            AudioFormat::M4a
        } else if ct.contains("wav") {
            AudioFormat::Wav
        } else if ct.contains("webm") {
            AudioFormat::Webm
        } else if ct.contains("flac") {
            AudioFormat::Flac
        } else {
            AudioFormat::Mp3
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Opus => "opus",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            AudioFormat::Opus => "audio/opus",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}
