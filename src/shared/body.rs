//! Streaming text accumulation with a character cap.
//!
//! Response bodies arrive as byte chunks whose boundaries can split multi-byte
//! sequences. [`CappedText`] feeds them through an `encoding_rs` decoder and
//! stops accepting input once the cap is exceeded.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

/// Text decoded from byte chunks, limited to `limit` characters.
pub struct CappedText {
    decoder: Decoder,
    text: String,
    chars: usize,
    limit: usize,
    truncated: bool,
}

impl CappedText {
    /// UTF-8 decoding, the default for markup without a declared charset.
    pub fn new(limit: usize) -> Self {
        Self::with_encoding(UTF_8, limit)
    }

    pub fn with_encoding(encoding: &'static Encoding, limit: usize) -> Self {
        Self {
            decoder: encoding.new_decoder(),
            text: String::new(),
            chars: 0,
            limit,
            truncated: false,
        }
    }

    /// Picks the decoder from a `Content-Type` header's `charset` parameter,
    /// falling back to UTF-8 when it is missing or unknown.
    pub fn for_content_type(content_type: Option<&str>, limit: usize) -> Self {
        let encoding = content_type
            .and_then(charset_param)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        Self::with_encoding(encoding, limit)
    }

    /// Feeds one chunk. Returns `true` once the cap has been exceeded, after
    /// which further input is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if !self.truncated {
            self.decode(chunk, false);
        }
        self.truncated
    }

    /// Returns the accumulated text. A dangling partial sequence is flushed as
    /// a replacement character.
    pub fn finish(mut self) -> String {
        if !self.truncated {
            self.decode(&[], true);
        }
        self.text
    }

    fn decode(&mut self, mut src: &[u8], last: bool) {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len() * 3 + 4);
        let mut out = String::with_capacity(capacity);

        loop {
            let (result, read, _) = self.decoder.decode_to_string(src, &mut out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => out.reserve(capacity.max(16)),
            }
        }

        self.append(&out);
    }

    fn append(&mut self, s: &str) {
        if self.truncated || s.is_empty() {
            return;
        }

        let remaining = self.limit - self.chars;
        let count = s.chars().count();
        if count <= remaining {
            self.text.push_str(s);
            self.chars += count;
        } else {
            let cut = s
                .char_indices()
                .nth(remaining)
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            self.text.push_str(&s[..cut]);
            self.chars = self.limit;
            self.truncated = true;
        }
    }
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}
