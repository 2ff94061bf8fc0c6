//! Track-title cleanup before lyric search.
//!
//! Titles scraped from file names or video uploads carry marketing noise
//! ("Official Video", "(HD)", "\[4K\]") that ruins fuzzy search. This strips
//! bracketed noise spans and known stop-word tokens.

/// Noise markers that disqualify an entire bracketed/parenthesized span
const NOISE_WORDS: &[&str] = &[
    "official", "lyric", "lyrics", "video", "audio", "mv", "music", "hd", "4k",
];

/// Tokens removed outright after span stripping
const STOP_WORDS: &[&str] = &[
    "official",
    "video",
    "audio",
    "lyrics",
    "lyric",
    "hd",
    "4k",
    "music",
    "mv",
    "visualizer",
    "remix",
    "cover",
    "live",
    "acoustic",
    "version",
    "edit",
    "extended",
];

/// Normalize a track title for search: lower-case, drop noisy bracketed
/// spans, drop stop-word tokens, and collapse whitespace.
#[must_use]
pub fn normalize(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let lowered = title.to_lowercase();
    let stripped = strip_noise_spans(&lowered, '[', ']');
    let stripped = strip_noise_spans(&stripped, '(', ')');

    stripped
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove `open...close` spans whose content contains any noise word.
/// Input is already lower-cased, so a plain substring check suffices.
fn strip_noise_spans(input: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(open) {
        let Some(len) = rest[start + 1..].find(close) else {
            break;
        };
        let content = &rest[start + 1..start + 1 + len];
        out.push_str(&rest[..start]);
        if !NOISE_WORDS.iter().any(|w| content.contains(w)) {
            out.push_str(&rest[start..=start + 1 + len]);
        }
        rest = &rest[start + len + 2..];
    }

    out.push_str(rest);
    out
}
