//! Parser for timestamped LRC lyric text, including the enhanced per-word
//! variant (`<mm:ss.xx>word` tags embedded in a line).

use std::time::Duration;

/// Word-level timing parsed from an inline tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTiming {
    pub word: String,
    pub time: Duration,
}

/// A single line of lyrics with timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub time: Duration,
    pub text: String,
    /// Word-level timing for enhanced LRC
    pub words: Option<Vec<WordTiming>>,
}

/// Parse an LRC string into timed lines, sorted ascending by time.
///
/// Lines without a leading `[mm:ss]` or `[mm:ss.xx]` timestamp are dropped,
/// as are lines whose text is empty after trimming. Malformed timestamps skip
/// the line rather than failing the whole parse. The sort is stable, so lines
/// sharing a timestamp keep their encounter order.
#[must_use]
pub fn parse(input: &str) -> Vec<LyricLine> {
    let mut lines: Vec<LyricLine> = input.lines().filter_map(parse_line).collect();
    lines.sort_by_key(|l| l.time);
    lines
}

fn parse_line(raw: &str) -> Option<LyricLine> {
    let rest = raw.trim_start().strip_prefix('[')?;
    let close = rest.find(']')?;
    let time = parse_timestamp(&rest[..close])?;

    let text = rest[close + 1..].trim();
    if text.is_empty() {
        return None;
    }

    // A line gets word timing only when at least one word tag differs from the
    // line's own timestamp. A lone tag that merely repeats the line time is
    // not word sync.
    let words = parse_word_timings(text);
    if !words.is_empty() && words.iter().any(|w| w.time != time) {
        let joined = words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        return Some(LyricLine {
            time,
            text: joined,
            words: Some(words),
        });
    }

    Some(LyricLine {
        time,
        text: text.to_string(),
        words: None,
    })
}

/// Parse a timestamp of the form `mm:ss` or `mm:ss.xx`
fn parse_timestamp(stamp: &str) -> Option<Duration> {
    let (minutes, rest) = stamp.split_once(':')?;
    let (seconds, fraction) = match rest.split_once('.') {
        Some((secs, frac)) => (secs, Some(frac)),
        None => (rest, None),
    };

    let minutes = parse_digits(minutes)?;
    let seconds = parse_digits(seconds)?;
    let centis = match fraction {
        Some(frac) => parse_centiseconds(frac)?,
        None => 0,
    };

    // Checked arithmetic: the numbers come from untrusted lyric text, and an
    // absurd value skips the line like any other malformed timestamp
    let millis = centis.checked_mul(10).and_then(|frac_ms| {
        minutes
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1000)?
            .checked_add(frac_ms)
    })?;

    Some(Duration::from_millis(millis))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fractions are hundredths; a single digit is a truncated value with the
/// trailing zero dropped ("5" means 50 centiseconds).
fn parse_centiseconds(frac: &str) -> Option<u64> {
    if frac.len() == 1 {
        return parse_digits(frac).map(|d| d * 10);
    }
    parse_digits(frac)
}

/// Extract `<mm:ss.xx>word` tags from a line's text.
///
/// Word tags always carry a fraction; anything between tags that is not
/// immediately after one is discarded.
fn parse_word_timings(text: &str) -> Vec<WordTiming> {
    let mut words = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let Some(end) = rest.find('>') else { break };
        let stamp = &rest[..end];
        rest = &rest[end + 1..];

        if !stamp.contains('.') {
            continue;
        }
        let Some(time) = parse_timestamp(stamp) else {
            continue;
        };

        let word_end = rest.find('<').unwrap_or(rest.len());
        let word = rest[..word_end].trim();
        rest = &rest[word_end..];

        if !word.is_empty() {
            words.push(WordTiming {
                word: word.to_string(),
                time,
            });
        }
    }

    words
}
