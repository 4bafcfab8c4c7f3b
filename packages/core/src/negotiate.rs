//! HTTP content negotiation over media types.
//!
//! The same algorithm serves both directions: `Accept` against the
//! registered serializers on reads, and `Content-Type` against the
//! registered parsers on writes. Only the registry differs.

/// One entry of a parsed `Accept`/`Content-Type` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    /// Lowercased primary type, possibly `*`.
    pub main: String,
    /// Lowercased subtype, possibly `*`.
    pub sub: String,
    /// Quality value in `[0.0, 1.0]`.
    pub q: f32,
    /// Number of non-`q` parameters.
    params: usize,
    /// Position in the original header, used as the final tie-breaker.
    index: usize,
}

impl MediaRange {
    /// The `type/subtype` string without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn is_wildcard(&self) -> bool {
        self.main == "*" || self.sub == "*"
    }

    fn specificity(&self) -> u8 {
        match (self.main.as_str(), self.sub.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ if self.params > 0 => 3,
            _ => 2,
        }
    }

    fn parse(entry: &str, index: usize) -> Option<Self> {
        let mut parts = entry.split(';');
        let essence = parts.next()?.trim();
        let (main, sub) = essence.split_once('/')?;
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() || (main == "*" && sub != "*") {
            return None;
        }

        let mut q = 1.0_f32;
        let mut params = 0;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if key.trim().eq_ignore_ascii_case("q") {
                q = value.trim().parse().ok().filter(|q: &f32| (0.0..=1.0).contains(q))?;
            } else {
                params += 1;
            }
        }

        Some(Self {
            main: main.to_ascii_lowercase(),
            sub: sub.to_ascii_lowercase(),
            q,
            params,
            index,
        })
    }
}

/// Parse a header value into media ranges, best first.
///
/// Ranking: higher `q` first, then more specific ranges, then header order.
/// Entries with `q=0` and malformed entries are dropped.
pub fn parse_media_ranges(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .enumerate()
        .filter_map(|(i, entry)| MediaRange::parse(entry, i))
        .filter(|r| r.q > 0.0)
        .collect();

    ranges.sort_by(|a, b| {
        b.q.partial_cmp(&a.q)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.specificity().cmp(&a.specificity()))
            .then_with(|| a.index.cmp(&b.index))
    });
    ranges
}

/// Return the best-ranked media type in `header` that is present in
/// `registered`, or `None` when nothing matches.
///
/// Matching is exact on the `type/subtype` essence (case-insensitive);
/// wildcard ranges never select a registered type. An absent or empty
/// header yields `None`.
pub fn negotiate<'a, I>(header: Option<&str>, registered: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let header = header?.trim();
    if header.is_empty() {
        return None;
    }
    let registered = registered.into_iter();

    parse_media_ranges(header)
        .into_iter()
        .filter(|range| !range.is_wildcard())
        .map(|range| range.essence())
        .find(|essence| {
            registered
                .clone()
                .any(|known| known.eq_ignore_ascii_case(essence))
        })
}
