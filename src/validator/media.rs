//! Quality-weighted content negotiation between an `Accept` header and a list
//! of declared media types.

use crate::request::media_type_essence;
use smallvec::SmallVec;

/// Accept headers rarely list more than a handful of ranges.
const INLINE_RANGES: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    pub quality: f32,
}

impl MediaRange {
    fn matches(&self, kind: &str, subtype: &str) -> bool {
        (self.kind == "*" || self.kind == kind) && (self.subtype == "*" || self.subtype == subtype)
    }

    /// Exact ranges beat `type/*`, which beats `*/*`.
    fn specificity(&self) -> u8 {
        u8::from(self.kind != "*") + u8::from(self.subtype != "*")
    }
}

/// Parse an `Accept` header. Malformed ranges are skipped; a missing or
/// unparseable `q` counts as 1.
pub fn parse_accept(header: &str) -> SmallVec<[MediaRange; INLINE_RANGES]> {
    header
        .split(',')
        .filter_map(|part| {
            let mut params = part.split(';');
            let essence = params.next()?.trim().to_ascii_lowercase();
            let (kind, subtype) = essence.split_once('/')?;
            if kind.is_empty() || subtype.is_empty() {
                return None;
            }
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .map_or(1.0, |q| q.clamp(0.0, 1.0));
            Some(MediaRange {
                kind: kind.to_string(),
                subtype: subtype.to_string(),
                quality,
            })
        })
        .collect()
}

/// Pick the declared media type the client prefers most.
///
/// Each declared type takes the quality of the most specific range that
/// matches it. Types at `q=0` are never acceptable. Ties keep declaration
/// order. Parameters on a declared type are ignored when matching, and the
/// declared string is returned as written.
pub fn negotiate<'a>(accept: &str, declared: &'a [String]) -> Option<&'a str> {
    let ranges = parse_accept(accept);
    let mut best: Option<(&'a str, f32)> = None;
    for offered in declared {
        let essence = media_type_essence(offered);
        let Some((kind, subtype)) = essence.split_once('/') else {
            continue;
        };
        let quality = ranges
            .iter()
            .filter(|r| r.matches(kind, subtype))
            .max_by_key(|r| r.specificity())
            .map_or(0.0, |r| r.quality);
        if quality > 0.0 && best.map_or(true, |(_, q)| quality > q) {
            best = Some((offered.as_str(), quality));
        }
    }
    best.map(|(media_type, _)| media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn parses_ranges_and_weights() {
        let ranges = parse_accept("text/html, application/json;q=0.5, */*;q=0.1, bogus");
        assert_eq!(ranges.len(), 3);
        assert_eq!(ranges[1].subtype, "json");
        assert!((ranges[1].quality - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn highest_quality_wins() {
        let offered = declared(&["application/xml", "application/json"]);
        assert_eq!(
            negotiate("application/xml;q=0.4, application/json", &offered),
            Some("application/json")
        );
        assert_eq!(negotiate("*/*", &offered), Some("application/xml"));
    }

    #[test]
    fn specific_range_overrides_wildcard() {
        let offered = declared(&["application/json", "text/plain"]);
        assert_eq!(
            negotiate("application/json;q=0, */*", &offered),
            Some("text/plain")
        );
        assert_eq!(negotiate("application/*", &offered), Some("application/json"));
    }

    #[test]
    fn declared_parameters_do_not_block_a_match() {
        let offered = declared(&["application/json; charset=utf-8", "Text/Plain"]);
        assert_eq!(
            negotiate("application/json", &offered),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(negotiate("text/plain", &offered), Some("Text/Plain"));
    }

    #[test]
    fn nothing_acceptable() {
        let offered = declared(&["application/json"]);
        assert_eq!(negotiate("application/xml", &offered), None);
        assert_eq!(negotiate("", &offered), None);
    }
}
