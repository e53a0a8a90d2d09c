use std::collections::BTreeSet;

/// Largest span a single `a-b` token may expand to. Longer spans are skipped.
pub const MAX_RANGE_SPAN: u32 = 100_000;

/// Most pages one `decode` call will return. Tokens that would grow the set
/// past this are skipped.
pub const MAX_DECODED_PAGES: usize = 100_000;

/// Compress a set of page numbers into a range string like "1-3,5,7-9".
///
/// Pages are emitted in ascending order and every maximal run of consecutive
/// numbers collapses into `first-last`. An empty set encodes to `""`.
pub fn encode<'a, I>(pages: I) -> String
where
    I: IntoIterator<Item = &'a u32>,
{
    let sorted: BTreeSet<u32> = pages.into_iter().copied().collect();
    let mut runs: Vec<String> = Vec::new();
    let mut iter = sorted.into_iter();

    let Some(first) = iter.next() else {
        return String::new();
    };
    let (mut start, mut prev) = (first, first);

    for page in iter {
        if prev.checked_add(1) == Some(page) {
            prev = page;
            continue;
        }
        runs.push(format_run(start, prev));
        start = page;
        prev = page;
    }
    runs.push(format_run(start, prev));

    runs.join(",")
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Parse a range string like "1,3,5-7" into a set of page numbers.
///
/// Parsing never fails: tokens that are empty, non-numeric or half-open
/// ("5-") contribute nothing. Reversed spans ("7-5") are normalized.
///
/// The result never holds more than [`MAX_DECODED_PAGES`] pages; a token
/// that could push it past that is skipped whole.
pub fn decode(text: &str) -> BTreeSet<u32> {
    let mut pages = BTreeSet::new();

    for token in text.split(',').map(str::trim) {
        if let Some((lo, hi)) = token.split_once('-') {
            let (Some(lo), Some(hi)) = (parse_page(lo), parse_page(hi)) else {
                continue;
            };
            let (start, end) = (lo.min(hi), lo.max(hi));
            if end - start >= MAX_RANGE_SPAN {
                continue;
            }
            if pages.len() + (end - start) as usize >= MAX_DECODED_PAGES {
                continue;
            }
            pages.extend(start..=end);
        } else if let Some(page) = parse_page(token) {
            if pages.len() < MAX_DECODED_PAGES || pages.contains(&page) {
                pages.insert(page);
            }
        }
    }

    pages
}

fn parse_page(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pages: &[u32]) -> BTreeSet<u32> {
        pages.iter().copied().collect()
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&set(&[])), "");
    }

    #[test]
    fn test_encode_runs() {
        assert_eq!(encode(&set(&[1, 2, 3, 5, 7, 8, 9])), "1-3,5,7-9");
    }

    #[test]
    fn test_encode_unsorted_input() {
        assert_eq!(encode(&[5, 1, 3, 2, 7, 3]), "1-3,5,7");
    }

    #[test]
    fn test_encode_single_page() {
        assert_eq!(encode(&[4]), "4");
    }

    #[test]
    fn test_encode_near_max() {
        assert_eq!(encode(&[u32::MAX - 1, u32::MAX]), format!("{}-{}", u32::MAX - 1, u32::MAX));
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").is_empty());
        assert!(decode(" , ,").is_empty());
    }

    #[test]
    fn test_decode_mixed() {
        assert_eq!(decode("1,3,5-7"), set(&[1, 3, 5, 6, 7]));
    }

    #[test]
    fn test_decode_reverse_range() {
        assert_eq!(decode("7-5"), set(&[5, 6, 7]));
    }

    #[test]
    fn test_decode_skips_bad_tokens() {
        assert_eq!(decode("1,,3,abc,5-"), set(&[1, 3]));
        assert_eq!(decode("-4,x-2,2-y"), set(&[]));
    }

    #[test]
    fn test_decode_whitespace() {
        assert_eq!(decode(" 2 , 4 - 6 "), set(&[2, 4, 5, 6]));
    }

    #[test]
    fn test_decode_dedups_overlap() {
        assert_eq!(decode("1-4,3-5,4"), set(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_decode_keeps_zero() {
        assert_eq!(decode("0,2"), set(&[0, 2]));
    }

    #[test]
    fn test_decode_skips_huge_span() {
        assert_eq!(decode("1-4000000000,9"), set(&[9]));
        assert_eq!(decode("99999999999"), set(&[]));
    }

    #[test]
    fn test_decode_caps_total_pages() {
        let text: Vec<String> = (0..300u32)
            .map(|i| format!("{}-{}", i * 100_000 + 1, i * 100_000 + 99_999))
            .collect();
        let pages = decode(&text.join(","));
        assert_eq!(pages.len(), 99_999);
        assert_eq!(pages.first(), Some(&1));
        assert_eq!(pages.last(), Some(&99_999));
    }

    #[test]
    fn test_decode_cap_keeps_known_single_pages() {
        let pages = decode("1-99999,100000,100001,5-10,50");
        assert_eq!(pages.len(), MAX_DECODED_PAGES);
        assert!(pages.contains(&100_000));
        assert!(!pages.contains(&100_001));
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            set(&[]),
            set(&[1]),
            set(&[1, 2, 3, 5, 7, 8, 9]),
            set(&[2, 4, 6, 8]),
            set(&[10, 11, 12, 13, 40, 100, 101]),
        ];
        for s in samples {
            assert_eq!(decode(&encode(&s)), s);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for text in ["1,2,3", "7-5,1", "3,1,,2,abc", "10-12,11,4-", ""] {
            let once = encode(&decode(text));
            let twice = encode(&decode(&once));
            assert_eq!(once, twice);
        }
        assert_eq!(encode(&decode("1,2,3")), "1-3");
    }
}
