//! Hierarchical channel-name pattern matching.
//!
//! Channel names are `/`-separated, case-sensitive paths (e.g.
//! `/swim/sfdps/flights`). A subscription pattern may use `*` to match
//! exactly one path segment, or `**` to match any number of segments
//! (including zero).

/// Returns true if `pattern` matches `channel` under the glob rules: `*`
/// matches one segment, `**` matches any depth (zero or more segments).
pub fn pattern_matches(pattern: &str, channel: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let channel_segments: Vec<&str> = channel.split('/').filter(|s| !s.is_empty()).collect();
    matches(&pattern_segments, &channel_segments)
}

fn matches(pattern: &[&str], channel: &[&str]) -> bool {
    match pattern.first() {
        None => channel.is_empty(),
        Some(&"**") => {
            if pattern.len() == 1 {
                return true;
            }
            // Try consuming zero or more channel segments before the rest
            // of the pattern must match.
            for split in 0..=channel.len() {
                if matches(&pattern[1..], &channel[split..]) {
                    return true;
                }
            }
            false
        }
        Some(&"*") => match channel.first() {
            Some(_) => matches(&pattern[1..], &channel[1..]),
            None => false,
        },
        Some(seg) => match channel.first() {
            Some(c) if c == seg => matches(&pattern[1..], &channel[1..]),
            _ => false,
        },
    }
}
