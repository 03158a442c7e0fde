//! Small string helpers shared by the normalizers.

use convert_case::{Case, Casing};

/// Lowercase slug: runs of non-alphanumeric characters collapse to a single
/// `-`, with no leading or trailing separator.
///
/// `"Bolt pistol"` → `"bolt-pistol"`, `"Combi-aim (Sustained Hits 1)"` →
/// `"combi-aim-sustained-hits-1"`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Lowercase and collapse internal whitespace to single spaces.
pub fn normalize_name(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// `"blood-angels"` → `"Blood Angels"`. Only hyphens split words.
pub fn title_case_slug(slug: &str) -> String {
    slug.from_case(Case::Kebab).to_case(Case::Title)
}

/// Numeric value of an upstream `line` column, for ordering.
pub fn line_number(line: &str) -> u32 {
    line.trim().parse().unwrap_or(u32::MAX)
}

/// Upstream booleans are spelled `true`/`false` (occasionally `1`/`0`).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
