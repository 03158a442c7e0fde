//! Pipe-delimited table parser for the upstream rules export.
//!
//! Each upstream table is a UTF-8 file with an optional BOM, `\r\n` or `\n`
//! row endings, `|` between cells, and a header row. Most files end every
//! row with a trailing `|`, which yields one empty extra cell that is
//! dropped here rather than treated as a shape error.
//!
//! Header names are camelCased (`datasheet_id` → `datasheetId`) and every
//! cell is passed through [`sanitize_html`]. No type coercion happens at
//! this stage.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex::{Captures, Regex};

use crate::error::TableError;

/// A parsed row: camelCased header → sanitized cell text.
pub type Row = BTreeMap<String, String>;

/// The upstream tables, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Abilities,
    Datasheets,
    DatasheetsAbilities,
    DatasheetsKeywords,
    DatasheetsModels,
    DatasheetsOptions,
    DatasheetsWargear,
    DatasheetsUnitComposition,
    DatasheetsModelsCost,
    DatasheetsStratagems,
    DatasheetsEnhancements,
    DatasheetsDetachmentAbilities,
    DatasheetsLeader,
    Factions,
    Sources,
    Stratagems,
    Enhancements,
    DetachmentAbilities,
}

impl Table {
    pub const ALL: [Table; 18] = [
        Table::Abilities,
        Table::Datasheets,
        Table::DatasheetsAbilities,
        Table::DatasheetsKeywords,
        Table::DatasheetsModels,
        Table::DatasheetsOptions,
        Table::DatasheetsWargear,
        Table::DatasheetsUnitComposition,
        Table::DatasheetsModelsCost,
        Table::DatasheetsStratagems,
        Table::DatasheetsEnhancements,
        Table::DatasheetsDetachmentAbilities,
        Table::DatasheetsLeader,
        Table::Factions,
        Table::Sources,
        Table::Stratagems,
        Table::Enhancements,
        Table::DetachmentAbilities,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Abilities => "abilities",
            Table::Datasheets => "datasheets",
            Table::DatasheetsAbilities => "datasheets-abilities",
            Table::DatasheetsKeywords => "datasheets-keywords",
            Table::DatasheetsModels => "datasheets-models",
            Table::DatasheetsOptions => "datasheets-options",
            Table::DatasheetsWargear => "datasheets-wargear",
            Table::DatasheetsUnitComposition => "datasheets-unit-composition",
            Table::DatasheetsModelsCost => "datasheets-models-cost",
            Table::DatasheetsStratagems => "datasheets-stratagems",
            Table::DatasheetsEnhancements => "datasheets-enhancements",
            Table::DatasheetsDetachmentAbilities => "datasheets-detachment-abilities",
            Table::DatasheetsLeader => "datasheets-leader",
            Table::Factions => "factions",
            Table::Sources => "sources",
            Table::Stratagems => "stratagems",
            Table::Enhancements => "enhancements",
            Table::DetachmentAbilities => "detachment-abilities",
        }
    }

    /// Match a file stem such as `Datasheets_abilities` or `datasheets-abilities`.
    /// Upstream ships the sources table as `Source`.
    pub fn from_file_stem(stem: &str) -> Option<Table> {
        let normalized = stem.trim().to_lowercase().replace('_', "-");
        if normalized == "source" {
            return Some(Table::Sources);
        }
        Table::ALL.into_iter().find(|t| t.name() == normalized)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse one table file. `file` is only used in error messages.
pub fn parse(raw: &str, file: &str) -> Result<Vec<Row>, TableError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let Some((header_line, data_lines)) = lines.split_first() else {
        return Err(TableError::MissingHeader {
            file: file.to_string(),
        });
    };

    let mut headers: Vec<String> = header_line.split('|').map(camel_case_header).collect();
    if headers.len() > 1 && headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::MissingHeader {
            file: file.to_string(),
        });
    }

    let mut rows = Vec::with_capacity(data_lines.len());
    for (index, line) in data_lines.iter().enumerate() {
        let mut cells: Vec<&str> = line.split('|').collect();
        if cells.len() == headers.len() + 1 && cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        if cells.len() != headers.len() {
            return Err(TableError::ColumnMismatch {
                file: file.to_string(),
                row: index + 2,
                expected: headers.len(),
                found: cells.len(),
            });
        }

        let row: Row = headers
            .iter()
            .zip(cells)
            .map(|(header, cell)| (header.clone(), sanitize_html(cell)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn camel_case_header(raw: &str) -> String {
    raw.trim().to_case(Case::Camel)
}

/// Tags that survive sanitization. Everything else is unwrapped.
const ALLOWED_TAGS: [&str; 13] = [
    "b", "strong", "span", "br", "ul", "ol", "li", "table", "thead", "tbody", "tr", "th", "td",
];

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
/// A tag whose attributes are all `name=value`, or else a stray `<`.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<(/?)([A-Za-z][A-Za-z0-9]*)",
        r#"((?:\s+[A-Za-z_:][-A-Za-z0-9_:.]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))*)"#,
        r"\s*(/?)>|<",
    ))
    .unwrap()
});
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Allow-list HTML sanitizer for cell text.
///
/// Inline formatting (`<b>`, `<span>`, lists, line breaks, tables) is kept
/// with only its `class` attribute. Any other element is unwrapped: the
/// tags go, the text inside stays. `<script>`/`<style>` are dropped along
/// with their content. A `<` that does not open a well-formed tag is
/// escaped as `&lt;`.
pub fn sanitize_html(cell: &str) -> String {
    if !cell.contains('<') {
        return cell.to_string();
    }

    let cell = SCRIPT_RE.replace_all(cell, "");
    let cell = STYLE_RE.replace_all(&cell, "");
    let cell = COMMENT_RE.replace_all(&cell, "");

    TAG_RE
        .replace_all(&cell, |caps: &Captures| {
            let Some(name) = caps.get(2) else {
                return "&lt;".to_string();
            };
            let name = name.as_str().to_ascii_lowercase();
            if !ALLOWED_TAGS.contains(&name.as_str()) {
                return String::new();
            }
            if &caps[1] == "/" {
                return format!("</{}>", name);
            }
            let class = CLASS_RE
                .captures(&caps[3])
                .and_then(|c| c.get(1).or_else(|| c.get(2)))
                .map(|m| format!(" class=\"{}\"", m.as_str()))
                .unwrap_or_default();
            format!("<{}{}{}>", name, class, &caps[4])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bom_crlf_and_trailing_column() {
        let raw = "\u{feff}Name|Some Header|Ignored|\r\nAlice|Hello World|drop-me|\r\n";
        let rows = parse(raw, "people.csv").unwrap();
        assert_eq!(rows.len(), 1);

        let expected: Row = [
            ("name", "Alice"),
            ("someHeader", "Hello World"),
            ("ignored", "drop-me"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(rows[0], expected);
    }

    #[test]
    fn upstream_headers_are_camel_cased() {
        let raw = "datasheet_id|line_in_wargear|BS_WS|A|inv_sv_descr|\n1|2|3+|4|x|\n";
        let rows = parse(raw, "datasheets_wargear.csv").unwrap();
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["a", "bsWs", "datasheetId", "invSvDescr", "lineInWargear"]
        );
    }

    #[test]
    fn rows_without_trailing_delimiter_are_accepted() {
        let raw = "id|name|\nA|Alpha\nB|Beta|\n";
        let rows = parse(raw, "t.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Alpha");
        assert_eq!(rows[1]["name"], "Beta");
    }

    #[test]
    fn trailing_blank_rows_are_dropped() {
        let rows = parse("id|\n1|\n\n\r\n", "t.csv").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn row_order_is_preserved() {
        let rows = parse("id|\n3|\n1|\n2|\n", "t.csv").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn column_mismatch_names_file_and_row() {
        let err = parse("a|b|\n1|2|\n1|2|3|\n", "broken.csv").unwrap_err();
        assert_eq!(
            err,
            TableError::ColumnMismatch {
                file: "broken.csv".to_string(),
                row: 3,
                expected: 2,
                found: 4,
            }
        );
        assert!(err.to_string().contains("broken.csv"));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn empty_input_is_missing_header() {
        assert!(matches!(
            parse("\u{feff}\r\n", "empty.csv"),
            Err(TableError::MissingHeader { .. })
        ));
    }

    #[test]
    fn sanitizer_keeps_allowed_formatting() {
        let cell = r##"<div class="abName">Ability Name</div> <span class="kwb">KW</span> <a href="#">anchor</a> <i>italic</i> <b>bold</b><br/><ul><li>item</li></ul>"##;
        let clean = sanitize_html(cell);

        assert!(!clean.contains("<div"));
        assert!(!clean.contains("<i>"));
        assert!(!clean.contains("<a "));
        assert!(clean.contains(r#"<span class="kwb">KW</span>"#));
        assert!(clean.contains("<b>bold</b>"));
        assert!(clean.contains("<br"));
        assert!(clean.contains("<ul>"));
        assert!(clean.contains("<li>item</li>"));
        assert!(clean.contains("anchor"));
        assert!(clean.contains("Ability Name"));
        assert!(clean.contains("italic"));
    }

    #[test]
    fn sanitizer_drops_scripts_and_attributes() {
        let clean = sanitize_html(
            r#"<b onclick="x()">hit</b><script>alert(1)</script><!-- note --><span style="color:red">s</span>"#,
        );
        assert_eq!(clean, "<b>hit</b><span>s</span>");
    }

    #[test]
    fn sanitizer_handles_stray_brackets_and_quoted_gt() {
        assert_eq!(sanitize_html(r#"<a href="x>y">link</a>"#), "link");
        assert_eq!(sanitize_html("a<b and c>d"), "a&lt;b and c>d");
        assert_eq!(sanitize_html("Range <12\""), "Range &lt;12\"");
        assert_eq!(
            sanitize_html(r#"<b class='kw'>X</b><br />"#),
            r#"<b class="kw">X</b><br/>"#
        );
    }

    #[test]
    fn table_names_match_file_stems() {
        assert_eq!(
            Table::from_file_stem("Datasheets_models_cost"),
            Some(Table::DatasheetsModelsCost)
        );
        assert_eq!(Table::from_file_stem("sources"), Some(Table::Sources));
        assert_eq!(Table::from_file_stem("Source"), Some(Table::Sources));
        assert_eq!(Table::from_file_stem("Last_update"), None);
    }
}
