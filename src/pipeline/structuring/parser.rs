//! Tolerant parser for the structuring output.
//!
//! The upstream generator is a language model, so the markup arrives with
//! stray tags, uneven whitespace, and occasionally missing close tags. This
//! is deliberately NOT an HTML sanitizer — it extracts the first `<table>`
//! row by row and treats everything else as interpretation prose.
//!
//! Column order (name, value, comment, date) is a contract with the prompt
//! builders, read positionally, never negotiated from header names.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Table artifact row the model tends to append; not a measurement.
const SUMMARY_SENTINEL: &str = "Podsumowanie";

/// Lead-in phrases the model produces before the actual content.
/// Matched case-insensitively against the first line of the interpretation.
const BOILERPLATE_LEAD_INS: &[&str] = &[
    "oto analiza",
    "oto wyniki",
    "oto tabela",
    "poniżej przedstawiam",
    "here is the analysis",
];

/// One table row that passed validation, pre-persistence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterCandidate {
    pub name: String,
    pub value: String,
    pub comment: String,
    /// Kept as text; validated as a calendar date at persistence time.
    pub date: String,
}

/// Parsed structuring output: prose + validated rows in source order.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedAnalysis {
    pub interpretation: String,
    pub rows: Vec<ParameterCandidate>,
}

impl ParsedAnalysis {
    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }
}

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table[^>]*>.*?</table>").unwrap())
}

fn row_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<tr[^>]*>").unwrap())
}

fn cell_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<td[^>]*>").unwrap())
}

/// Where a cell's content ends, close tag present or not.
fn cell_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</td|</tr|</table").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").unwrap())
}

/// Parse structuring output into interpretation prose and parameter rows.
///
/// Only the first `<table>` block is consumed; any further tables are
/// ignored. Absence of a table is not an error — the whole input becomes
/// the interpretation and zero rows are returned.
pub fn parse_analysis(output: &str) -> ParsedAnalysis {
    match table_re().find(output) {
        Some(table) => {
            let outside = format!("{}\n{}", &output[..table.start()], &output[table.end()..]);
            ParsedAnalysis {
                interpretation: strip_boilerplate(&clean_fragment(&outside)),
                rows: parse_rows(table.as_str()),
            }
        }
        None => ParsedAnalysis {
            interpretation: strip_boilerplate(&clean_fragment(output)),
            rows: Vec::new(),
        },
    }
}

fn parse_rows(table_html: &str) -> Vec<ParameterCandidate> {
    let mut rows = Vec::new();

    // Segment 0 is the text before the first <tr>, segment 1 the header
    // row — skipped unconditionally, no header-name validation.
    for segment in row_open_re().split(table_html).skip(2) {
        let cells = extract_cells(segment);
        if cells.len() < 4 {
            continue;
        }

        let name = cells[0].as_str();
        let value = cells[1].as_str();
        let comment = cells[2].as_str();
        let date = cells[3].as_str();

        if name.is_empty() || name == SUMMARY_SENTINEL || value.is_empty() || date.is_empty() {
            continue;
        }

        rows.push(ParameterCandidate {
            name: name.to_string(),
            value: value.to_string(),
            comment: comment.to_string(),
            date: date.to_string(),
        });
    }

    rows
}

/// Cell contents of one row segment, cleaned and trimmed.
fn extract_cells(row_segment: &str) -> Vec<String> {
    cell_open_re()
        .split(row_segment)
        .skip(1)
        .map(|piece| {
            let cut = cell_end_re()
                .find(piece)
                .map(|m| m.start())
                .unwrap_or(piece.len());
            clean_fragment(&piece[..cut])
        })
        .collect()
}

/// Strip tags, decode the handful of entities the model emits, trim.
fn clean_fragment(html: &str) -> String {
    let without_tags = tag_re().replace_all(html, "");
    decode_entities(&without_tags).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Drop a known boilerplate lead-in from the head of the interpretation.
fn strip_boilerplate(interpretation: &str) -> String {
    let first_line = interpretation.lines().next().unwrap_or_default();
    let lowered = first_line.trim().to_lowercase();

    if BOILERPLATE_LEAD_INS.iter().any(|p| lowered.starts_with(p)) {
        interpretation[first_line.len()..].trim().to_string()
    } else {
        interpretation.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLDEN: &str = "<p>Intro</p><table><tr><th>P</th><th>V</th><th>C</th><th>D</th></tr>\
        <tr><td>Hemoglobina</td><td>14.2 g/dl</td><td>Norma 12-16</td><td>2024-01-15</td></tr></table>";

    #[test]
    fn golden_case() {
        let parsed = parse_analysis(GOLDEN);
        assert_eq!(parsed.interpretation, "Intro");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(
            parsed.rows[0],
            ParameterCandidate {
                name: "Hemoglobina".into(),
                value: "14.2 g/dl".into(),
                comment: "Norma 12-16".into(),
                date: "2024-01-15".into(),
            }
        );
    }

    #[test]
    fn no_table_yields_interpretation_only() {
        let input = "Niestety nie udało się odczytać żadnych wyników z tego dokumentu.";
        let parsed = parse_analysis(input);
        assert!(parsed.rows.is_empty());
        assert!(!parsed.has_rows());
        assert_eq!(parsed.interpretation, input);
    }

    #[test]
    fn sentinel_row_is_dropped() {
        let input = "<table><tr><th>h</th></tr>\
            <tr><td>Podsumowanie</td><td>wszystko ok</td><td>-</td><td>2024-01-15</td></tr>\
            <tr><td>Glukoza</td><td>95 mg/dl</td><td>Norma</td><td>2024-01-15</td></tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "Glukoza");
    }

    #[test]
    fn sentinel_comparison_is_case_sensitive() {
        let input = "<table><tr></tr>\
            <tr><td>podsumowanie</td><td>x</td><td>y</td><td>2024-01-15</td></tr></table>";
        let parsed = parse_analysis(input);
        // Lowercase variant is an ordinary (if odd) parameter name
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn rows_missing_required_fields_are_dropped() {
        let input = "<table><tr><th>h</th></tr>\
            <tr><td></td><td>1.0</td><td>c</td><td>2024-01-15</td></tr>\
            <tr><td>Glukoza</td><td></td><td>c</td><td>2024-01-15</td></tr>\
            <tr><td>TSH</td><td>2.1</td><td>c</td><td></td></tr>\
            <tr><td>CRP</td><td>1.2 mg/l</td><td></td><td>2024-01-15</td></tr></table>";
        let parsed = parse_analysis(input);
        // Only the row with an empty comment survives
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "CRP");
        assert_eq!(parsed.rows[0].comment, "");
    }

    #[test]
    fn rows_with_fewer_than_four_cells_are_skipped() {
        let input = "<table><tr><th>h</th></tr>\
            <tr><td>Glukoza</td><td>95</td><td>Norma</td></tr>\
            <tr><td>TSH</td><td>2.1</td><td>Norma</td><td>2024-01-15</td></tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "TSH");
    }

    #[test]
    fn header_row_skipped_even_if_it_uses_td() {
        let input = "<table><tr><td>Parametr</td><td>Wartość</td><td>Komentarz</td><td>Data</td></tr>\
            <tr><td>Glukoza</td><td>95</td><td>Norma</td><td>2024-01-15</td></tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "Glukoza");
    }

    #[test]
    fn only_first_table_is_consumed() {
        let input = "<table><tr></tr><tr><td>A</td><td>1</td><td></td><td>2024-01-01</td></tr></table>\
            <table><tr></tr><tr><td>B</td><td>2</td><td></td><td>2024-01-02</td></tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "A");
        // The second table's markup lands in the interpretation, tags stripped
        assert!(parsed.interpretation.contains('B'));
    }

    #[test]
    fn nested_tags_and_entities_in_cells() {
        let input = "<table><tr></tr>\
            <tr><td><strong>Hemoglobina</strong></td><td><b>14.2</b>&nbsp;g/dl</td>\
            <td>Norma&nbsp;12&ndash;16 &amp; ok</td><td> 2024-01-15 </td></tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "Hemoglobina");
        assert_eq!(parsed.rows[0].value, "14.2 g/dl");
        assert!(parsed.rows[0].comment.contains("& ok"));
        assert_eq!(parsed.rows[0].date, "2024-01-15");
    }

    #[test]
    fn missing_close_tags_are_tolerated() {
        // Unclosed <td> cells end at the next cell or row boundary
        let input = "<table><tr><th>h</th></tr>\
            <tr><td>Glukoza<td>95 mg/dl<td>Norma<td>2024-01-15</tr></table>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "Glukoza");
        assert_eq!(parsed.rows[0].value, "95 mg/dl");
        assert_eq!(parsed.rows[0].date, "2024-01-15");
    }

    #[test]
    fn table_tag_with_attributes_and_mixed_case() {
        let input = "<TABLE border=\"1\"><TR><TH>x</TH></TR>\
            <TR><TD>CRP</TD><TD>1.2</TD><TD>ok</TD><TD>2024-01-15</TD></TR></TABLE>";
        let parsed = parse_analysis(input);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].name, "CRP");
    }

    #[test]
    fn empty_table_yields_no_rows() {
        let parsed = parse_analysis("<table></table>");
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn boilerplate_lead_in_is_stripped() {
        let input = format!("Oto analiza wyników badań:\n{GOLDEN}");
        let parsed = parse_analysis(&input);
        assert_eq!(parsed.interpretation, "Intro");
    }

    #[test]
    fn non_boilerplate_first_line_is_kept() {
        let input = format!("Wyniki wskazują na anemię.\n{GOLDEN}");
        let parsed = parse_analysis(&input);
        assert!(parsed.interpretation.starts_with("Wyniki wskazują na anemię."));
    }

    #[test]
    fn prose_around_table_is_joined() {
        let input = "<p>Wstęp</p><table><tr></tr>\
            <tr><td>A</td><td>1</td><td></td><td>2024-01-01</td></tr></table><p>Wnioski</p>";
        let parsed = parse_analysis(input);
        assert!(parsed.interpretation.contains("Wstęp"));
        assert!(parsed.interpretation.contains("Wnioski"));
    }

    #[test]
    fn rows_preserve_source_order() {
        let input = "<table><tr></tr>\
            <tr><td>Pierwszy</td><td>1</td><td></td><td>2024-01-01</td></tr>\
            <tr><td>Drugi</td><td>2</td><td></td><td>2024-01-02</td></tr>\
            <tr><td>Trzeci</td><td>3</td><td></td><td>2024-01-03</td></tr></table>";
        let names: Vec<String> = parse_analysis(input).rows.into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Pierwszy", "Drugi", "Trzeci"]);
    }
}
