//! Built-in extraction tiers.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtractionTier, TierRole};
use crate::keywords::{self, CLAUSE_KEYWORDS, DML_KEYWORDS, STATEMENT_KEYWORDS};

/// Labels models put in front of their answer.
pub const DEFAULT_LABEL_PREFIXES: &[&str] = &[
    "sql查询:", "sql查询：", "sql语句:", "sql语句：", "mysql:", "sql:", "mysql", "sql", "查询:",
    "查询：",
];

/// Narration that ends statement collection when it appears on its own line.
pub const DEFAULT_STOP_PHRASES: &[&str] = &[
    "以上就是", "这就是", "查询语句", "语句结束", "结束查询", "查询完成",
];

/// Narration that truncates an assembled statement.
pub const DEFAULT_CLOSING_PHRASES: &[&str] = &[
    "以上就是", "这就是", "查询语句", "语句结束", "结束查询", "查询完成", "这是查询", "就是这个",
    "完成了", "结束了", "。", "；",
];

/// Lines that terminate a script.
const TERMINATOR_LINES: &[&str] = &["end", "go", "commit", "rollback"];

const COMMENT_PREFIXES: &[&str] = &["#", "--", "/*"];

static TAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:sql|mysql)\s*(.*?)\s*```").unwrap());

static STATEMENT_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)```\s*((?:{})\b.*?)\s*```",
        STATEMENT_KEYWORDS.join("|")
    ))
    .unwrap()
});

static STATEMENT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\s*(?:{})\s+", STATEMENT_KEYWORDS.join("|"))).unwrap()
});

static STATEMENT_CAPTURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STATEMENT_KEYWORDS
        .iter()
        .map(|kw| Regex::new(&format!(r"(?is)({kw}\s+.*?(?:;|$))")).unwrap())
        .collect()
});

/// Strip trailing code fences, statement terminators and an unbalanced backtick.
///
/// A closing backtick is only removed when the text holds an odd number of
/// them, so quoted identifiers such as `` `Customer` `` survive.
pub fn strip_trailing_markers(text: &str) -> &str {
    let mut current = text.trim_end();
    loop {
        let next = if let Some(rest) = current.strip_suffix("```") {
            rest
        } else if let Some(rest) = current.strip_suffix(';') {
            rest
        } else if let Some(rest) = current.strip_suffix('；') {
            rest
        } else if current.ends_with('`') && current.matches('`').count() % 2 == 1 {
            &current[..current.len() - 1]
        } else {
            break;
        };
        current = next.trim_end();
    }
    current
}

/// Case-insensitive prefix strip for ASCII letters; other characters match exactly.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.eq_ignore_ascii_case(&expected) {
            return None;
        }
    }
    let end = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[end..])
}

/// Interior of the first ```` ```sql ```` / ```` ```mysql ```` fence, or of an
/// untagged fence whose content starts with a statement keyword.
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedBlock;

impl ExtractionTier for FencedBlock {
    fn name(&self) -> &'static str {
        "fenced_block"
    }

    fn apply(&self, text: &str) -> Option<String> {
        TAGGED_FENCE
            .captures(text)
            .or_else(|| STATEMENT_FENCE.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    }
}

/// Strips one leading answer label and any trailing fence/terminator markers.
#[derive(Debug, Clone)]
pub struct LabelPrefix {
    prefixes: Vec<String>,
}

impl LabelPrefix {
    /// Longer prefixes are tried first so `SQL语句:` wins over `SQL`.
    pub fn new(mut prefixes: Vec<String>) -> Self {
        prefixes.sort_by_key(|p| std::cmp::Reverse(p.chars().count()));
        Self { prefixes }
    }
}

impl ExtractionTier for LabelPrefix {
    fn name(&self) -> &'static str {
        "label_prefix"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let unlabelled = self
            .prefixes
            .iter()
            .find_map(|p| strip_prefix_ignore_case(text, p))
            .unwrap_or(text)
            .trim();

        let stripped = strip_trailing_markers(unlabelled);
        (stripped != text).then(|| stripped.to_string())
    }
}

/// Collects statement lines, skipping comments and stopping at terminators
/// or closing narration.
#[derive(Debug, Clone)]
pub struct LineAssembly {
    stop_phrases: Vec<String>,
}

impl LineAssembly {
    pub fn new(stop_phrases: Vec<String>) -> Self {
        let stop_phrases = stop_phrases.into_iter().map(|p| p.to_lowercase()).collect();
        Self { stop_phrases }
    }

    fn opens_statement(line: &str) -> bool {
        if STATEMENT_START.is_match(line) {
            return true;
        }
        let upper = line.to_uppercase();
        CLAUSE_KEYWORDS.iter().any(|kw| upper.contains(kw))
    }
}

impl ExtractionTier for LineAssembly {
    fn name(&self) -> &'static str {
        "line_assembly"
    }

    fn role(&self) -> TierRole {
        TierRole::Capture
    }

    fn apply(&self, text: &str) -> Option<String> {
        let mut collected: Vec<&str> = Vec::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if collected.is_empty() {
                if Self::opens_statement(line) {
                    collected.push(line);
                }
                continue;
            }

            if COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
                continue;
            }
            let lower = line.to_lowercase();
            if TERMINATOR_LINES.contains(&lower.as_str()) {
                break;
            }
            if self.stop_phrases.iter().any(|p| lower.contains(p.as_str())) {
                break;
            }
            collected.push(line);
        }

        (!collected.is_empty()).then(|| collected.join(" "))
    }
}

/// Non-greedy keyword-to-terminator capture, one pattern per statement keyword.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexCapture;

impl RegexCapture {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionTier for RegexCapture {
    fn name(&self) -> &'static str {
        "regex_capture"
    }

    fn role(&self) -> TierRole {
        TierRole::Capture
    }

    fn apply(&self, text: &str) -> Option<String> {
        STATEMENT_CAPTURES
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    }
}

/// Cuts at the first `;` outside quotes when another statement follows.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstStatement;

impl FirstStatement {
    fn first_terminator(text: &str) -> Option<usize> {
        let mut quote: Option<char> = None;
        for (i, c) in text.char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    '\'' | '"' | '`' => quote = Some(c),
                    ';' => return Some(i),
                    _ => {}
                },
            }
        }
        None
    }
}

impl ExtractionTier for FirstStatement {
    fn name(&self) -> &'static str {
        "first_statement"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let end = Self::first_terminator(text)?;
        if text[end + 1..].trim().is_empty() {
            return None;
        }
        Some(text[..end].trim_end().to_string())
    }
}

/// Slices from the first statement keyword when the text does not start with one.
///
/// As a last resort, slices from the nearest `SELECT` before `FROM`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordRescue;

impl ExtractionTier for KeywordRescue {
    fn name(&self) -> &'static str {
        "keyword_rescue"
    }

    fn apply(&self, text: &str) -> Option<String> {
        if keywords::starts_with_statement_keyword(text) {
            return None;
        }

        if let Some(pos) = keywords::find_first_keyword(text, STATEMENT_KEYWORDS) {
            return Some(text[pos..].trim().to_string());
        }

        let upper = text.to_ascii_uppercase();
        let from = upper.find("FROM")?;
        let select = upper[..from].rfind("SELECT")?;
        Some(text[select..].trim().to_string())
    }
}

/// Collapses whitespace runs and maps comparison glyphs to ASCII operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeWhitespace;

impl ExtractionTier for NormalizeWhitespace {
    fn name(&self) -> &'static str {
        "normalize_whitespace"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let replaced = text
            .replace('≥', ">=")
            .replace('≤', "<=")
            .replace('≠', "!=");
        Some(replaced.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Truncates at the earliest closing phrase preceded by a DML statement.
#[derive(Debug, Clone)]
pub struct NarrationTruncation {
    phrases: Vec<String>,
}

impl NarrationTruncation {
    pub fn new(phrases: Vec<String>) -> Self {
        Self { phrases }
    }
}

impl ExtractionTier for NarrationTruncation {
    fn name(&self) -> &'static str {
        "narration_truncation"
    }

    fn apply(&self, text: &str) -> Option<String> {
        let mut positions: Vec<usize> = self
            .phrases
            .iter()
            .filter(|p| !p.is_empty())
            .flat_map(|p| text.match_indices(p.as_str()).map(|(pos, _)| pos))
            .collect();
        positions.sort_unstable();

        positions.into_iter().find_map(|pos| {
            let before = text[..pos].trim();
            (!before.is_empty() && keywords::starts_with_any(before, DML_KEYWORDS))
                .then(|| before.to_string())
        })
    }
}

/// Strips trailing terminators left after truncation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingTerminator;

impl ExtractionTier for TrailingTerminator {
    fn name(&self) -> &'static str {
        "trailing_terminator"
    }

    fn apply(&self, text: &str) -> Option<String> {
        Some(strip_trailing_markers(text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn owned(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fence_tagged_and_untagged() {
        assert_eq!(
            FencedBlock.apply("here:\n```mysql\nSELECT a FROM t;\n```\nthanks").as_deref(),
            Some("SELECT a FROM t;")
        );
        assert_eq!(
            FencedBlock.apply("```\nselect 1\n```").as_deref(),
            Some("select 1")
        );
        assert_eq!(FencedBlock.apply("```\nhello\n```"), None);
    }

    #[test]
    fn test_label_prefix_longest_first() {
        let tier = LabelPrefix::new(owned(DEFAULT_LABEL_PREFIXES));
        assert_eq!(
            tier.apply("SQL语句： SELECT 1").as_deref(),
            Some("SELECT 1")
        );
        assert_eq!(tier.apply("sql: SELECT 1;;").as_deref(), Some("SELECT 1"));
        assert_eq!(tier.apply("SELECT 1"), None);
    }

    #[test]
    fn test_trailing_markers() {
        assert_eq!(strip_trailing_markers("SELECT 1;\n```"), "SELECT 1");
        assert_eq!(strip_trailing_markers("SELECT 1 ；"), "SELECT 1");
        assert_eq!(
            strip_trailing_markers("SELECT * FROM `Customer`"),
            "SELECT * FROM `Customer`"
        );
        assert_eq!(strip_trailing_markers("SELECT 1`"), "SELECT 1");
    }

    #[test]
    fn test_line_assembly_skips_comments_and_stops() {
        let tier = LineAssembly::new(owned(DEFAULT_STOP_PHRASES));
        let text = "下面是查询:\nSELECT a\n-- pick columns\nFROM t\n\nWHERE a > 1\ngo\nSELECT b";
        assert_eq!(
            tier.apply(text).as_deref(),
            Some("SELECT a FROM t WHERE a > 1")
        );
    }

    #[test]
    fn test_line_assembly_stops_at_narration() {
        let tier = LineAssembly::new(owned(DEFAULT_STOP_PHRASES));
        let text = "SELECT a\nFROM t\n以上就是你需要的查询";
        assert_eq!(tier.apply(text).as_deref(), Some("SELECT a FROM t"));
    }

    #[test]
    fn test_line_assembly_opens_on_clause_keyword() {
        let tier = LineAssembly::new(Vec::new());
        assert_eq!(
            tier.apply("a, b\nfrom t\nlimit 5").as_deref(),
            Some("from t limit 5")
        );
        assert_eq!(tier.apply("nothing here"), None);
    }

    #[test]
    fn test_regex_capture() {
        assert_eq!(
            RegexCapture.apply("答案是 select\ta from t; 谢谢").as_deref(),
            Some("select\ta from t;")
        );
        assert_eq!(RegexCapture.apply("no statement"), None);
    }

    #[test]
    fn test_first_statement_respects_quotes() {
        assert_eq!(
            FirstStatement.apply("SELECT 1; SELECT 2").as_deref(),
            Some("SELECT 1")
        );
        assert_eq!(FirstStatement.apply("SELECT ';' FROM t"), None);
        assert_eq!(FirstStatement.apply("SELECT 1;"), None);
    }

    #[test]
    fn test_keyword_rescue() {
        assert_eq!(
            KeywordRescue.apply("The query: SELECT a FROM t").as_deref(),
            Some("SELECT a FROM t")
        );
        assert_eq!(KeywordRescue.apply("SELECT a"), None);
        assert_eq!(KeywordRescue.apply("nothing"), None);
    }

    #[test]
    fn test_normalize_whitespace_and_glyphs() {
        assert_eq!(
            NormalizeWhitespace
                .apply("SELECT a\n  FROM t WHERE a ≥ 1 AND b ≠ 2 AND c ≤ 3")
                .as_deref(),
            Some("SELECT a FROM t WHERE a >= 1 AND b != 2 AND c <= 3")
        );
    }

    #[test]
    fn test_narration_truncation_earliest_phrase() {
        let tier = NarrationTruncation::new(owned(DEFAULT_CLOSING_PHRASES));
        assert_eq!(
            tier.apply("SELECT a FROM t 。 这就是").as_deref(),
            Some("SELECT a FROM t")
        );
        assert_eq!(tier.apply("WITH x AS (SELECT 1) SELECT * FROM x 完成了"), None);
        assert_eq!(tier.apply("SELECT a FROM t"), None);
    }
}
