//! Keyword tables shared by extraction and normalization.

/// Keywords a canonical statement may start with, in search priority order.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "WITH", "CREATE", "DROP", "ALTER", "SHOW", "DESCRIBE",
    "EXPLAIN",
];

/// Keywords whose presence marks a line as part of a statement.
pub const CLAUSE_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER BY", "GROUP BY", "HAVING", "LIMIT",
];

/// Keywords that may precede narration truncation (DML only).
pub const DML_KEYWORDS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE"];

/// Words never rewritten as bare column names.
const RESERVED_WORDS: &[&str] = &[
    "select", "from", "where", "join", "inner", "left", "right", "outer", "on", "and", "or",
    "not", "in", "like", "between", "is", "null", "order", "by", "group", "having", "limit",
    "offset", "union", "insert", "into", "values", "update", "set", "delete", "create", "table",
    "index", "view", "database", "schema", "primary", "key", "foreign", "references",
    "constraint", "unique", "check", "default", "auto_increment", "varchar", "int", "date",
    "datetime", "text", "decimal", "float", "double", "boolean", "tinyint", "bigint",
];

/// Whether `word` is a reserved SQL word (case-insensitive).
pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}

/// Whether `text` starts with one of `keywords`, ignoring ASCII case.
pub fn starts_with_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        text.len() >= kw.len()
            && text.is_char_boundary(kw.len())
            && text[..kw.len()].eq_ignore_ascii_case(kw)
    })
}

/// Whether `text` starts with a statement keyword.
pub fn starts_with_statement_keyword(text: &str) -> bool {
    starts_with_any(text, STATEMENT_KEYWORDS)
}

/// Byte offset of the first keyword found, trying keywords in list order.
///
/// Offsets are valid for `text` because the search runs on an ASCII-only
/// uppercase copy, which keeps byte positions. Matches are not anchored to
/// word boundaries: `selected` contains `SELECT`.
pub fn find_first_keyword(text: &str, keywords: &[&str]) -> Option<usize> {
    let upper = text.to_ascii_uppercase();
    keywords.iter().find_map(|kw| upper.find(kw))
}
