//! Small lexical highlighter for the snippet languages.
//!
//! Classification is per char so callers can overlay cursor and mismatch
//! styling on top of syntax colors without re-tokenizing.

use crate::snippet::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Keyword,
    Type,
    String,
    Comment,
    Number,
    Punctuation,
}

const JS_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "constructor", "continue",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for", "from",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "yield",
];

const TS_KEYWORDS: &[&str] = &[
    "abstract", "any", "as", "boolean", "declare", "enum", "implements", "interface", "keyof",
    "never", "number", "private", "protected", "public", "readonly", "string", "type", "unknown",
];

const PY_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "self",
    "try", "while", "with", "yield",
];

fn is_keyword(word: &str, language: Language) -> bool {
    match language {
        Language::JavaScript => JS_KEYWORDS.contains(&word),
        Language::TypeScript => JS_KEYWORDS.contains(&word) || TS_KEYWORDS.contains(&word),
        Language::Python => PY_KEYWORDS.contains(&word),
    }
}

/// One `TokenKind` per char of `text`.
pub fn classify(text: &str, language: Language) -> Vec<TokenKind> {
    let chars: Vec<char> = text.chars().collect();
    let mut kinds = vec![TokenKind::Plain; chars.len()];
    let python = language == Language::Python;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        let start = i;
        let kind = if (python && ch == '#') || (!python && ch == '/' && next == Some('/')) {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            TokenKind::Comment
        } else if !python && ch == '/' && next == Some('*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i = (i + 2).min(chars.len());
            TokenKind::Comment
        } else if ch == '"' || ch == '\'' || (!python && ch == '`') {
            i = scan_string(&chars, i, python);
            TokenKind::String
        } else if ch.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                i += 1;
            }
            TokenKind::Number
        } else if ch.is_alphabetic() || ch == '_' || ch == '$' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if is_keyword(&word, language) {
                TokenKind::Keyword
            } else if ch.is_uppercase() {
                TokenKind::Type
            } else {
                TokenKind::Plain
            }
        } else if ch.is_whitespace() {
            i += 1;
            TokenKind::Plain
        } else {
            i += 1;
            TokenKind::Punctuation
        };

        kinds[start..i].fill(kind);
    }

    kinds
}

/// End index (exclusive) of the string literal opening at `start`.
/// Unterminated strings run to the end of the line, or of the text for
/// template and triple-quoted strings.
fn scan_string(chars: &[char], start: usize, python: bool) -> usize {
    let quote = chars[start];
    let triple = python
        && chars.get(start + 1) == Some(&quote)
        && chars.get(start + 2) == Some(&quote);
    let multiline = triple || quote == '`';
    let mut i = start + if triple { 3 } else { 1 };

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            i += 2;
            continue;
        }
        if ch == '\n' && !multiline {
            return i;
        }
        if ch == quote {
            if !triple {
                return i + 1;
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return i + 3;
            }
        }
        i += 1;
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(text: &str, language: Language) -> Vec<(String, TokenKind)> {
        // Collapse runs for readable assertions.
        let kinds = classify(text, language);
        let mut out: Vec<(String, TokenKind)> = Vec::new();
        for (ch, kind) in text.chars().zip(kinds) {
            match out.last_mut() {
                Some((s, k)) if *k == kind => s.push(ch),
                _ => out.push((ch.to_string(), kind)),
            }
        }
        out
    }

    #[test]
    fn test_one_kind_per_char() {
        let text = "const café = \"ü\";";
        assert_eq!(classify(text, Language::JavaScript).len(), text.chars().count());
    }

    #[test]
    fn test_js_keywords_strings_numbers() {
        let runs = kinds_of("return 42 + 'a';", Language::JavaScript);
        assert_eq!(runs[0], ("return".to_string(), TokenKind::Keyword));
        assert!(runs.contains(&("42".to_string(), TokenKind::Number)));
        assert!(runs.contains(&("'a'".to_string(), TokenKind::String)));
        assert!(runs.contains(&("+".to_string(), TokenKind::Punctuation)));
    }

    #[test]
    fn test_ts_only_keywords() {
        assert_eq!(classify("interface", Language::TypeScript)[0], TokenKind::Keyword);
        assert_eq!(classify("interface", Language::JavaScript)[0], TokenKind::Plain);
    }

    #[test]
    fn test_capitalized_identifier_is_type() {
        let runs = kinds_of("new Promise", Language::TypeScript);
        assert_eq!(runs.last().unwrap(), &("Promise".to_string(), TokenKind::Type));
    }

    #[test]
    fn test_line_and_block_comments() {
        let runs = kinds_of("a // hi\nb /* x\ny */ c", Language::JavaScript);
        assert!(runs.contains(&("// hi".to_string(), TokenKind::Comment)));
        assert!(runs.contains(&("/* x\ny */".to_string(), TokenKind::Comment)));
        assert_eq!(runs.last().unwrap(), &(" c".to_string(), TokenKind::Plain));
    }

    #[test]
    fn test_template_literal_spans_lines() {
        let runs = kinds_of("`/api/${id}\nmore`;", Language::TypeScript);
        assert_eq!(runs[0], ("`/api/${id}\nmore`".to_string(), TokenKind::String));
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let runs = kinds_of("'abc\nx", Language::JavaScript);
        assert_eq!(runs[0], ("'abc".to_string(), TokenKind::String));
        assert_eq!(runs.last().unwrap(), &("\nx".to_string(), TokenKind::Plain));
    }

    #[test]
    fn test_python_comment_and_triple_quotes() {
        let runs = kinds_of("def f():  # note\n    \"\"\"doc\n\"\"\"", Language::Python);
        assert_eq!(runs[0], ("def".to_string(), TokenKind::Keyword));
        assert!(runs.contains(&("# note".to_string(), TokenKind::Comment)));
        assert!(runs.contains(&("\"\"\"doc\n\"\"\"".to_string(), TokenKind::String)));
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let runs = kinds_of(r#""a\"b" c"#, Language::JavaScript);
        assert_eq!(runs[0], (r#""a\"b""#.to_string(), TokenKind::String));
    }
}
