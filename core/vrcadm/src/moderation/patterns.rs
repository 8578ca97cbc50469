//! 難読化に耐えるキーワード・禁止フレーズのパターン生成
//!
//! leet 置換（a→@ など）と文字間の記号挿入を許容した正規表現を組み立てる。
//! regex crate には look-around が無いため、語境界は
//! `(?:^|[^\p{L}\p{N}])` / `(?:[^\p{L}\p{N}]|$)` で代用する。

use regex::Regex;

const SEP: &str = r"[^\p{L}\p{N}]*";
const BOUNDARY_LEFT: &str = r"(?:^|[^\p{L}\p{N}])";
const BOUNDARY_RIGHT: &str = r"(?:[^\p{L}\p{N}]|$)";

/// 何にも一致しないパターン
fn never_match() -> Regex {
    Regex::new(r"[^\s\S]").expect("fixed pattern")
}

fn obfuscation_class(c: char) -> Option<&'static str> {
    match c.to_ascii_lowercase() {
        'a' => Some("[a@]"),
        'e' => Some("[e3]"),
        'i' => Some("[i1!]"),
        'o' => Some("[o0]"),
        's' => Some(r"[s5$]"),
        't' => Some("[t7]"),
        _ => None,
    }
}

fn push_char(regex: &mut String, c: char) {
    match obfuscation_class(c) {
        Some(class) => regex.push_str(class),
        None => regex.push_str(&regex::escape(&c.to_string())),
    }
}

/// キーワード 1 語のパターン。文字間の記号と語尾の派生（suffix 1 語）を許容する。
pub fn keyword_pattern(term: &str) -> Regex {
    let chars: Vec<char> = term.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return never_match();
    }
    let mut regex = String::from("(?i)");
    regex.push_str(BOUNDARY_LEFT);
    regex.push_str("(?:");
    for (i, c) in chars.iter().enumerate() {
        push_char(&mut regex, *c);
        if i < chars.len() - 1 {
            regex.push_str(SEP);
        }
    }
    // 語尾の派生（doxxing 等）を 1 語分だけ許容
    regex.push_str(r"(?:[^\p{L}\p{N}]*[\p{L}\p{N}]+)?");
    regex.push_str(")");
    regex.push_str(BOUNDARY_RIGHT);
    Regex::new(&regex).unwrap_or_else(|_| never_match())
}

/// 禁止フレーズのパターン。空白は `\s+` として保持する。
pub fn blocked_pattern(term: &str) -> Regex {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return never_match();
    }
    let mut regex = String::from("(?i)");
    regex.push_str(BOUNDARY_LEFT);
    regex.push_str("(?:");
    let mut pending_space = false;
    for c in trimmed.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            regex.push_str(r"\s+");
            pending_space = false;
        }
        push_char(&mut regex, c);
    }
    regex.push_str(")");
    regex.push_str(BOUNDARY_RIGHT);
    Regex::new(&regex).unwrap_or_else(|_| never_match())
}
