//! テキスト正規化と類義語展開
//!
//! 小文字化 → 非英数字の除去 → 空白の圧縮。オプションで軽量ステミングを適用し、
//! 類義語グループの展開形（マッチ対象を広げた文字列）も作る。

use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// 語形処理のモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Morphology {
    /// 正規化のみ
    None,
    /// サフィックス規則によるステミング
    #[default]
    Stem,
    /// 不規則変化テーブル + ステミング
    Lemma,
}

impl Morphology {
    /// 設定文字列から解析（未知は Stem）
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "none" => Self::None,
            "lemma" => Self::Lemma,
            _ => Self::Stem,
        }
    }
}

/// 正規化器
pub struct TextNormalizer {
    morphology: Morphology,
    non_alnum: Regex,
    /// トークン -> 同グループの他のトークン
    expansions: HashMap<String, BTreeSet<String>>,
}

impl TextNormalizer {
    pub fn new(synonyms: &HashMap<String, Vec<String>>, morphology: Morphology) -> Self {
        // [^\p{L}\p{N}]+ は固定パターンなので失敗しない
        let non_alnum = Regex::new(r"[^\p{L}\p{N}]+").expect("fixed pattern");
        let mut normalizer = Self {
            morphology,
            non_alnum,
            expansions: HashMap::new(),
        };
        normalizer.expansions = normalizer.build_expansions(synonyms);
        normalizer
    }

    /// 正規化と類義語展開の両方を返す
    pub fn normalize_and_expand(&self, input: &str) -> (String, String) {
        let normalized = self.normalize(input);
        let expanded = self.expand(&normalized);
        (normalized, expanded)
    }

    /// 小文字化・記号除去・空白圧縮・語形処理
    pub fn normalize(&self, input: &str) -> String {
        let lowered = input.to_lowercase();
        let cleaned = self.non_alnum.replace_all(&lowered, " ");
        let tokens: Vec<String> = cleaned
            .split_whitespace()
            .map(|t| self.apply_morphology(t))
            .filter(|t| !t.is_empty())
            .collect();
        tokens.join(" ")
    }

    /// 正規化済み文字列の各トークンに類義語を足した展開形を返す
    pub fn expand(&self, normalized: &str) -> String {
        if normalized.is_empty() {
            return String::new();
        }
        let mut out: Vec<String> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for token in normalized.split_whitespace() {
            if seen.insert(token.to_string()) {
                out.push(token.to_string());
            }
            if let Some(group) = self.expansions.get(token) {
                for syn in group {
                    if seen.insert(syn.clone()) {
                        out.push(syn.clone());
                    }
                }
            }
        }
        out.join(" ")
    }

    fn build_expansions(
        &self,
        synonyms: &HashMap<String, Vec<String>>,
    ) -> HashMap<String, BTreeSet<String>> {
        let mut expansions: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (key, values) in synonyms {
            let mut group: BTreeSet<String> = BTreeSet::new();
            let key = self.normalize(key);
            if key.is_empty() {
                continue;
            }
            group.insert(key);
            for v in values {
                let v = self.normalize(v);
                if !v.is_empty() {
                    group.insert(v);
                }
            }
            for term in &group {
                let entry = expansions.entry(term.clone()).or_default();
                entry.extend(group.iter().cloned());
            }
        }
        for (term, group) in expansions.iter_mut() {
            group.remove(term);
        }
        expansions
    }

    fn apply_morphology(&self, token: &str) -> String {
        match self.morphology {
            Morphology::None => token.to_string(),
            Morphology::Stem => stem(token),
            Morphology::Lemma => {
                let lemma = lemmatize(token);
                if lemma != token {
                    lemma.to_string()
                } else {
                    stem(token)
                }
            }
        }
    }
}

fn lemmatize(token: &str) -> &str {
    match token {
        "children" => "child",
        "people" => "person",
        "men" => "man",
        "women" => "woman",
        "mice" => "mouse",
        "geese" => "goose",
        _ => token,
    }
}

fn stem(token: &str) -> String {
    let len = token.chars().count();
    if len <= 3 {
        return token.to_string();
    }
    if token.ends_with("ing") && len > 5 {
        return token[..token.len() - 3].to_string();
    }
    if token.ends_with("ed") && len > 4 {
        return token[..token.len() - 2].to_string();
    }
    if token.ends_with("es") && len > 4 {
        return token[..token.len() - 2].to_string();
    }
    if token.ends_with('s') && len > 3 {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
