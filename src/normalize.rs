//! Heuristic name normalization for model and benchmark labels.
//!
//! Turns raw, human-typed strings ("o1-preview (2024-09-12)", "mmlu-5shot")
//! into deterministic canonical identifiers plus extracted facets. The steps
//! run in a fixed order and each consumes the substrings it matched, so later
//! steps see a shrinking residual string. Normalization never fails:
//! unparseable segments stay in the family text, and a wholly empty input
//! yields a sentinel.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Model,
    Benchmark,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Benchmark => "benchmark",
        }
    }
}

/// Canonical identity plus facets extracted from one raw label.
///
/// `canonical_id` is deterministic for a given input. `base_id` omits the
/// variant and date segments and groups calibration siblings ("gpt-4" base
/// groups "gpt-4-preview" and "gpt-4-0613").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub kind: EntityKind,
    pub canonical_id: String,
    pub base_id: String,
    pub provider: String,
    pub family: String,
    pub version: Option<String>,
    pub size: Option<String>,
    pub variant: String,
    pub release_date: Option<NaiveDate>,
}

pub fn normalize_model(raw: &str) -> NormalizedName {
    normalize(raw, EntityKind::Model)
}

pub fn normalize_benchmark(raw: &str) -> NormalizedName {
    normalize(raw, EntityKind::Benchmark)
}

pub fn normalize(raw: &str, kind: EntityKind) -> NormalizedName {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NormalizedName {
            kind,
            canonical_id: "n/a".to_string(),
            base_id: "n/a".to_string(),
            provider: "unknown".to_string(),
            family: String::new(),
            version: None,
            size: None,
            variant: "standard".to_string(),
            release_date: None,
        };
    }

    let spaced = insert_word_boundaries(trimmed);
    let (residual, release_date) = extract_date(&spaced);
    let (residual, variant) = extract_variant(&residual);
    let (residual, size) = extract_size(&residual);
    let (residual, version) = extract_version(&residual);

    // Provider anchoring matches the original raw string, not the residual,
    // so concatenated or already-consumed spellings still anchor.
    let provider = detect_provider(raw).unwrap_or_else(|| fallback_provider(raw));

    let mut family = slug(&residual);
    // Drop a duplicated provider token at the front of the family text
    // ("anthropic claude 3" keeps family "claude-3").
    if let Some(rest) = family.strip_prefix(&format!("{provider}-")) {
        family = rest.to_string();
    } else if family == provider {
        family.clear();
    }

    let base_id = build_id(&[
        Some(provider.as_str()),
        Some(family.as_str()),
        version.as_deref(),
        size.as_deref(),
    ]);

    let mut canonical = base_id.clone();
    if variant != "standard" {
        canonical.push('-');
        canonical.push_str(&variant);
    }
    if let Some(date) = release_date {
        canonical.push('-');
        canonical.push_str(&date.format("%Y-%m-%d").to_string());
    }

    NormalizedName {
        kind,
        canonical_id: canonical,
        base_id,
        provider,
        family,
        version,
        size,
        variant,
        release_date,
    }
}

/// Split camelCase, ALLCAPS-followed-by-capitalized runs, and digit/letter
/// boundaries into space-separated tokens. Digit/letter boundaries only split
/// when the letter run is at least two characters, so size tokens ("7b"),
/// quantization tokens ("q4"), and names like "o1" or "4o" survive intact for
/// the later steps.
fn insert_word_boundaries(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    // Letters in the current output word; a camelCase split starts a new run,
    // so "DeepSeekR1" keeps its trailing "R1" intact.
    let mut run_letters = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        let mut split = false;
        if i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            split = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase() && c.is_uppercase() && next_is_lower)
                || (prev.is_ascii_digit() && c.is_alphabetic() && letter_run_from(&chars, i) >= 2)
                || (prev.is_alphabetic() && c.is_ascii_digit() && run_letters >= 2);
            if split {
                out.push(' ');
            }
        }
        if c.is_alphabetic() {
            let continues = i > 0 && chars[i - 1].is_alphabetic() && !split;
            run_letters = if continues { run_letters + 1 } else { 1 };
        } else {
            run_letters = 0;
        }
        out.push(c);
    }
    out
}

fn letter_run_from(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|c| c.is_alphabetic()).count()
}

/// Extract the first release date, trying formats in priority order:
/// `(YYYYMMDD)`, `(YYYY-MM-DD)`, bare `YYYY-MM-DD`, `(M/YY)` or `(M/YYYY)`.
/// The matched text is removed from the residual. A date-shaped token that
/// fails to parse as a real date is left in place for the later steps.
fn extract_date(s: &str) -> (String, Option<NaiveDate>) {
    let compact = Regex::new(r"\((\d{8})\)").unwrap();
    if let Some(caps) = compact.captures(s) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d") {
            return (remove_span(s, caps.get(0).unwrap().range()), Some(date));
        }
    }

    let iso_parens = Regex::new(r"\((\d{4}-\d{2}-\d{2})\)").unwrap();
    if let Some(caps) = iso_parens.captures(s) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return (remove_span(s, caps.get(0).unwrap().range()), Some(date));
        }
    }

    let iso = Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap();
    if let Some(caps) = iso.captures(s) {
        if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return (remove_span(s, caps.get(0).unwrap().range()), Some(date));
        }
    }

    // Month/year without a day normalizes to the first of the month;
    // 2-digit years are expanded with a "20" prefix.
    let slash = Regex::new(r"\((\d{1,2})/(\d{2}|\d{4})\)").unwrap();
    if let Some(caps) = slash.captures(s) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let year: i32 = caps[2].parse().unwrap_or(0);
        let year = if caps[2].len() == 2 { 2000 + year } else { year };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            return (remove_span(s, caps.get(0).unwrap().range()), Some(date));
        }
    }

    (s.to_string(), None)
}

/// Reasoning-class patterns ("o1".."o9", DeepSeek "r1"-style) take precedence
/// and are NOT stripped -- the token usually is the family name. Otherwise the
/// first of thinking|instruct|preview sets the variant and is stripped.
fn extract_variant(s: &str) -> (String, String) {
    let reasoning = Regex::new(r"(?i)\b(o[1-9]|r[1-9])\b").unwrap();
    if reasoning.is_match(s) {
        return (s.to_string(), "reasoning".to_string());
    }

    let named = Regex::new(r"(?i)\b(thinking|instruct|preview)\b").unwrap();
    if let Some(m) = named.find(s) {
        let variant = m.as_str().to_lowercase();
        return (remove_span(s, m.range()), variant);
    }

    (s.to_string(), "standard".to_string())
}

/// First token shaped like `<digits>[.<digits>]<b|m|k>`, optionally carrying a
/// quantization suffix ("/q4"), is captured as the size and consumed whole.
/// Later size-like tokens stay in the family text.
fn extract_size(s: &str) -> (String, Option<String>) {
    let size_re = Regex::new(r"^(\d+(?:\.\d+)?[bBmMkK])(?:/q\d+)?$").unwrap();
    for m in token_pattern().find_iter(s) {
        if let Some(caps) = size_re.captures(m.as_str()) {
            return (remove_span(s, m.range()), Some(caps[1].to_lowercase()));
        }
    }
    (s.to_string(), None)
}

/// First `<digits>.<digits>[.<digits>]` token is captured as the version.
fn extract_version(s: &str) -> (String, Option<String>) {
    let version_re = Regex::new(r"^\d+\.\d+(?:\.\d+)?$").unwrap();
    for m in token_pattern().find_iter(s) {
        if version_re.is_match(m.as_str()) {
            return (remove_span(s, m.range()), Some(m.as_str().to_string()));
        }
    }
    (s.to_string(), None)
}

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[A-Za-z0-9./]+").unwrap())
}

fn remove_span(s: &str, range: std::ops::Range<usize>) -> String {
    format!("{}{}", &s[..range.start], &s[range.end..])
}

/// Ordered provider anchor table. First match wins, so table order matters:
/// specific names come before generic terms. Collisions between patterns are
/// resolved by position, not confidence -- a documented heuristic limit.
fn provider_table() -> &'static Vec<(Regex, &'static str)> {
    static TABLE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        [
            (r"claude|anthropic", "anthropic"),
            (r"gpt|chatgpt|davinci|openai|\bo[1-9]\b", "openai"),
            (r"gemini|gemma|palm|bard|google", "google"),
            (r"llama|\bmeta\b", "meta"),
            (r"deepseek", "deepseek"),
            (r"mixtral|mistral|ministral|codestral|pixtral", "mistral"),
            (r"qwen|qwq|tongyi|alibaba", "alibaba"),
            (r"\bcommand\b|cohere|\baya\b", "cohere"),
            (r"grok|\bxai\b", "xai"),
            (r"\bphi\b|copilot|microsoft", "microsoft"),
            (r"\btitan\b|\bnova\b|amazon|bedrock", "amazon"),
            (r"nemotron|nvidia", "nvidia"),
            (r"chatglm|glm|zhipu", "zhipuai"),
            (r"kimi|moonshot", "moonshotai"),
            (r"\byi\b|01-ai", "01-ai"),
            (r"falcon", "tii"),
            (r"jamba|ai21", "ai21"),
            (r"dbrx|databricks", "databricks"),
            (r"solar|upstage", "upstage"),
        ]
        .into_iter()
        .map(|(pattern, provider)| (Regex::new(&format!("(?i){pattern}")).unwrap(), provider))
        .collect()
    })
}

fn detect_provider(raw: &str) -> Option<String> {
    provider_table()
        .iter()
        .find(|(re, _)| re.is_match(raw))
        .map(|(_, provider)| (*provider).to_string())
}

/// No table entry matched: the first alphanumeric token of the raw string,
/// lower-cased, stands in as the provider.
fn fallback_provider(raw: &str) -> String {
    let token = Regex::new(r"[A-Za-z0-9]+").unwrap();
    token
        .find(raw)
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Lower-case, collapse non-alphanumeric runs to single hyphens, trim
/// leading/trailing hyphens.
pub(crate) fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    out
}

fn build_id(parts: &[Option<&str>]) -> String {
    let joined = parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-");
    slug(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_sentinel() {
        let n = normalize_model("   ");
        assert_eq!(n.canonical_id, "n/a");
        assert_eq!(n.base_id, "n/a");
        assert_eq!(n.provider, "unknown");
        assert_eq!(n.variant, "standard");
        assert!(n.release_date.is_none());
    }

    #[test]
    fn test_o1_preview_with_date() {
        let n = normalize_model("o1-preview (2024-09-12)");
        assert_eq!(n.variant, "reasoning");
        assert_eq!(n.provider, "openai");
        assert_eq!(
            n.release_date,
            Some(NaiveDate::from_ymd_opt(2024, 9, 12).unwrap())
        );
        assert_eq!(n.base_id, "openai-o1-preview");
        assert_eq!(n.canonical_id, "openai-o1-preview-reasoning-2024-09-12");
    }

    #[test]
    fn test_deterministic() {
        let a = normalize_model("Qwen2.5-72B-Instruct");
        let b = normalize_model("Qwen2.5-72B-Instruct");
        assert_eq!(a, b);
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(insert_word_boundaries("GPT4All"), "GPT 4 All");
        assert_eq!(insert_word_boundaries("MMLUPro"), "MMLU Pro");
        assert_eq!(insert_word_boundaries("DeepSeekR1"), "Deep Seek R1");
        // Single-letter runs stay attached to their digits.
        assert_eq!(insert_word_boundaries("o1"), "o1");
        assert_eq!(insert_word_boundaries("gpt4o"), "gpt 4o");
        assert_eq!(insert_word_boundaries("llama3"), "llama 3");
        assert_eq!(insert_word_boundaries("7b"), "7b");
    }

    #[test]
    fn test_date_compact_parens() {
        let n = normalize_model("gpt-4o (20240806)");
        assert_eq!(
            n.release_date,
            Some(NaiveDate::from_ymd_opt(2024, 8, 6).unwrap())
        );
        assert_eq!(n.base_id, "openai-gpt-4o");
    }

    #[test]
    fn test_date_bare_iso() {
        let n = normalize_model("claude-3-opus 2024-02-29");
        assert_eq!(
            n.release_date,
            Some(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_date_month_slash_two_digit_year() {
        let n = normalize_model("sonnet (3/24)");
        assert_eq!(
            n.release_date,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_invalid_date_left_in_family() {
        // 13th month never parses; the token stays in the family text.
        let n = normalize_benchmark("bench 2024-13-01");
        assert!(n.release_date.is_none());
        assert!(n.family.contains("2024"));
    }

    #[test]
    fn test_variant_instruct_stripped() {
        let n = normalize_model("llama-3-8b-instruct");
        assert_eq!(n.variant, "instruct");
        assert_eq!(n.size.as_deref(), Some("8b"));
        assert_eq!(n.provider, "meta");
        assert_eq!(n.base_id, "meta-llama-3-8b");
        assert_eq!(n.canonical_id, "meta-llama-3-8b-instruct");
    }

    #[test]
    fn test_variant_reasoning_not_stripped() {
        let n = normalize_model("deepseek-r1");
        assert_eq!(n.variant, "reasoning");
        assert_eq!(n.family, "r1");
        assert_eq!(n.base_id, "deepseek-r1");
        assert_eq!(n.canonical_id, "deepseek-r1-reasoning");
    }

    #[test]
    fn test_reasoning_takes_precedence_over_preview() {
        let n = normalize_model("o1-preview");
        assert_eq!(n.variant, "reasoning");
        // "preview" is not stripped when the reasoning class wins.
        assert!(n.family.contains("preview"));
    }

    #[test]
    fn test_size_first_match_only() {
        let n = normalize_model("llama-7b-13b");
        assert_eq!(n.size.as_deref(), Some("7b"));
        assert!(n.base_id.contains("13b"));
    }

    #[test]
    fn test_size_quantization_suffix_consumed() {
        let n = normalize_model("llama-2-7b/q4");
        assert_eq!(n.size.as_deref(), Some("7b"));
        assert!(!n.family.contains("q4"));
    }

    #[test]
    fn test_version_extraction() {
        let n = normalize_model("claude-3.5-sonnet");
        assert_eq!(n.version.as_deref(), Some("3.5"));
        assert_eq!(n.provider, "anthropic");
        assert_eq!(n.base_id, "anthropic-claude-sonnet-3-5");
    }

    #[test]
    fn test_mixed_facets() {
        let n = normalize_model("Qwen2.5-72B-Instruct");
        assert_eq!(n.provider, "alibaba");
        assert_eq!(n.version.as_deref(), Some("2.5"));
        assert_eq!(n.size.as_deref(), Some("72b"));
        assert_eq!(n.variant, "instruct");
        assert_eq!(n.base_id, "alibaba-qwen-2-5-72b");
    }

    #[test]
    fn test_provider_table_order_wins() {
        // Both the anthropic and openai patterns match; the table entry that
        // comes first decides.
        let n = normalize_model("claude-vs-gpt-arena");
        assert_eq!(n.provider, "anthropic");
    }

    #[test]
    fn test_provider_fallback_first_token() {
        let n = normalize_benchmark("mmlu-5shot");
        assert_eq!(n.provider, "mmlu");
        assert_eq!(n.family, "5-shot");
        assert_eq!(n.base_id, "mmlu-5-shot");
    }

    #[test]
    fn test_provider_prefix_not_duplicated() {
        let n = normalize_model("anthropic claude 3 opus");
        assert_eq!(n.provider, "anthropic");
        assert_eq!(n.family, "claude-3-opus");
        assert_eq!(n.base_id, "anthropic-claude-3-opus");
    }

    #[test]
    fn test_base_id_groups_siblings() {
        let dated = normalize_model("gpt-4 (2023-06-13)");
        let preview = normalize_model("gpt-4-preview");
        assert_eq!(dated.base_id, preview.base_id);
        assert_ne!(dated.canonical_id, preview.canonical_id);
    }

    #[test]
    fn test_undated_compact_digits_stay_in_family() {
        // Bare 8-digit runs are not in the date priority list and remain in
        // the family text.
        let n = normalize_model("claude-3-5-sonnet-20241022");
        assert!(n.release_date.is_none());
        assert!(n.canonical_id.contains("20241022"));
    }
}
