// Prompt compression: lossy on prose, lossless on the output schema.
//
// Local models pay for every prompt token in latency and context budget,
// so the compressor trims the parts that least sharpen the decision
// boundary while leaving the fenced schema block intact (minified, never
// reworded). The stages run in a fixed order; conservative output is a
// fixed point, so re-compressing an already-compressed prompt is a no-op.

use regex_lite::{Captures, Regex};

/// How hard to squeeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStrategy {
    /// Whitespace and schema minification only; idempotent
    Conservative,
    /// Also shortens few-shot example texts
    Moderate,
    /// Also drops mid-range exemplars and folds scoring-band descriptions
    Aggressive,
}

/// Compress a system prompt.
///
/// Stages, in order: (1) whitespace normalization, (2) schema-block
/// minification, (3) example shrinking (moderate and up), (4) scoring-band
/// folding (aggressive), (5) emphasis stripping. Mid-range exemplars go
/// first under aggressive because the extreme-score ones carry almost all
/// of the boundary information.
pub fn compress(prompt: &str, strategy: CompressionStrategy) -> String {
    let mut text = normalize_whitespace(prompt);
    text = collapse_schema_block(&text);
    if strategy != CompressionStrategy::Conservative {
        text = shrink_examples(&text, strategy);
    }
    if strategy == CompressionStrategy::Aggressive {
        text = fold_scoring_bands(&text);
    }
    strip_emphasis(&text)
}

/// Approximate fraction of tokens saved by compression, in [0,1].
///
/// This is a character-length ratio, not a tokenizer count: good enough
/// for logging and for choosing a strategy, not for billing math.
pub fn estimate_token_savings(original: &str, compressed: &str) -> f64 {
    let original_len = original.chars().count();
    if original_len == 0 {
        return 0.0;
    }
    let ratio = compressed.chars().count() as f64 / original_len as f64;
    (1.0 - ratio).clamp(0.0, 1.0)
}

/// Collapse runs of spaces within lines and runs of blank lines to one.
fn normalize_whitespace(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Minify the fenced ```json schema block onto a single line.
///
/// The block is whitespace-collapsed, never reworded: the field names and
/// value hints are what keep model output parseable.
fn collapse_schema_block(text: &str) -> String {
    let fence = Regex::new(r"(?s)```json\s+(.*?)\s*```").expect("static regex");
    fence
        .replace_all(text, |caps: &Captures| {
            let one_line = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            format!("```json {one_line} ```")
        })
        .into_owned()
}

/// Few-shot example lines: `- "text" -> score NN, ...`.
///
/// Moderate truncates the example text. Aggressive additionally keeps only
/// extreme-score exemplars (>= 85 or <= 15), since mid-range examples describe
/// cases the bands already cover and sharpen the boundary least.
fn shrink_examples(text: &str, strategy: CompressionStrategy) -> String {
    let example = Regex::new(r#"^- "(.+)" -> score (\d+)(.*)$"#).expect("static regex");
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let Some(caps) = example.captures(line) else {
            out.push(line.to_string());
            continue;
        };
        let score: i64 = caps[2].parse().unwrap_or(50);
        if strategy == CompressionStrategy::Aggressive && score > 15 && score < 85 {
            continue;
        }
        let quoted: String = caps[1].chars().take(30).collect();
        out.push(format!("- \"{}\" -> score {}{}", quoted, score, &caps[3]));
    }
    out.join("\n")
}

/// Fold each scoring band's itemized description to its first item.
fn fold_scoring_bands(text: &str) -> String {
    let band = Regex::new(r"^(\d+)-(\d+): (.*)$").expect("static regex");
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        match band.captures(line) {
            Some(caps) => {
                let head = caps[3].split(',').next().unwrap_or(&caps[3]).trim().to_string();
                out.push(format!("{}-{}: {}", &caps[1], &caps[2], head));
            }
            None => out.push(line.to_string()),
        }
    }
    out.join("\n")
}

/// Strip filler emphasis that spends tokens without changing the policy.
fn strip_emphasis(text: &str) -> String {
    let emphasis = Regex::new(
        r"(?i)\b(please|kindly|very|extremely|really|carefully|strictly|make sure to|be sure to|remember to) ",
    )
    .expect("static regex");
    emphasis.replace_all(text, "").into_owned()
}
