//! Model-failure risk heuristic.
//!
//! Transformer NER models degrade badly on text that does not look like
//! prose: OCR noise, tables of digits, base64 blobs, control characters.
//! This heuristic scores that risk from character statistics so the
//! extractor can skip the model call and go straight to patterns.

/// Score the risk that the NER model will produce garbage for this text.
///
/// Returns a score in [0, 1]; higher means riskier. Empty input is
/// maximally risky.
pub fn failure_risk(text: &str) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return 1.0;
    }
    let total = chars.len() as f64;

    let non_alnum = chars
        .iter()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count() as f64
        / total;

    let digits = chars.iter().filter(|c| c.is_ascii_digit()).count() as f64 / total;

    let control = chars
        .iter()
        .filter(|c| c.is_control() && **c != '\n' && **c != '\t' && **c != '\r')
        .count() as f64
        / total;

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let avg_token_len = if tokens.is_empty() {
        0.0
    } else {
        tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64 / tokens.len() as f64
    };
    // Prose averages ~5 chars per word; very long "words" suggest blobs
    let token_len_risk = ((avg_token_len - 12.0) / 20.0).clamp(0.0, 1.0);

    let longest_upper_run = chars
        .iter()
        .fold((0usize, 0usize), |(best, run), c| {
            if c.is_uppercase() {
                (best.max(run + 1), run + 1)
            } else {
                (best, 0)
            }
        })
        .0;
    let upper_run_risk = ((longest_upper_run as f64 - 8.0) / 24.0).clamp(0.0, 1.0);

    let score = 0.3 * (non_alnum * 3.0).min(1.0)
        + 0.25 * (digits * 2.5).min(1.0)
        + 0.2 * token_len_risk
        + 0.15 * upper_run_risk
        + 0.1 * (control * 10.0).min(1.0);

    score.clamp(0.0, 1.0)
}
