use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum characters per chunk sent to a provider
pub const DEFAULT_CHUNK_SIZE: usize = 500;

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// Split text into sentences on terminal punctuation followed by whitespace.
///
/// Punctuation stays with its sentence; decimals such as `1.5` are not split.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_END_RE.find_iter(text) {
        let end = boundary.start() + boundary.as_str().trim_end().len();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Split text into chunks of at most `max_size` characters without breaking sentences.
///
/// A single sentence longer than `max_size` becomes its own oversized chunk.
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    if text.chars().count() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if buffer.is_empty() {
            buffer.push_str(sentence);
            buffer_len = sentence_len;
        } else if buffer_len + 1 + sentence_len <= max_size {
            buffer.push(' ');
            buffer.push_str(sentence);
            buffer_len += 1 + sentence_len;
        } else {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(sentence);
            buffer_len = sentence_len;
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let text = "Bitcoin rose 2.5% today. Is this the top? Analysts say no! Markets remain open";
        assert_eq!(
            split_sentences(text),
            vec![
                "Bitcoin rose 2.5% today.",
                "Is this the top?",
                "Analysts say no!",
                "Markets remain open",
            ]
        );
    }

    #[test]
    fn test_split_keeps_repeated_punctuation() {
        assert_eq!(split_sentences("Wow!!! Really?! Yes."), vec!["Wow!!!", "Really?!", "Yes."]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "Ether climbed. Solana slipped.";
        assert_eq!(chunk(text, 500), vec![text.to_string()]);
    }

    #[test]
    fn test_chunks_respect_limit_and_order() {
        let sentences: Vec<String> = (0..30)
            .map(|i| format!("Sentence number {} talks about the crypto market.", i))
            .collect();
        let text = sentences.join(" ");

        let chunks = chunk(&text, 120);

        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 120, "chunk too long: {}", c);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_sentence_exactly_filling_chunk_is_appended() {
        // "Aaaa. Bbbb." is exactly 11 chars
        let text = "Aaaa. Bbbb. Cccc.";
        assert_eq!(chunk(text, 11), vec!["Aaaa. Bbbb.".to_string(), "Cccc.".to_string()]);
        assert_eq!(
            chunk(text, 10),
            vec!["Aaaa.".to_string(), "Bbbb.".to_string(), "Cccc.".to_string()]
        );
    }

    #[test]
    fn test_oversized_sentence_is_kept_whole() {
        let long = format!("{}.", "a".repeat(80));
        let text = format!("Short one. {} Short two.", long);

        let chunks = chunk(&text, 40);

        assert_eq!(chunks, vec!["Short one.".to_string(), long.clone(), "Short two.".to_string()]);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        let text = "Şirket büyüdü. Öğrenciler çalıştı.";
        assert_eq!(chunk(text, 34), vec![text.to_string()]);
    }
}
