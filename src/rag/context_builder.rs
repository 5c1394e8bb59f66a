//! Context assembly.
//!
//! Turns ranked documents into a single prompt-ready string:
//! 1. Skip documents without `metadata.text`
//! 2. Optionally prefix each chunk with its similarity score
//! 3. Stop before the first chunk that would overflow the character budget
//! 4. Join the kept chunks with a fixed separator

use super::store::RetrievedDocument;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Configuration for context assembly.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilderConfig {
    /// Prefix each chunk with `[Score: x.xxxx]`
    pub include_scores: bool,
    /// Character budget over chunk bodies (separators are not counted); 0 disables it
    pub max_context_length: Option<usize>,
}

pub struct ContextAssembler {
    config: ContextBuilderConfig,
}

impl ContextAssembler {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    /// Plain text, no scores, no budget.
    pub fn unbounded() -> Self {
        Self::new(ContextBuilderConfig::default())
    }

    pub fn with_scores(include_scores: bool) -> Self {
        Self::new(ContextBuilderConfig {
            include_scores,
            max_context_length: None,
        })
    }

    pub fn assemble(&self, documents: &[RetrievedDocument]) -> String {
        let mut chunks: Vec<String> = Vec::with_capacity(documents.len());
        let mut current_length = 0usize;

        for doc in documents {
            let Some(text) = doc.text().filter(|t| !t.is_empty()) else {
                continue;
            };

            let chunk = if self.config.include_scores {
                format!("[Score: {:.4}]\n{}", doc.score, text)
            } else {
                text.to_string()
            };

            // a zero budget means no cap
            if let Some(max_length) = self.config.max_context_length.filter(|m| *m > 0) {
                let chunk_length = chunk.chars().count();
                if current_length + chunk_length > max_length {
                    break;
                }
                current_length += chunk_length;
            }

            chunks.push(chunk);
        }

        chunks.join(CONTEXT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn doc(id: &str, score: f32, text: Option<Value>) -> RetrievedDocument {
        let mut metadata = Map::new();
        if let Some(text) = text {
            metadata.insert("text".to_string(), text);
        }
        metadata.insert("source".to_string(), json!("notes.pdf"));
        RetrievedDocument {
            id: id.to_string(),
            score,
            metadata,
        }
    }

    fn texts(values: &[&str]) -> Vec<RetrievedDocument> {
        values
            .iter()
            .enumerate()
            .map(|(i, t)| doc(&format!("d{}", i), 0.9, Some(json!(t))))
            .collect()
    }

    #[test]
    fn joins_in_ranked_order() {
        let context = ContextAssembler::unbounded().assemble(&texts(&["A", "B", "C"]));
        assert_eq!(context, "A\n\n---\n\nB\n\n---\n\nC");
    }

    #[test]
    fn empty_input_gives_empty_context() {
        assert_eq!(ContextAssembler::unbounded().assemble(&[]), "");
    }

    #[test]
    fn first_chunk_over_budget_yields_nothing() {
        let assembler = ContextAssembler::new(ContextBuilderConfig {
            include_scores: false,
            max_context_length: Some(3),
        });
        assert_eq!(assembler.assemble(&texts(&["Hello", "B"])), "");
    }

    #[test]
    fn stops_at_first_overflow_without_skipping_ahead() {
        let assembler = ContextAssembler::new(ContextBuilderConfig {
            include_scores: false,
            max_context_length: Some(6),
        });
        // "abc" (3) fits, "defgh" (8 total) does not; "i" would fit but is never reached
        assert_eq!(assembler.assemble(&texts(&["abc", "defgh", "i"])), "abc");
    }

    #[test]
    fn zero_budget_keeps_everything() {
        let assembler = ContextAssembler::new(ContextBuilderConfig {
            include_scores: false,
            max_context_length: Some(0),
        });
        assert_eq!(
            assembler.assemble(&texts(&["abc", "defgh"])),
            "abc\n\n---\n\ndefgh"
        );
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let assembler = ContextAssembler::new(ContextBuilderConfig {
            include_scores: false,
            max_context_length: Some(4),
        });
        assert_eq!(assembler.assemble(&texts(&["né", "ü"])), "né\n\n---\n\nü");
    }

    #[test]
    fn skips_documents_without_text() {
        let docs = vec![
            doc("a", 0.9, Some(json!("A"))),
            doc("b", 0.8, None),
            doc("c", 0.7, Some(json!(""))),
            doc("d", 0.6, Some(json!(42))),
            doc("e", 0.5, Some(json!("E"))),
        ];
        assert_eq!(
            ContextAssembler::unbounded().assemble(&docs),
            "A\n\n---\n\nE"
        );
    }

    #[test]
    fn score_prefix_uses_four_decimals() {
        let docs = vec![doc("a", 0.87654, Some(json!("alpha"))), doc("b", 0.5, Some(json!("beta")))];
        assert_eq!(
            ContextAssembler::with_scores(true).assemble(&docs),
            "[Score: 0.8765]\nalpha\n\n---\n\n[Score: 0.5000]\nbeta"
        );
    }
}
