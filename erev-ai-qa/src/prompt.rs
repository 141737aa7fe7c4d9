//! Prompt assembly for the answer composer.
//!
//! A prompt has three parts, concatenated in a fixed shape: the instruction
//! preamble, the retrieved chunks (in retrieval order, each tagged with its
//! source and score), and the original question. Keeping the shape fixed
//! makes generation behavior reproducible across runs against the same
//! index.

use erev_ai_index::SearchHit;

/// The instruction preamble sent as the system message.
pub fn system_prompt() -> &'static str {
    "You are 'EREV Copilot', a technical assistant for an academic project on \
     Extended-Range Electric Vehicles (EREVs), EV miles electrification, CO2 \
     savings, and transportation costs.\n\n\
     Use ONLY the provided context and basic arithmetic. If something is not in \
     the context, say you don't know instead of guessing.\n\n\
     Explain clearly and concisely, and whenever possible relate answers to:\n\
     - share of EV miles vs total VMT,\n\
     - range trade-offs (short-range BEV, EREV, long-range BEV),\n\
     - emissions and cost per mile.\n"
}

/// Render retrieved chunks as tagged context blocks, in retrieval order.
pub fn format_context(hits: &[SearchHit]) -> String {
    let blocks: Vec<String> = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[Chunk {} | score={:.3} | source={}]\n{}\n",
                i + 1,
                hit.score,
                hit.chunk.source,
                hit.chunk.text
            )
        })
        .collect();
    blocks.join("\n\n")
}

/// Build the user message: instructions, the question, then the context.
pub fn user_prompt(question: &str, hits: &[SearchHit]) -> String {
    format!(
        "Answer the question using ONLY the context below. \
         If there is missing information, be explicit about what is unknown.\n\n\
         Question:\n{question}\n\n\
         Context:\n{context}",
        context = format_context(hits)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use erev_ai_context::Chunk;

    fn hit(seq: usize, score: f32, source: &str, text: &str) -> SearchHit {
        SearchHit {
            chunk: Chunk {
                doc_id: "doc-0".to_string(),
                source: source.to_string(),
                sequence: seq,
                start: 0,
                end: text.chars().count(),
                text: text.to_string(),
            },
            score,
            position: seq,
        }
    }

    #[test]
    fn test_context_blocks_keep_retrieval_order() {
        let hits = vec![
            hit(3, 0.91, "paper.pdf", "EREVs switch to a range extender."),
            hit(0, 0.40, "notes.md", "Battery costs fall with scale."),
        ];
        let context = format_context(&hits);

        let first = context.find("[Chunk 1 | score=0.910 | source=paper.pdf]").unwrap();
        let second = context.find("[Chunk 2 | score=0.400 | source=notes.md]").unwrap();
        assert!(first < second);
        assert!(context.contains("EREVs switch to a range extender."));
    }

    #[test]
    fn test_user_prompt_contains_question_and_context() {
        let hits = vec![hit(0, 1.0, "paper.pdf", "Context sentence.")];
        let prompt = user_prompt("How far on battery alone?", &hits);

        assert!(prompt.contains("Question:\nHow far on battery alone?"));
        assert!(prompt.contains("Context sentence."));
        assert!(prompt.contains("using ONLY the context"));
    }

    #[test]
    fn test_empty_context_renders_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
