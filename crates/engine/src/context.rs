//! Context assembly — merging ranked passages into one bounded block.
//!
//! The policy is deliberately simple and deterministic:
//! - passages are consumed in the given (score-descending) order
//! - blocks are joined with a blank-line delimiter
//! - assembly stops at the first passage that would exceed the budget
//!   (greedy, passages are never split)
//! - duplicates (exact string match) are included once
//! - if even the best passage exceeds the budget it is truncated to the
//!   limit rather than dropped, since it is the best grounding available
//!
//! Identical inputs always produce identical output. No fuzzy dedup.

use std::collections::HashSet;

use groundwire_core::error::{Error, Result};
use groundwire_core::retrieval::Passage;

/// Delimiter between passages in the assembled block.
const PASSAGE_DELIMITER: &str = "\n\n";

/// The assembled, bounded context text for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    text: String,
    passages_included: usize,
}

impl ContextBlock {
    /// An empty block — the ungrounded case.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            passages_included: 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in chars, which is what the budget bounds.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn passages_included(&self) -> usize {
        self.passages_included
    }
}

/// The context assembler. Stateless — create one per configuration.
pub struct ContextAssembler {
    max_chars: usize,
}

impl ContextAssembler {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Assemble passages into a single bounded block.
    ///
    /// Pure computation over already-fetched data; the only failure is a
    /// zero budget, which config validation rejects at startup.
    pub fn assemble(&self, passages: &[Passage]) -> Result<ContextBlock> {
        if self.max_chars == 0 {
            return Err(Error::config("max_context_chars must be positive"));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut text = String::new();
        let mut used = 0usize;
        let mut included = 0usize;

        for passage in passages {
            // Exact-match dedup: a duplicate is skipped, not a stop.
            if !seen.insert(passage.content.as_str()) {
                continue;
            }

            let delimiter_chars = if text.is_empty() {
                0
            } else {
                PASSAGE_DELIMITER.chars().count()
            };
            let passage_chars = passage.content.chars().count();

            if used + delimiter_chars + passage_chars <= self.max_chars {
                if delimiter_chars > 0 {
                    text.push_str(PASSAGE_DELIMITER);
                }
                text.push_str(&passage.content);
                used += delimiter_chars + passage_chars;
                included += 1;
            } else if text.is_empty() {
                // Even the best passage is over budget: truncate it to the
                // limit on a char boundary rather than dropping it.
                text.extend(passage.content.chars().take(self.max_chars));
                included += 1;
                break;
            } else {
                break;
            }
        }

        Ok(ContextBlock {
            text,
            passages_included: included,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(entries: &[(&str, f32)]) -> Vec<Passage> {
        entries
            .iter()
            .map(|(content, score)| Passage::new(*content, *score))
            .collect()
    }

    #[test]
    fn concatenates_in_order_with_blank_line() {
        let asm = ContextAssembler::new(1_000);
        let block = asm
            .assemble(&passages(&[("first", 0.9), ("second", 0.5)]))
            .unwrap();
        assert_eq!(block.as_str(), "first\n\nsecond");
        assert_eq!(block.passages_included(), 2);
    }

    #[test]
    fn stops_at_first_passage_that_does_not_fit() {
        // "aaaa" (4) + "\n\n" (2) + "bbbb" (4) = 10; a third passage breaks
        // the budget and everything after it is dropped.
        let asm = ContextAssembler::new(10);
        let block = asm
            .assemble(&passages(&[("aaaa", 0.9), ("bbbb", 0.8), ("cc", 0.7)]))
            .unwrap();
        assert_eq!(block.as_str(), "aaaa\n\nbbbb");
        assert_eq!(block.len_chars(), 10);
    }

    #[test]
    fn block_never_exceeds_budget() {
        let asm = ContextAssembler::new(25);
        let block = asm
            .assemble(&passages(&[
                ("some content here", 0.9),
                ("more content here", 0.8),
                ("even more", 0.7),
            ]))
            .unwrap();
        assert!(block.len_chars() <= 25);
    }

    #[test]
    fn unlimited_budget_yields_full_concatenation() {
        let asm = ContextAssembler::new(usize::MAX);
        let block = asm
            .assemble(&passages(&[("a", 0.9), ("b", 0.8), ("c", 0.7)]))
            .unwrap();
        assert_eq!(block.as_str(), "a\n\nb\n\nc");
    }

    #[test]
    fn exact_duplicates_included_once() {
        let asm = ContextAssembler::new(100);
        let block = asm
            .assemble(&passages(&[
                ("Refunds within 30 days", 0.9),
                ("Refunds within 30 days", 0.7),
                ("Shipping takes 5 days", 0.5),
            ]))
            .unwrap();
        assert_eq!(block.as_str(), "Refunds within 30 days\n\nShipping takes 5 days");
        assert_eq!(block.passages_included(), 2);
    }

    #[test]
    fn oversized_best_passage_truncated_not_dropped() {
        let asm = ContextAssembler::new(10);
        let block = asm
            .assemble(&passages(&[("this passage is far too long", 0.9)]))
            .unwrap();
        assert_eq!(block.as_str(), "this passa");
        assert_eq!(block.len_chars(), 10);
        assert_eq!(block.passages_included(), 1);
    }

    #[test]
    fn truncation_lands_on_char_boundary() {
        let asm = ContextAssembler::new(3);
        let block = asm.assemble(&passages(&[("héllo wörld", 0.9)])).unwrap();
        assert_eq!(block.as_str(), "hél");
        assert_eq!(block.len_chars(), 3);
    }

    #[test]
    fn empty_input_yields_empty_block() {
        let asm = ContextAssembler::new(100);
        let block = asm.assemble(&[]).unwrap();
        assert!(block.is_empty());
        assert_eq!(block.passages_included(), 0);
    }

    #[test]
    fn zero_budget_is_a_config_error() {
        let asm = ContextAssembler::new(0);
        let err = asm.assemble(&passages(&[("x", 0.9)])).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn deterministic_assembly() {
        let asm = ContextAssembler::new(50);
        let input = passages(&[("alpha", 0.9), ("beta", 0.8), ("alpha", 0.7)]);
        let a = asm.assemble(&input).unwrap();
        let b = asm.assemble(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_does_not_stop_assembly() {
        // The duplicate in the middle is skipped; assembly continues with
        // the passage after it.
        let asm = ContextAssembler::new(100);
        let block = asm
            .assemble(&passages(&[("one", 0.9), ("one", 0.8), ("two", 0.7)]))
            .unwrap();
        assert_eq!(block.as_str(), "one\n\ntwo");
    }
}
