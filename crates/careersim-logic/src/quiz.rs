//! Periodic-table matching quiz.
//!
//! The student matches element symbols to names before entering the lab.
//! Presentation order is supplied by the caller so the quiz itself stays
//! deterministic.

use serde::{Deserialize, Serialize};

/// Accuracy needed to pass (correct / all answers given).
pub const QUIZ_PASS_ACCURACY: f32 = 0.8;

/// Broad element family, used for hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    AlkalineEarth,
    TransitionMetal,
    NonMetal,
    NobleGas,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub symbol: String,
    pub name: String,
    pub atomic_number: u8,
    pub category: ElementCategory,
}

impl Element {
    fn new(symbol: &str, name: &str, atomic_number: u8, category: ElementCategory) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            atomic_number,
            category,
        }
    }
}

/// Elements that appear in the superconductor lab.
pub fn standard_elements() -> Vec<Element> {
    use ElementCategory::*;
    vec![
        Element::new("H", "Hydrogen", 1, NonMetal),
        Element::new("He", "Helium", 2, NobleGas),
        Element::new("C", "Carbon", 6, NonMetal),
        Element::new("N", "Nitrogen", 7, NonMetal),
        Element::new("O", "Oxygen", 8, NonMetal),
        Element::new("Fe", "Iron", 26, TransitionMetal),
        Element::new("Ni", "Nickel", 28, TransitionMetal),
        Element::new("Cu", "Copper", 29, TransitionMetal),
        Element::new("Y", "Yttrium", 39, TransitionMetal),
        Element::new("Ag", "Silver", 47, TransitionMetal),
        Element::new("Ba", "Barium", 56, AlkalineEarth),
        Element::new("Pt", "Platinum", 78, TransitionMetal),
    ]
}

/// Result of one match attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Correct,
    Incorrect,
    AlreadyMatched,
    UnknownSymbol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingQuiz {
    elements: Vec<Element>,
    /// Presentation order as indices into `elements`.
    order: Vec<usize>,
    matched: Vec<bool>,
    mistakes: u32,
}

impl MatchingQuiz {
    /// Build a quiz. Invalid or duplicate indices in `order` are dropped and
    /// missing ones appended, so every element is presented exactly once.
    pub fn new(elements: Vec<Element>, order: Vec<usize>) -> Self {
        let n = elements.len();
        let mut seen = vec![false; n];
        let mut clean = Vec::with_capacity(n);
        for i in order {
            if i < n && !seen[i] {
                seen[i] = true;
                clean.push(i);
            }
        }
        for (i, s) in seen.iter().enumerate() {
            if !s {
                clean.push(i);
            }
        }
        Self {
            matched: vec![false; n],
            elements,
            order: clean,
            mistakes: 0,
        }
    }

    /// Symbols in presentation order.
    pub fn prompts(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.elements[i].symbol.as_str())
            .collect()
    }

    /// Match `symbol` (case-sensitive, as printed on the table) to `name`
    /// (case-insensitive, trimmed).
    pub fn answer(&mut self, symbol: &str, name: &str) -> MatchResult {
        let Some(i) = self.elements.iter().position(|e| e.symbol == symbol.trim()) else {
            return MatchResult::UnknownSymbol;
        };
        if self.matched[i] {
            return MatchResult::AlreadyMatched;
        }
        if self.elements[i].name.eq_ignore_ascii_case(name.trim()) {
            self.matched[i] = true;
            MatchResult::Correct
        } else {
            self.mistakes += 1;
            MatchResult::Incorrect
        }
    }

    pub fn correct(&self) -> u32 {
        self.matched.iter().filter(|m| **m).count() as u32
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn finished(&self) -> bool {
        self.matched.iter().all(|m| *m)
    }

    /// Correct answers over all answers given; 1.0 before any answer.
    pub fn accuracy(&self) -> f32 {
        let total = self.correct() + self.mistakes;
        if total == 0 {
            1.0
        } else {
            self.correct() as f32 / total as f32
        }
    }

    pub fn passed(&self) -> bool {
        self.finished() && self.accuracy() >= QUIZ_PASS_ACCURACY
    }

    /// Category hint for an unmatched symbol.
    pub fn hint(&self, symbol: &str) -> Option<ElementCategory> {
        self.elements
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> MatchingQuiz {
        MatchingQuiz::new(standard_elements(), vec![])
    }

    #[test]
    fn twelve_unique_elements() {
        let els = standard_elements();
        assert_eq!(els.len(), 12);
        let mut symbols: Vec<_> = els.iter().map(|e| e.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), 12);
    }

    #[test]
    fn order_is_sanitised() {
        let q = MatchingQuiz::new(standard_elements(), vec![3, 3, 99, 0]);
        let prompts = q.prompts();
        assert_eq!(prompts.len(), 12);
        assert_eq!(prompts[0], "N");
        assert_eq!(prompts[1], "H");
    }

    #[test]
    fn answers_are_case_insensitive() {
        let mut q = quiz();
        assert_eq!(q.answer("Cu", "  copper "), MatchResult::Correct);
        assert_eq!(q.answer("Cu", "Copper"), MatchResult::AlreadyMatched);
        assert_eq!(q.answer("Xx", "Unobtainium"), MatchResult::UnknownSymbol);
        assert_eq!(q.answer("Ag", "Gold"), MatchResult::Incorrect);
        assert_eq!(q.mistakes(), 1);
    }

    #[test]
    fn perfect_run_passes() {
        let mut q = quiz();
        for e in standard_elements() {
            assert_eq!(q.answer(&e.symbol, &e.name), MatchResult::Correct);
        }
        assert!(q.finished());
        assert!(q.passed());
    }

    #[test]
    fn too_many_mistakes_fails() {
        let mut q = quiz();
        for e in standard_elements() {
            q.answer(&e.symbol, "wrong");
            q.answer(&e.symbol, &e.name);
        }
        assert!(q.finished());
        assert!((q.accuracy() - 0.5).abs() < f32::EPSILON);
        assert!(!q.passed());
    }

    #[test]
    fn unfinished_quiz_not_passed() {
        let mut q = quiz();
        q.answer("O", "Oxygen");
        assert!(!q.passed());
    }
}
