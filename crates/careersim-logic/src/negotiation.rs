//! Stakeholder negotiation as a branching dialogue tree.
//!
//! Each node is one line from the counterpart plus the replies the student
//! can pick. Replies shift a running rapport score and point at the next
//! node. Nodes with an [`Ending`] finish the negotiation.
//!
//! ```
//! use careersim_logic::negotiation::{budget_negotiation, validate_tree, Negotiation};
//!
//! let tree = budget_negotiation();
//! assert!(validate_tree(&tree).is_empty());
//! let mut n = Negotiation::new(tree);
//! n.choose(0).unwrap();
//! assert!(n.rapport() > 0);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Rapport at which a compromise counts as a full agreement.
pub const AGREEMENT_RAPPORT: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ending {
    Agreement,
    Compromise,
    Walkout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub rapport_delta: i32,
    pub next: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: u32,
    pub speaker: String,
    pub line: String,
    pub choices: Vec<Choice>,
    pub ending: Option<Ending>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTree {
    pub start: u32,
    pub nodes: Vec<DialogueNode>,
}

impl DialogueTree {
    pub fn node(&self, id: u32) -> Option<&DialogueNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Structural problem found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIssue {
    MissingStart(u32),
    DuplicateNode(u32),
    DanglingChoice { node: u32, target: u32 },
    DeadEnd(u32),
    Unreachable(u32),
}

/// Check a tree for dangling links, dead ends and unreachable nodes.
pub fn validate_tree(tree: &DialogueTree) -> Vec<TreeIssue> {
    let mut issues = Vec::new();

    let mut ids = HashSet::new();
    for n in &tree.nodes {
        if !ids.insert(n.id) {
            issues.push(TreeIssue::DuplicateNode(n.id));
        }
    }
    if !ids.contains(&tree.start) {
        issues.push(TreeIssue::MissingStart(tree.start));
    }

    for n in &tree.nodes {
        if n.choices.is_empty() && n.ending.is_none() {
            issues.push(TreeIssue::DeadEnd(n.id));
        }
        for c in &n.choices {
            if !ids.contains(&c.next) {
                issues.push(TreeIssue::DanglingChoice {
                    node: n.id,
                    target: c.next,
                });
            }
        }
    }

    // BFS from start
    let mut reached = HashSet::new();
    let mut queue = VecDeque::new();
    if ids.contains(&tree.start) {
        reached.insert(tree.start);
        queue.push_back(tree.start);
    }
    while let Some(id) = queue.pop_front() {
        if let Some(node) = tree.node(id) {
            for c in &node.choices {
                if ids.contains(&c.next) && reached.insert(c.next) {
                    queue.push_back(c.next);
                }
            }
        }
    }
    for n in &tree.nodes {
        if !reached.contains(&n.id) && ids.contains(&tree.start) {
            issues.push(TreeIssue::Unreachable(n.id));
        }
    }

    issues
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    Finished,
    InvalidChoice { index: usize, available: usize },
    BrokenLink(u32),
}

impl std::fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationError::Finished => write!(f, "negotiation already finished"),
            NegotiationError::InvalidChoice { index, available } => {
                write!(f, "choice {} out of range ({} available)", index, available)
            }
            NegotiationError::BrokenLink(id) => write!(f, "dialogue node {} does not exist", id),
        }
    }
}

impl std::error::Error for NegotiationError {}

/// Result of picking a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue { node: u32 },
    Ended(Ending),
}

/// A negotiation in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiation {
    tree: DialogueTree,
    current: u32,
    rapport: i32,
    /// Reply texts picked, in order.
    transcript: Vec<String>,
    ending: Option<Ending>,
}

impl Negotiation {
    pub fn new(tree: DialogueTree) -> Self {
        let current = tree.start;
        let ending = tree.node(current).and_then(|n| n.ending);
        Self {
            tree,
            current,
            rapport: 0,
            transcript: Vec::new(),
            ending,
        }
    }

    pub fn current(&self) -> Option<&DialogueNode> {
        self.tree.node(self.current)
    }

    pub fn rapport(&self) -> i32 {
        self.rapport
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn is_finished(&self) -> bool {
        self.ending.is_some()
    }

    /// Final ending, with compromises upgraded at high rapport.
    pub fn outcome(&self) -> Option<Ending> {
        self.ending.map(|e| match e {
            Ending::Compromise if self.rapport >= AGREEMENT_RAPPORT => Ending::Agreement,
            other => other,
        })
    }

    pub fn choose(&mut self, index: usize) -> Result<Step, NegotiationError> {
        if self.ending.is_some() {
            return Err(NegotiationError::Finished);
        }
        let node = self
            .tree
            .node(self.current)
            .ok_or(NegotiationError::BrokenLink(self.current))?;
        let choice = node
            .choices
            .get(index)
            .ok_or(NegotiationError::InvalidChoice {
                index,
                available: node.choices.len(),
            })?
            .clone();
        let next = self
            .tree
            .node(choice.next)
            .ok_or(NegotiationError::BrokenLink(choice.next))?;
        let ending = next.ending;

        self.rapport += choice.rapport_delta;
        self.transcript.push(choice.text);
        self.current = choice.next;

        match ending {
            Some(e) => {
                self.ending = Some(e);
                Ok(Step::Ended(self.outcome().unwrap_or(e)))
            }
            None => Ok(Step::Continue { node: self.current }),
        }
    }
}

fn choice(text: &str, rapport_delta: i32, next: u32) -> Choice {
    Choice {
        text: text.to_string(),
        rapport_delta,
        next,
    }
}

fn node(id: u32, speaker: &str, line: &str, choices: Vec<Choice>) -> DialogueNode {
    DialogueNode {
        id,
        speaker: speaker.to_string(),
        line: line.to_string(),
        choices,
        ending: None,
    }
}

fn ending(id: u32, speaker: &str, line: &str, ending: Ending) -> DialogueNode {
    DialogueNode {
        id,
        speaker: speaker.to_string(),
        line: line.to_string(),
        choices: Vec::new(),
        ending: Some(ending),
    }
}

/// Finance-track negotiation with a department head over a budget cut.
pub fn budget_negotiation() -> DialogueTree {
    let head = "Department Head";
    DialogueTree {
        start: 0,
        nodes: vec![
            node(
                0,
                head,
                "Finance wants a 15% cut to my department. Why should I accept that?",
                vec![
                    choice("I hear you. Can we walk through which programs matter most?", 2, 1),
                    choice("The numbers are final. The cut goes ahead.", -2, 2),
                    choice("Let's look at the spending data together first.", 1, 3),
                ],
            ),
            node(
                1,
                head,
                "Outreach and training are critical. Equipment upgrades could wait.",
                vec![
                    choice("Then we protect outreach and phase the equipment budget.", 2, 4),
                    choice("Everything needs to shrink equally.", -1, 3),
                ],
            ),
            node(
                2,
                head,
                "If that's how it is, I'll take this to the board.",
                vec![
                    choice("Before you do, what would make this workable for you?", 2, 1),
                    choice("Go ahead.", -3, 6),
                ],
            ),
            node(
                3,
                head,
                "The data shows travel overspent by 20%. But a flat cut still hurts us.",
                vec![
                    choice("Cutting travel first covers most of the gap.", 2, 4),
                    choice("We could split the difference at 10%.", 0, 5),
                ],
            ),
            ending(
                4,
                head,
                "That's a plan I can support. Let's put it in writing.",
                Ending::Agreement,
            ),
            ending(
                5,
                head,
                "Ten percent. Not ideal, but I can live with it.",
                Ending::Compromise,
            ),
            ending(6, head, "We're done here.", Ending::Walkout),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_tree_is_valid() {
        assert!(validate_tree(&budget_negotiation()).is_empty());
    }

    #[test]
    fn empathetic_path_reaches_agreement() {
        let mut n = Negotiation::new(budget_negotiation());
        assert_eq!(n.choose(0), Ok(Step::Continue { node: 1 }));
        assert_eq!(n.choose(0), Ok(Step::Ended(Ending::Agreement)));
        assert_eq!(n.rapport(), 4);
        assert_eq!(n.transcript().len(), 2);
        assert_eq!(n.choose(0), Err(NegotiationError::Finished));
    }

    #[test]
    fn hostile_path_walks_out() {
        let mut n = Negotiation::new(budget_negotiation());
        n.choose(1).unwrap();
        assert_eq!(n.choose(1), Ok(Step::Ended(Ending::Walkout)));
        assert_eq!(n.rapport(), -5);
    }

    #[test]
    fn compromise_stays_compromise_at_low_rapport() {
        let mut n = Negotiation::new(budget_negotiation());
        n.choose(2).unwrap(); // +1
        assert_eq!(n.choose(1), Ok(Step::Ended(Ending::Compromise)));
        assert_eq!(n.outcome(), Some(Ending::Compromise));
    }

    #[test]
    fn compromise_upgrades_at_high_rapport() {
        let mut n = Negotiation::new(budget_negotiation());
        n.choose(0).unwrap(); // +2 -> node 1
        n.choose(1).unwrap(); // -1 -> node 3
        // rapport 1; split the difference keeps it at 1
        assert_eq!(n.choose(1), Ok(Step::Ended(Ending::Compromise)));

        let mut tree = budget_negotiation();
        tree.nodes[3].choices[1].rapport_delta = 3;
        let mut n = Negotiation::new(tree);
        n.choose(2).unwrap(); // +1
        assert_eq!(n.choose(1), Ok(Step::Ended(Ending::Agreement)));
    }

    #[test]
    fn invalid_choice_rejected() {
        let mut n = Negotiation::new(budget_negotiation());
        assert_eq!(
            n.choose(7),
            Err(NegotiationError::InvalidChoice {
                index: 7,
                available: 3
            })
        );
        assert_eq!(n.rapport(), 0);
    }

    #[test]
    fn validation_finds_problems() {
        let tree = DialogueTree {
            start: 0,
            nodes: vec![
                node(0, "A", "hi", vec![choice("go", 0, 9)]),
                node(1, "A", "stuck", vec![]),
            ],
        };
        let issues = validate_tree(&tree);
        assert!(issues.contains(&TreeIssue::DanglingChoice { node: 0, target: 9 }));
        assert!(issues.contains(&TreeIssue::DeadEnd(1)));
        assert!(issues.contains(&TreeIssue::Unreachable(1)));
    }

    #[test]
    fn missing_start_reported() {
        let tree = DialogueTree {
            start: 5,
            nodes: vec![ending(0, "A", "bye", Ending::Walkout)],
        };
        assert_eq!(validate_tree(&tree), vec![TreeIssue::MissingStart(5)]);
    }
}
