// ============================================================
// Layer 5 — Prediction Scorer
// ============================================================
// Scores one decoded command against its reference with two
// verdicts, and aggregates verdicts to corpus percentages:
//
//   exact match    — token-for-token equality
//   template match — equality of the command *templates*: the
//                    command trees with every literal argument
//                    masked by its placeholder category, so
//                    predictions that get the command shape
//                    right but the literals wrong still score
//
// The tree topology decodes skeleton token streams; those are
// parsed back into trees first, and an unparseable skeleton
// scores zero on both criteria.

use crate::domain::command_tree::CommandTree;
use crate::domain::topology::DecoderTopology;

/// The two verdicts for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub exact: bool,
    pub template: bool,
}

/// Score decoded tokens against reference tokens.
pub fn score(
    topology: DecoderTopology,
    predicted: &[String],
    reference: &[String],
) -> Verdict {
    match topology {
        DecoderTopology::Flat => {
            let pred_tree = CommandTree::from_tokens(predicted);
            let ref_tree = CommandTree::from_tokens(reference);
            Verdict {
                exact: predicted == reference,
                template: pred_tree.template_tokens() == ref_tree.template_tokens(),
            }
        }
        DecoderTopology::Tree => {
            // Skeleton streams must parse before they can be compared.
            let pred_tree = CommandTree::from_skeleton_tokens(predicted);
            let ref_tree = CommandTree::from_skeleton_tokens(reference);
            match (pred_tree, ref_tree) {
                (Some(p), Some(r)) => Verdict {
                    exact: p == r,
                    template: p.template() == r.template(),
                },
                _ => Verdict { exact: false, template: false },
            }
        }
    }
}

/// Corpus-level accumulator for verdicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalCounts {
    pub examples: usize,
    pub exact_matches: usize,
    pub template_matches: usize,
}

impl EvalCounts {
    pub fn add(&mut self, verdict: Verdict) {
        self.examples += 1;
        if verdict.exact {
            self.exact_matches += 1;
        }
        if verdict.template {
            self.template_matches += 1;
        }
    }

    /// Exact-match accuracy in percent. An empty evaluation set
    /// scores 100 — nothing was wrong (trivially passed, the
    /// same convention as an empty bucket).
    pub fn exact_accuracy(&self) -> f64 {
        if self.examples == 0 {
            return 100.0;
        }
        self.exact_matches as f64 * 100.0 / self.examples as f64
    }

    /// Template-match accuracy in percent.
    pub fn template_accuracy(&self) -> f64 {
        if self.examples == 0 {
            return 100.0;
        }
        self.template_matches as f64 * 100.0 / self.examples as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_exact_match_requires_identical_tokens() {
        let v = score(DecoderTopology::Flat, &toks("find . -empty"), &toks("find . -empty"));
        assert!(v.exact && v.template);
    }

    #[test]
    fn test_template_match_forgives_literals() {
        let v = score(
            DecoderTopology::Flat,
            &toks("find . -name *.sh"),
            &toks("find . -name temp"),
        );
        assert!(!v.exact);
        assert!(v.template);
    }

    #[test]
    fn test_different_flags_fail_both() {
        let v = score(
            DecoderTopology::Flat,
            &toks("find . -name foo"),
            &toks("find . -type f"),
        );
        assert!(!v.exact);
        assert!(!v.template);
    }

    #[test]
    fn test_tree_topology_scores_parsed_skeletons() {
        let reference = CommandTree::from_tokens(&toks("find . -name *.c")).to_skeleton_tokens();
        let predicted = CommandTree::from_tokens(&toks("find . -name foo")).to_skeleton_tokens();
        let v = score(DecoderTopology::Tree, &predicted, &reference);
        assert!(!v.exact);
        assert!(v.template);
    }

    #[test]
    fn test_unparseable_skeleton_scores_zero() {
        let reference = CommandTree::from_tokens(&toks("find .")).to_skeleton_tokens();
        let v = score(DecoderTopology::Tree, &toks("( ( find"), &reference);
        assert!(!v.exact && !v.template);
    }

    #[test]
    fn test_accuracy_aggregation() {
        let mut counts = EvalCounts::default();
        counts.add(Verdict { exact: true, template: true });
        counts.add(Verdict { exact: false, template: true });
        counts.add(Verdict { exact: false, template: false });
        counts.add(Verdict { exact: false, template: false });
        assert!((counts.exact_accuracy() - 25.0).abs() < 1e-12);
        assert!((counts.template_accuracy() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_set_is_trivially_passed() {
        let counts = EvalCounts::default();
        assert_eq!(counts.exact_accuracy(), 100.0);
        assert_eq!(counts.template_accuracy(), 100.0);
    }
}
