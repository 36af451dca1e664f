// ============================================================
// Layer 4 — Corpus Statistics
// ============================================================
// The data-statistics mode reports, per split, how many
// *distinct* descriptions and commands the corpus holds. Many
// descriptions map to the same command (and the other way
// around), so these counts differ from the raw example count
// and are the honest measure of corpus variety.

use std::collections::HashSet;

use crate::domain::example::Example;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitStats {
    pub examples: usize,
    pub distinct_descriptions: usize,
    pub distinct_commands: usize,
}

/// Group-by-description and group-by-command counts for a split.
pub fn split_statistics(examples: &[Example]) -> SplitStats {
    let descriptions: HashSet<&[u32]> =
        examples.iter().map(|e| e.source_ids.as_slice()).collect();
    let commands: HashSet<&[u32]> =
        examples.iter().map(|e| e.target_ids.as_slice()).collect();

    SplitStats {
        examples: examples.len(),
        distinct_descriptions: descriptions.len(),
        distinct_commands: commands.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_counted_once() {
        let examples = vec![
            Example::new(vec![1, 2], vec![9]),
            Example::new(vec![1, 2], vec![8]), // same description, new command
            Example::new(vec![3], vec![9]),    // new description, same command
        ];
        let stats = split_statistics(&examples);
        assert_eq!(stats.examples, 3);
        assert_eq!(stats.distinct_descriptions, 2);
        assert_eq!(stats.distinct_commands, 2);
    }

    #[test]
    fn test_empty_split() {
        let stats = split_statistics(&[]);
        assert_eq!(stats.examples, 0);
        assert_eq!(stats.distinct_descriptions, 0);
        assert_eq!(stats.distinct_commands, 0);
    }
}
