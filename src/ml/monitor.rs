// ============================================================
// Layer 5 — Progress Monitor
// ============================================================
// Pure bookkeeping for the two training-dynamics decisions:
//
//   learning-rate decay — driven by the *training* loss
//   early stop          — driven by the *validation* loss
//
// Both use the same rule: the newest recorded loss is a
// regression when it strictly exceeds the maximum of the 3
// immediately preceding recorded values. With fewer than 3
// prior values the answer is always "no" — a fresh run must
// never decay or stop on noise from its first checkpoints.
//
// Histories are append-only and owned by one training loop;
// nothing else writes them.

/// Saturating perplexity: exp(loss), reported as +inf once the
/// loss is large enough that exp would be meaningless anyway.
pub fn perplexity(loss: f64) -> f64 {
    if loss <= 300.0 {
        loss.exp()
    } else {
        f64::INFINITY
    }
}

/// An append-only loss history with the last-3 regression rule.
#[derive(Debug, Clone, Default)]
pub struct LossHistory {
    values: Vec<f64>,
}

impl LossHistory {
    pub fn record(&mut self, loss: f64) {
        self.values.push(loss);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Is the newest value strictly worse than every one of the
    /// 3 values recorded just before it?
    pub fn regressed(&self) -> bool {
        let n = self.values.len();
        if n < 4 {
            return false;
        }
        let newest = self.values[n - 1];
        let prior_max = self.values[n - 4..n - 1]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        newest > prior_max
    }
}

/// The checkpoint-time decision maker: records per-checkpoint
/// aggregate losses and answers the decay/stop questions.
#[derive(Debug, Clone, Default)]
pub struct ProgressMonitor {
    training: LossHistory,
    validation: LossHistory,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_training_loss(&mut self, loss: f64) {
        self.training.record(loss);
    }

    pub fn record_validation_loss(&mut self, loss: f64) {
        self.validation.record(loss);
    }

    /// Decay the learning rate when training loss regressed.
    pub fn should_decay_lr(&self) -> bool {
        self.training.regressed()
    }

    /// Stop training when validation loss regressed.
    pub fn should_stop(&self) -> bool {
        self.validation.regressed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_decay_before_three_prior_losses() {
        let mut m = ProgressMonitor::new();
        for loss in [5.0, 6.0, 7.0] {
            m.record_training_loss(loss);
            assert!(!m.should_decay_lr());
        }
    }

    #[test]
    fn test_decay_exactly_when_newest_exceeds_prior_three() {
        let mut m = ProgressMonitor::new();
        for loss in [5.0, 4.0, 3.0] {
            m.record_training_loss(loss);
        }
        m.record_training_loss(4.5);
        // 4.5 is not above max(5.0, 4.0, 3.0)
        assert!(!m.should_decay_lr());
        m.record_training_loss(4.6);
        // prior three are now 4.0, 3.0, 4.5 → 4.6 regresses
        assert!(m.should_decay_lr());
    }

    #[test]
    fn test_equal_to_prior_max_is_not_a_regression() {
        let mut m = ProgressMonitor::new();
        for loss in [5.0, 4.0, 3.0, 5.0] {
            m.record_training_loss(loss);
        }
        assert!(!m.should_decay_lr());
    }

    #[test]
    fn test_early_stop_scenario() {
        let mut m = ProgressMonitor::new();
        for loss in [5.0, 4.0, 3.0] {
            m.record_validation_loss(loss);
            assert!(!m.should_stop());
        }
        m.record_validation_loss(6.0);
        assert!(m.should_stop());
    }

    #[test]
    fn test_perplexity_saturates_above_300() {
        assert!((perplexity(0.0) - 1.0).abs() < 1e-12);
        assert!(perplexity(300.0).is_finite());
        assert!(perplexity(301.0).is_infinite());
    }
}
