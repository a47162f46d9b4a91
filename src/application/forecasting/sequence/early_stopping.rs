/// Outcome of recording one epoch's monitored loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochVerdict {
    Improved,
    Stalled,
    Stop,
}

/// Patience-based early stopping with a best-weights snapshot.
///
/// Only a strictly lower finite loss counts as improvement.
#[derive(Debug, Clone)]
pub struct EarlyStopping<W> {
    patience: usize,
    best_loss: f64,
    best_epoch: usize,
    stale_epochs: usize,
    best_weights: Option<W>,
}

impl<W: Clone> EarlyStopping<W> {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss: f64::INFINITY,
            best_epoch: 0,
            stale_epochs: 0,
            best_weights: None,
        }
    }

    pub fn observe(&mut self, epoch: usize, loss: f64, weights: &W) -> EpochVerdict {
        if loss.is_finite() && loss < self.best_loss {
            self.best_loss = loss;
            self.best_epoch = epoch;
            self.stale_epochs = 0;
            self.best_weights = Some(weights.clone());
            return EpochVerdict::Improved;
        }

        self.stale_epochs += 1;
        if self.stale_epochs >= self.patience {
            EpochVerdict::Stop
        } else {
            EpochVerdict::Stalled
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> usize {
        self.best_epoch
    }

    /// Replace `weights` with the best snapshot, if one was taken.
    pub fn restore_best(self, weights: &mut W) -> bool {
        match self.best_weights {
            Some(best) => {
                *weights = best;
                true
            }
            None => false,
        }
    }
}
