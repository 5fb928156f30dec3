//! Lazy permutation production for the layer-ordering search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;

use u_loading_core::CancellationToken;

/// Index permutations of `0..n` in lexicographic order, starting with the
/// identity.
#[derive(Debug, Clone)]
pub struct Permutations {
    indices: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl Permutations {
    /// Creates the sequence for `n` elements. Zero elements yield one empty
    /// permutation.
    pub fn new(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
            started: false,
            exhausted: false,
        }
    }

    fn advance(&mut self) -> bool {
        let n = self.indices.len();
        if n < 2 {
            return false;
        }
        let Some(pivot) = (0..n - 1).rev().find(|&i| self.indices[i] < self.indices[i + 1]) else {
            return false;
        };
        let successor = (pivot + 1..n)
            .rev()
            .find(|&j| self.indices[j] > self.indices[pivot])
            .unwrap_or(pivot + 1);
        self.indices.swap(pivot, successor);
        self.indices[pivot + 1..].reverse();
        true
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }
        if self.advance() {
            Some(self.indices.clone())
        } else {
            self.exhausted = true;
            None
        }
    }
}

/// Feeds permutations of `0..n` into `sender` until they run out, the
/// consumer hangs up, `stop` is raised or `token` is cancelled.
///
/// A closed channel is a normal end of production.
pub fn produce(n: usize, sender: SyncSender<Vec<usize>>, stop: &AtomicBool, token: &CancellationToken) {
    for order in Permutations::new(n) {
        if stop.load(Ordering::Relaxed) || token.is_cancelled() {
            log::trace!("permutation producer stopped");
            return;
        }
        if sender.send(order).is_err() {
            log::trace!("permutation stream closed by consumer");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_lexicographic_order() {
        let all: Vec<_> = Permutations::new(3).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }

    #[test]
    fn test_trivial_sizes() {
        assert_eq!(Permutations::new(0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Permutations::new(1).collect::<Vec<_>>(), vec![vec![0]]);
        assert_eq!(Permutations::new(5).count(), 120);
    }

    #[test]
    fn test_producer_ends_on_closed_stream() {
        let (sender, receiver) = mpsc::sync_channel(1);
        let stop = AtomicBool::new(false);
        let token = CancellationToken::new();
        std::thread::scope(|s| {
            s.spawn(|| produce(6, sender, &stop, &token));
            let first = receiver.recv().unwrap();
            assert_eq!(first, vec![0, 1, 2, 3, 4, 5]);
            drop(receiver);
        });
    }

    #[test]
    fn test_producer_respects_stop_flag() {
        let (sender, receiver) = mpsc::sync_channel(16);
        let stop = AtomicBool::new(true);
        produce(4, sender, &stop, &CancellationToken::new());
        assert!(receiver.try_recv().is_err());
    }
}
