use crate::common::*;

/// Keeps one in every `every` candidates, starting from the first.
///
/// The count runs across every sequence handed to the same decimator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimator {
    every: NonZeroUsize,
    seen: usize,
}

impl Decimator {
    pub fn new(every: NonZeroUsize) -> Self {
        Self { every, seen: 0 }
    }

    /// The number of candidates offered so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Count a candidate and tell whether it is kept.
    pub fn admit(&mut self) -> bool {
        self.seen += 1;
        let every = self.every.get();
        self.seen % every == 1 % every
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(every: usize, candidates: usize) -> Vec<usize> {
        let mut decimator = Decimator::new(NonZeroUsize::new(every).unwrap());
        (1..=candidates).filter(|_| decimator.admit()).collect()
    }

    #[test]
    fn keep_one_in_ten() {
        assert_eq!(kept(10, 30), vec![1, 11, 21]);
        assert_eq!(kept(10, 9), vec![1]);
    }

    #[test]
    fn keep_everything() {
        assert_eq!(kept(1, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn count_persists_across_sequences() {
        let mut decimator = Decimator::new(NonZeroUsize::new(10).unwrap());
        let first: usize = (0..7).filter(|_| decimator.admit()).count();
        let second: Vec<_> = (0..7).map(|_| decimator.admit()).collect();
        assert_eq!(first, 1);
        assert_eq!(decimator.seen(), 14);
        assert!(second[3]);
        assert_eq!(second.iter().filter(|&&keep| keep).count(), 1);
    }
}
