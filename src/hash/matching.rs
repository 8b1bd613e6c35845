// Match record shared by every lookup.
//
// A `Match` starts empty and only ever grows: a candidate replaces it when
// strictly longer, so among equally long candidates the first one probed
// wins.

/// A run of equal bytes between a source and the target.
///
/// `source_offset` is in the source's biased address space (dictionary
/// offsets first, then target offsets shifted by the dictionary size);
/// `target_offset` is relative to the target position the lookup was
/// anchored at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Match {
    size: usize,
    source_offset: Option<usize>,
    target_offset: Option<usize>,
}

impl Match {
    /// Empty match: size 0, offsets unset.
    pub const fn new() -> Self {
        Self {
            size: 0,
            source_offset: None,
            target_offset: None,
        }
    }

    /// Length of the match in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Start of the match in the source, `None` while empty.
    #[inline]
    pub fn source_offset(&self) -> Option<usize> {
        self.source_offset
    }

    /// Start of the match in the target, `None` while empty.
    #[inline]
    pub fn target_offset(&self) -> Option<usize> {
        self.target_offset
    }

    /// True until a candidate has been accepted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Replace the recorded match if `size` is strictly larger.
    ///
    /// Returns whether the candidate was taken.
    #[inline]
    pub fn replace_if_better(&mut self, size: usize, source_offset: usize, target_offset: usize) -> bool {
        if size > self.size {
            self.size = size;
            self.source_offset = Some(source_offset);
            self.target_offset = Some(target_offset);
            true
        } else {
            false
        }
    }

    /// Same match with its target offset moved by `delta`.
    #[inline]
    pub(crate) fn shift_target(self, delta: usize) -> Self {
        Self {
            target_offset: self.target_offset.map(|t| t + delta),
            ..self
        }
    }

    /// End of the match in the target (exclusive).
    #[inline]
    pub fn target_end(&self) -> Option<usize> {
        self.target_offset.map(|t| t + self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let m = Match::default();
        assert_eq!(m, Match::new());
        assert!(m.is_empty());
        assert_eq!(m.size(), 0);
        assert_eq!(m.source_offset(), None);
        assert_eq!(m.target_offset(), None);
        assert_eq!(m.target_end(), None);
    }

    #[test]
    fn strictly_larger_replaces() {
        let mut m = Match::new();
        assert!(m.replace_if_better(16, 100, 4));
        assert!(m.replace_if_better(17, 200, 8));
        assert_eq!((m.size(), m.source_offset(), m.target_offset()), (17, Some(200), Some(8)));
        assert_eq!(m.target_end(), Some(25));
    }

    #[test]
    fn ties_keep_first() {
        let mut m = Match::new();
        m.replace_if_better(20, 1, 2);
        assert!(!m.replace_if_better(20, 99, 99));
        assert!(!m.replace_if_better(5, 99, 99));
        assert_eq!(m.source_offset(), Some(1));
        assert_eq!(m.target_offset(), Some(2));
    }

    #[test]
    fn zero_size_never_replaces_empty() {
        let mut m = Match::new();
        assert!(!m.replace_if_better(0, 5, 5));
        assert!(m.is_empty());
        assert_eq!(m.source_offset(), None);
    }

    #[test]
    fn shift_target_moves_only_target() {
        let mut m = Match::new();
        m.replace_if_better(32, 7, 3);
        let s = m.shift_target(100);
        assert_eq!(s.target_offset(), Some(103));
        assert_eq!(s.source_offset(), Some(7));
        assert_eq!(s.size(), 32);
    }
}
