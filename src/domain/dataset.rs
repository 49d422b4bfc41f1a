// ============================================================
// Layer 3 — Dataset Domain Types
// ============================================================
// The assembled dataset is a single flat buffer of integers
// viewed as fixed-width rows. The row layout agreed with the
// preprocessor is:
//
//   [ token_id × (width - 2) | label | sequence_length ]
//
// Rows are shuffled once after loading and never change again.
// Training and evaluation see the data through `Rows` views
// cut by a `SplitRange`.

use rand::{seq::SliceRandom, Rng};

/// All rows of every shard, concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    values: Vec<i64>,
    width:  usize,
}

impl Dataset {
    /// `values.len()` must be a multiple of `width`.
    pub fn new(values: Vec<i64>, width: usize) -> Self {
        debug_assert!(width > 0 && values.len() % width == 0);
        Self { values, width }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, index: usize) -> &[i64] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    /// Apply one random permutation to the row order.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);
        self.values = order
            .iter()
            .flat_map(|&i| self.row(i).iter().copied())
            .collect();
    }

    /// View of the rows in `range`.
    pub fn rows(&self, range: SplitRange) -> Rows<'_> {
        Rows {
            values: &self.values[range.start * self.width..range.end * self.width],
            width:  self.width,
        }
    }
}

/// Half-open row range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRange {
    pub start: usize,
    pub end:   usize,
}

impl SplitRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &SplitRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Borrowed window of dataset rows.
#[derive(Debug, Clone, Copy)]
pub struct Rows<'a> {
    values: &'a [i64],
    width:  usize,
}

impl<'a> Rows<'a> {
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a [i64]> {
        let start = index.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a [i64]> + 'a {
        self.values.chunks_exact(self.width)
    }

    /// Draw up to `amount` distinct rows uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, amount: usize, rng: &mut R) -> Vec<&'a [i64]> {
        let amount = amount.min(self.len());
        rand::seq::index::sample(rng, self.len(), amount)
            .into_iter()
            .filter_map(|i| self.get(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn numbered(rows: usize, width: usize) -> Dataset {
        let values = (0..rows)
            .flat_map(|r| std::iter::repeat(r as i64).take(width))
            .collect();
        Dataset::new(values, width)
    }

    #[test]
    fn test_rows_are_fixed_width() {
        let d = numbered(4, 3);
        assert_eq!(d.len(), 4);
        assert_eq!(d.row(2), &[2, 2, 2]);
    }

    #[test]
    fn test_shuffle_keeps_every_row_intact() {
        let mut d = numbered(50, 4);
        d.shuffle(&mut StdRng::seed_from_u64(7));

        let mut firsts: Vec<i64> = (0..d.len()).map(|i| d.row(i)[0]).collect();
        // each row still repeats its own id across the width
        assert!((0..d.len()).all(|i| d.row(i).iter().all(|&v| v == d.row(i)[0])));
        firsts.sort();
        assert_eq!(firsts, (0..50).collect::<Vec<i64>>());
    }

    #[test]
    fn test_rows_view_follows_range() {
        let d = numbered(10, 2);
        let view = d.rows(SplitRange::new(3, 6));
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(0), Some(&[3i64, 3][..]));
        assert_eq!(view.get(3), None);
        assert_eq!(view.iter().count(), 3);
    }

    #[test]
    fn test_sample_draws_without_replacement() {
        let d = numbered(20, 2);
        let view = d.rows(SplitRange::new(0, 20));
        let mut rng = StdRng::seed_from_u64(1);

        let mut picked: Vec<i64> = view.sample(8, &mut rng).iter().map(|r| r[0]).collect();
        picked.sort();
        picked.dedup();
        assert_eq!(picked.len(), 8);

        // asking for more than exists yields every row once
        assert_eq!(view.sample(100, &mut rng).len(), 20);
    }

    #[test]
    fn test_range_overlap() {
        let a = SplitRange::new(0, 70);
        assert!(!a.overlaps(&SplitRange::new(71, 99)));
        assert!(!a.overlaps(&SplitRange::new(70, 100)));
        assert!(a.overlaps(&SplitRange::new(69, 100)));
        assert!(SplitRange::new(5, 5).is_empty());
    }
}
