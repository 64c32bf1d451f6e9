//! Proportional-progress scheduling across several address ranges
//!
//! Each step draws from the range with the smallest `visited / len`, so a
//! 10-address range and a 10,000-address range finish at about the same time.
//! Ties go to the range that was added first; the insertion index is fixed
//! when a range is added and never changes.

use super::range::{AddressRange, RangeSpec};
use super::SurveyError;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::net::Ipv4Addr;

/// A range together with its scheduling key
#[derive(Debug, Clone)]
pub struct SchedulerEntry {
    /// `visited / len` as of the last draw
    pub progress: f64,
    /// Position in which the range was added; breaks progress ties
    pub order: usize,
    /// The traversal itself
    pub range: AddressRange,
}

impl SchedulerEntry {
    fn new(order: usize, range: AddressRange) -> Self {
        Self {
            progress: range.progress(),
            order,
            range,
        }
    }

    /// Exact comparison of `visited / len` without going through floats
    fn cmp_progress(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.range.visited()) * u128::from(other.range.len());
        let rhs = u128::from(other.range.visited()) * u128::from(self.range.len());
        lhs.cmp(&rhs)
    }
}

// BinaryHeap is a max-heap: the entry that should be drawn next compares greatest.
impl Ord for SchedulerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cmp_progress(self)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for SchedulerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SchedulerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SchedulerEntry {}

/// Working set of active ranges, drawn from in least-progress order
///
/// # Examples
///
/// ```
/// use autoping::{AddressRange, FairScheduler};
///
/// let mut scheduler = FairScheduler::new();
/// scheduler.push(AddressRange::parse("10.0.0.0", "10.0.0.9")?);
/// scheduler.push(AddressRange::parse("10.1.0.0", "10.1.0.99")?);
///
/// let drawn: Vec<_> = scheduler.by_ref().collect();
/// assert_eq!(drawn.len(), 110);
/// assert!(scheduler.step().is_none());
/// # Ok::<(), autoping::SurveyError>(())
/// ```
#[derive(Debug, Default)]
pub struct FairScheduler {
    heap: BinaryHeap<SchedulerEntry>,
    next_order: usize,
    drawn: u64,
}

impl FairScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one range per specification; fails if any of them is invalid
    pub fn from_specs(specs: &[RangeSpec]) -> Result<Self, SurveyError> {
        let ranges = specs
            .iter()
            .map(AddressRange::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ranges.into_iter().collect())
    }

    /// Add a range to the working set
    pub fn push(&mut self, range: AddressRange) {
        let order = self.next_order;
        self.next_order += 1;
        self.heap.push(SchedulerEntry::new(order, range));
    }

    /// Draw the next address from the least-advanced range.
    ///
    /// Exhausted ranges are dropped from the working set as they are found.
    /// Returns `None` once every range has been drained.
    pub fn step(&mut self) -> Option<Ipv4Addr> {
        while let Some(mut entry) = self.heap.pop() {
            match entry.range.next() {
                Some(addr) => {
                    entry.progress = entry.range.progress();
                    self.heap.push(entry);
                    self.drawn += 1;
                    return Some(addr);
                }
                None => {
                    tracing::debug!(
                        range = %entry.range,
                        visited = entry.range.visited(),
                        "range exhausted"
                    );
                }
            }
        }
        None
    }

    /// Number of ranges still in the working set
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true once no ranges remain
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total addresses drawn so far
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Addresses left to draw across all active ranges
    pub fn remaining(&self) -> u64 {
        self.heap
            .iter()
            .map(|e| e.range.len() - e.range.visited())
            .sum()
    }

    /// Active entries in no particular order
    pub fn entries(&self) -> impl Iterator<Item = &SchedulerEntry> {
        self.heap.iter()
    }
}

impl FromIterator<AddressRange> for FairScheduler {
    fn from_iter<I: IntoIterator<Item = AddressRange>>(iter: I) -> Self {
        let mut scheduler = Self::new();
        for range in iter {
            scheduler.push(range);
        }
        scheduler
    }
}

impl Iterator for FairScheduler {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        self.step()
    }
}
