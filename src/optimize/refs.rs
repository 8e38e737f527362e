use std::collections::BTreeMap;

/// Multiset of material ids referenced (via `ref`) inside a subtree.
///
/// Ids are borrowed from the input frame; squashing only ever reuses ids that already exist
/// there. Counting occurrences lets a parent subtract its child's own `ref` from the aggregate
/// and still see whether anything deeper points at it.
#[derive(Clone, Debug, Default)]
pub(crate) struct RefSet<'a> {
    counts: BTreeMap<&'a str, usize>,
}

impl<'a> RefSet<'a> {
    pub(crate) fn insert(&mut self, id: &'a str) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    pub(crate) fn count(&self, id: &str) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.count(id) > 0
    }

    pub(crate) fn remove_one(&mut self, id: &str) {
        if let Some(n) = self.counts.get_mut(id) {
            *n -= 1;
            if *n == 0 {
                self.counts.remove(id);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    /// Merge `other` into `self`, iterating whichever side is smaller.
    pub(crate) fn absorb(&mut self, mut other: RefSet<'a>) {
        if other.counts.len() > self.counts.len() {
            std::mem::swap(&mut self.counts, &mut other.counts);
        }
        for (id, n) in other.counts {
            *self.counts.entry(id).or_insert(0) += n;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/optimize/refs.rs"]
mod tests;
