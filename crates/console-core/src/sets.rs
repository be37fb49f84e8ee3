//! Sorted, de-duplicated collections.

use std::collections::BTreeSet;

/// Every distinct value of `items` exactly once, in ascending order.
pub fn sorted_set<I>(items: I) -> Vec<I::Item>
where
    I: IntoIterator,
    I::Item: Ord,
{
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}
