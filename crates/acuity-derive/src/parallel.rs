//! Fan-out over independent per-subject groups.
//!
//! Groups never share mutable state; each closure call sees only its own
//! group and returns an owned result.

/// Apply `f` to every group, on the rayon pool when `parallel` is set and
/// the `parallel` feature is enabled. Output order follows input order.
pub fn map_groups<G, R, F>(groups: Vec<G>, parallel: bool, f: F) -> Vec<R>
where
    G: Send,
    R: Send,
    F: Fn(G) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;

        return groups.into_par_iter().map(f).collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    groups.into_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_input_order() {
        let groups: Vec<u32> = (0..100).collect();
        let sequential = map_groups(groups.clone(), false, |value| value * 2);
        let parallel = map_groups(groups, true, |value| value * 2);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential[10], 20);
    }
}
