use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use crate::error::{Result, TreeclustError};

/// Immutable labeling of collection items into clusters. Labels start at 1;
/// after a split the label set may have holes, so the cluster count is the
/// number of distinct labels present, not the maximum label.
///
/// Every operation returns a fresh `Partition`; a live partition is never
/// edited in place between search steps.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    labels: Vec<u32>,
}

impl Partition {
    pub fn new(labels: Vec<u32>) -> Result<Self> {
        if labels.is_empty() {
            return Err(TreeclustError::InvalidPartition("empty label vector".into()));
        }
        if labels.iter().any(|&l| l == 0) {
            return Err(TreeclustError::InvalidPartition(
                "labels are 1-based; found 0".into(),
            ));
        }
        Ok(Self { labels })
    }

    /// Uniform random assignment of `len` items to labels `1..=nclusters`.
    pub fn random<R: Rng>(len: usize, nclusters: u32, rng: &mut R) -> Result<Self> {
        if nclusters == 0 {
            return Err(TreeclustError::InvalidPartition("nclusters must be > 0".into()));
        }
        Self::new((0..len).map(|_| rng.gen_range(1..=nclusters)).collect())
    }

    /// Inverse of [`clusters_of`]: rebuild the label vector from an explicit
    /// label -> member-indices map covering every item exactly once.
    pub fn from_clusters(clusters: &BTreeMap<u32, Vec<usize>>) -> Result<Self> {
        let len: usize = clusters.values().map(Vec::len).sum();
        let mut labels = vec![0u32; len];
        for (&label, members) in clusters {
            for &i in members {
                if i >= len || labels[i] != 0 {
                    return Err(TreeclustError::InvalidPartition(format!(
                        "index {i} out of range or assigned twice"
                    )));
                }
                labels[i] = label;
            }
        }
        Self::new(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn label_of(&self, item: usize) -> u32 {
        self.labels[item]
    }

    pub fn max_label(&self) -> u32 {
        self.labels.iter().copied().max().unwrap_or(0)
    }

    /// Number of distinct labels present.
    pub fn num_clusters(&self) -> usize {
        self.clusters_of().len()
    }

    /// Group item positions by label. Members come out in index order.
    pub fn clusters_of(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut map: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (position, &label) in self.labels.iter().enumerate() {
            map.entry(label).or_default().push(position);
        }
        map
    }

    /// Relabel every item carrying `from` to `to`. The cluster count drops
    /// by exactly one; merging a label into itself is rejected.
    pub fn merge(&self, from: u32, to: u32) -> Result<Partition> {
        if from == to {
            return Err(TreeclustError::InvalidMove(format!(
                "merge of cluster {from} with itself"
            )));
        }
        let present = |l: u32| self.labels.contains(&l);
        if !present(from) || !present(to) {
            return Err(TreeclustError::InvalidPartition(format!(
                "merge({from}, {to}): label absent"
            )));
        }
        let labels = self
            .labels
            .iter()
            .map(|&l| if l == from { to } else { l })
            .collect();
        Ok(Partition { labels })
    }

    /// Carve `seed` out into a fresh singleton cluster labeled max+1.
    pub fn split_item(&self, seed: usize) -> Result<Partition> {
        if seed >= self.labels.len() {
            return Err(TreeclustError::InvalidPartition(format!(
                "split seed {seed} out of range (len {})",
                self.labels.len()
            )));
        }
        let mut labels = self.labels.clone();
        labels[seed] = self.max_label() + 1;
        Ok(Partition { labels })
    }

    /// Copy with one item reassigned to an existing or new label.
    pub fn with_label(&self, item: usize, label: u32) -> Result<Partition> {
        if item >= self.labels.len() {
            return Err(TreeclustError::InvalidPartition(format!(
                "item {item} out of range (len {})",
                self.labels.len()
            )));
        }
        if label == 0 {
            return Err(TreeclustError::InvalidPartition("label 0 is reserved".into()));
        }
        let mut labels = self.labels.clone();
        labels[item] = label;
        Ok(Partition { labels })
    }

    /// True if `self` and `other` induce the same grouping up to relabeling.
    pub fn equivalent(&self, other: &Partition) -> bool {
        if self.labels.len() != other.labels.len() {
            return false;
        }
        let mut a: Vec<Vec<usize>> = self.clusters_of().into_values().collect();
        let mut b: Vec<Vec<usize>> = other.clusters_of().into_values().collect();
        a.sort();
        b.sort();
        a == b
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, l) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{l}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Partition{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn p(v: &[u32]) -> Partition {
        Partition::new(v.to_vec()).unwrap()
    }

    #[test]
    fn clusters_group_positions_in_order() {
        let part = p(&[1, 2, 1, 3, 2, 1]);
        let map = part.clusters_of();
        assert_eq!(map[&1], vec![0, 2, 5]);
        assert_eq!(map[&2], vec![1, 4]);
        assert_eq!(map[&3], vec![3]);
        assert_eq!(part.num_clusters(), 3);
    }

    #[test]
    fn merge_drops_exactly_one_cluster() {
        let part = p(&[1, 1, 2, 2, 3, 3]);
        let merged = part.merge(1, 2).unwrap();
        assert_eq!(merged.len(), part.len());
        assert_eq!(merged.num_clusters(), 2);
        assert_eq!(merged.labels(), &[2, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn merge_with_self_is_rejected() {
        let part = p(&[1, 1, 2]);
        assert!(matches!(
            part.merge(2, 2),
            Err(TreeclustError::InvalidMove(_))
        ));
    }

    #[test]
    fn merge_of_absent_label_is_rejected() {
        let part = p(&[1, 1, 2]);
        assert!(part.merge(1, 9).is_err());
    }

    #[test]
    fn split_adds_exactly_one_cluster() {
        let part = p(&[1, 1, 2, 2]);
        let split = part.split_item(3).unwrap();
        assert_eq!(split.len(), 4);
        assert_eq!(split.num_clusters(), 3);
        assert_eq!(split.label_of(3), 3);
    }

    #[test]
    fn split_after_hole_uses_max_plus_one() {
        // label 2 missing: new label must be 5, not 2
        let part = p(&[1, 4, 4, 1]);
        let split = part.split_item(0).unwrap();
        assert_eq!(split.label_of(0), 5);
    }

    #[test]
    fn random_partition_has_requested_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let part = Partition::random(20, 4, &mut rng).unwrap();
        assert_eq!(part.len(), 20);
        assert!(part.labels().iter().all(|&l| (1..=4).contains(&l)));
    }

    #[test]
    fn from_clusters_round_trips() {
        let part = p(&[2, 1, 2, 3]);
        let rebuilt = Partition::from_clusters(&part.clusters_of()).unwrap();
        assert_eq!(part, rebuilt);
    }

    #[test]
    fn equivalence_ignores_label_names() {
        assert!(p(&[1, 1, 2, 2]).equivalent(&p(&[5, 5, 1, 1])));
        assert!(!p(&[1, 1, 2, 2]).equivalent(&p(&[1, 2, 1, 2])));
    }
}
