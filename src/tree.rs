use rand::seq::SliceRandom;
use rand::Rng;

/// A phylogenetic tree held as its Newick serialization. The engine never
/// inspects topology itself; trees are opaque tokens handed to the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    newick: String,
}

impl Tree {
    pub fn from_newick(newick: impl Into<String>) -> Self {
        Self {
            newick: newick.into(),
        }
    }

    pub fn newick(&self) -> &str {
        &self.newick
    }

    /// Leaf names, in the order they appear in the serialization.
    pub fn taxa(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = String::new();
        let mut in_label = false;
        for c in self.newick.chars() {
            match c {
                '(' | ',' => {
                    in_label = true;
                    cur.clear();
                }
                ')' | ':' | ';' => {
                    if in_label && !cur.is_empty() {
                        out.push(cur.clone());
                    }
                    in_label = false;
                }
                _ => {
                    if in_label {
                        cur.push(c);
                    }
                }
            }
        }
        out
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(path, format!("{}\n", self.newick))
    }
}

/// Named construction strategies for simulated trees. A closed set rather
/// than an open class hierarchy: callers match on the shape they asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeShape {
    /// Pure-birth branching.
    Yule,
    /// Coalescent waiting times.
    Coalescent,
    /// Uniform random joins, unit branch lengths.
    Random,
}

impl TreeShape {
    /// Generate a tree over `taxa` by random sequential joins. The shape
    /// controls the branch-length law; topology is random for all three.
    pub fn generate<R: Rng>(self, taxa: &[String], rng: &mut R) -> Tree {
        assert!(!taxa.is_empty(), "cannot generate a tree over zero taxa");
        let mut nodes: Vec<String> = taxa.to_vec();
        nodes.shuffle(rng);
        let mut k = nodes.len();
        while nodes.len() > 1 {
            let b = nodes.pop().unwrap();
            let a = nodes.pop().unwrap();
            let (la, lb) = match self {
                TreeShape::Yule => {
                    // exponential with rate proportional to lineage count
                    let l = -rng.gen::<f64>().ln() / k as f64;
                    (l, l)
                }
                TreeShape::Coalescent => {
                    let pairs = (k * (k - 1)) as f64 / 2.0;
                    let l = -rng.gen::<f64>().ln() / pairs;
                    (l, l)
                }
                TreeShape::Random => (1.0, 1.0),
            };
            nodes.push(format!("({a}:{la:.6},{b}:{lb:.6})"));
            nodes.shuffle(rng);
            k -= 1;
        }
        Tree::from_newick(format!("{};", nodes.pop().unwrap()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn taxa_parsed_from_newick() {
        let t = Tree::from_newick("((a:0.1,b:0.2):0.05,(c:0.3,d:0.1):0.02);");
        assert_eq!(t.taxa(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn generated_trees_cover_all_taxa() {
        let taxa: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        let mut rng = StdRng::seed_from_u64(11);
        for shape in [TreeShape::Yule, TreeShape::Coalescent, TreeShape::Random] {
            let t = shape.generate(&taxa, &mut rng);
            let mut got = t.taxa();
            got.sort();
            let mut want = taxa.clone();
            want.sort();
            assert_eq!(got, want, "{shape:?} lost taxa");
        }
    }
}
