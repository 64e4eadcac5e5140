//! Supplemental class hierarchy / MRO index: an advisory index from class
//! name to its C3-linearized method resolution order, used only to
//! prioritize attribute-resolution candidates — never to prune them,
//! since the fixpoint's soundness does not depend on this index being
//! complete.

use rustc_hash::FxHashMap;

/// One class's declared bases, in source order.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<String>,
}

/// Class name -> declared bases, plus the memoized linearizations.
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    classes: FxHashMap<String, ClassDef>,
    mro_cache: FxHashMap<String, Vec<String>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, bases: Vec<String>) {
        let name = name.into();
        self.mro_cache.remove(&name);
        self.classes.insert(name.clone(), ClassDef { name: name.clone(), bases });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The method resolution order for `name`, computed via C3
    /// linearization. Falls back to `[name]` for an undeclared class
    /// (the attribute resolver then just sees no ancestors to search).
    pub fn mro(&mut self, name: &str) -> Vec<String> {
        if let Some(cached) = self.mro_cache.get(name) {
            return cached.clone();
        }
        let result = self.linearize(name, &mut Vec::new());
        self.mro_cache.insert(name.to_string(), result.clone());
        result
    }

    fn linearize(&self, name: &str, in_progress: &mut Vec<String>) -> Vec<String> {
        if in_progress.contains(&name.to_string()) {
            // Inheritance cycle: treat as if the class had no bases rather
            // than recursing forever. This index is advisory only.
            return vec![name.to_string()];
        }
        let Some(def) = self.classes.get(name) else {
            return vec![name.to_string()];
        };
        if def.bases.is_empty() {
            return vec![name.to_string()];
        }
        in_progress.push(name.to_string());
        let base_lists: Vec<Vec<String>> = def
            .bases
            .iter()
            .map(|b| self.linearize(b, in_progress))
            .collect();
        in_progress.pop();

        let mut sequences = base_lists;
        sequences.push(def.bases.clone());
        let merged = c3_merge(sequences);
        let mut mro = vec![name.to_string()];
        mro.extend(merged);
        mro
    }
}

/// C3 merge: repeatedly take the first head of any sequence that does
/// not appear in the tail of any other sequence. Falls back to
/// concatenating whatever remains (deduplicated) if no valid head is
/// found, rather than failing the analysis over an inconsistent
/// hierarchy — this index only prioritizes, it never gates.
fn c3_merge(mut sequences: Vec<Vec<String>>) -> Vec<String> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            break;
        }
        let head = sequences.iter().find_map(|seq| {
            let candidate = &seq[0];
            let in_any_tail = sequences.iter().any(|s| s[1..].contains(candidate));
            if in_any_tail {
                None
            } else {
                Some(candidate.clone())
            }
        });
        let head = match head {
            Some(h) => h,
            None => {
                let remaining: Vec<String> = sequences.into_iter().flatten().collect();
                let mut seen = std::collections::HashSet::new();
                result.extend(remaining.into_iter().filter(|c| seen.insert(c.clone())));
                break;
            }
        };
        if !result.contains(&head) {
            result.push(head.clone());
        }
        for seq in sequences.iter_mut() {
            seq.retain(|c| c != &head);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_inheritance_mro_is_linear() {
        let mut h = ClassHierarchy::new();
        h.declare("A", vec![]);
        h.declare("B", vec!["A".into()]);
        assert_eq!(h.mro("B"), vec!["B", "A"]);
    }

    #[test]
    fn diamond_inheritance_resolves_via_c3() {
        let mut h = ClassHierarchy::new();
        h.declare("O", vec![]);
        h.declare("A", vec!["O".into()]);
        h.declare("B", vec!["O".into()]);
        h.declare("C", vec!["A".into(), "B".into()]);
        assert_eq!(h.mro("C"), vec!["C", "A", "B", "O"]);
    }

    #[test]
    fn undeclared_class_mro_is_itself() {
        let mut h = ClassHierarchy::new();
        assert_eq!(h.mro("Mystery"), vec!["Mystery"]);
    }

    #[test]
    fn cyclic_bases_do_not_hang() {
        let mut h = ClassHierarchy::new();
        h.declare("A", vec!["B".into()]);
        h.declare("B", vec!["A".into()]);
        let mro = h.mro("A");
        assert!(!mro.is_empty());
    }
}
