//! Candidate names and the fixed, ordered candidate registry.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::TuringError;

/// An immutable candidate label.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateName(String);

impl CandidateName {
    /// Create a candidate name, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TuringError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TuringError::EmptyCandidateName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CandidateName {
    type Error = TuringError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CandidateName> for String {
    fn from(name: CandidateName) -> Self {
        name.0
    }
}

impl fmt::Display for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ordered, duplicate-free set of candidate names known a priori.
///
/// Position in the registry is the tie-break key when two candidates hold
/// the same balance: the earlier entry ranks first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateRegistry {
    names: Vec<CandidateName>,
}

impl CandidateRegistry {
    /// Build a registry, rejecting empty and duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, TuringError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for raw in names {
            let name = CandidateName::new(raw)?;
            if !seen.insert(name.clone()) {
                return Err(TuringError::DuplicateCandidate(name.0));
            }
            out.push(name);
        }
        Ok(Self { names: out })
    }

    /// The stock registry `nome1` .. `nome19`.
    pub fn default_names() -> Vec<String> {
        (1..=19).map(|i| format!("nome{i}")).collect()
    }

    pub fn names(&self) -> &[CandidateName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registry position of `name`, if it is a member.
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.names.iter().position(|n| n.as_str() == name)
    }

    /// Look up a member by its label.
    pub fn resolve(&self, name: &str) -> Result<&CandidateName, TuringError> {
        self.position(name)
            .map(|i| &self.names[i])
            .ok_or_else(|| TuringError::UnknownCandidate(name.trim().to_string()))
    }

    /// A registry restricted to `subset`, keeping this registry's order.
    pub fn subset<'a, I>(&self, subset: I) -> Result<Self, TuringError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let wanted: HashSet<&str> = subset.into_iter().map(str::trim).collect();
        for name in &wanted {
            self.resolve(name)?;
        }
        Ok(Self {
            names: self
                .names
                .iter()
                .filter(|n| wanted.contains(n.as_str()))
                .cloned()
                .collect(),
        })
    }
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        Self {
            names: Self::default_names()
                .into_iter()
                .map(CandidateName)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_non_empty() {
        assert_eq!(CandidateName::new("  nome1 ").unwrap().as_str(), "nome1");
        assert_eq!(CandidateName::new("   "), Err(TuringError::EmptyCandidateName));
    }

    #[test]
    fn registry_rejects_duplicates() {
        let err = CandidateRegistry::new(["a", "b", "a"]).unwrap_err();
        assert_eq!(err, TuringError::DuplicateCandidate("a".into()));
    }

    #[test]
    fn registry_keeps_configured_order() {
        let registry = CandidateRegistry::new(["c", "a", "b"]).unwrap();
        assert_eq!(registry.position("c"), Some(0));
        assert_eq!(registry.position("b"), Some(2));
        assert_eq!(registry.position("z"), None);
    }

    #[test]
    fn default_registry_has_nineteen_names() {
        let registry = CandidateRegistry::default();
        assert_eq!(registry.len(), 19);
        assert_eq!(registry.names()[0].as_str(), "nome1");
        assert_eq!(registry.names()[18].as_str(), "nome19");
    }

    #[test]
    fn resolve_unknown_candidate_fails() {
        let registry = CandidateRegistry::default();
        assert!(registry.resolve("nome3").is_ok());
        assert_eq!(
            registry.resolve("nome99"),
            Err(TuringError::UnknownCandidate("nome99".into()))
        );
    }

    #[test]
    fn subset_preserves_registry_order() {
        let registry = CandidateRegistry::new(["a", "b", "c", "d"]).unwrap();
        let subset = registry.subset(["d", "b"]).unwrap();
        let names: Vec<&str> = subset.names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["b", "d"]);
        assert!(registry.subset(["x"]).is_err());
    }

    #[test]
    fn name_deserialization_validates() {
        let ok: CandidateName = serde_json::from_str("\"nome2\"").unwrap();
        assert_eq!(ok.as_str(), "nome2");
        assert!(serde_json::from_str::<CandidateName>("\"  \"").is_err());
    }
}
