//! Parent-chain resolution.
//!
//! Every repository-scoped Scheduler document starts a chain. Its parent
//! reference is followed by name until a document has no parent or names one
//! that does not exist; the result is ordered least specific first and merged
//! into a [`SchedulerLeaf`].

use scheduler_spec::{SchedulerDoc, SchedulerSpec};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::merge::{self, MergeError};

/// A merged, repository-scoped effective spec.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerLeaf {
    pub spec: SchedulerSpec,
    pub org: String,
    pub repo: String,
}

impl SchedulerLeaf {
    pub fn new(org: impl Into<String>, repo: impl Into<String>, spec: SchedulerSpec) -> Self {
        Self {
            spec,
            org: org.into(),
            repo: repo.into(),
        }
    }

    /// `org/repo`, the key used throughout the compiled configuration.
    pub fn repo_key(&self) -> String {
        repo_key(&self.org, &self.repo)
    }
}

pub(crate) fn repo_key(org: &str, repo: &str) -> String {
    if repo.is_empty() {
        return org.to_string();
    }
    format!("{org}/{repo}")
}

/// Ordered document names for one repository, least specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub org: String,
    pub repo: String,
    pub members: Vec<String>,
}

impl Chain {
    /// The document that started the chain.
    pub fn leaf_name(&self) -> &str {
        self.members.last().map(String::as_str).unwrap_or_default()
    }

    /// Specs of every member, in chain order.
    pub fn specs<'a>(&self, index: &DocIndex<'a>) -> Vec<&'a SchedulerSpec> {
        self.members
            .iter()
            .filter_map(|name| index.get(name))
            .map(|doc| &doc.spec)
            .collect()
    }
}

/// A parent reference that could not be resolved. Not fatal: the chain stops
/// at the document that made the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupWarning {
    /// Leaf whose chain was truncated.
    pub leaf: String,
    /// Name that was referenced but not found.
    pub missing: String,
}

impl std::fmt::Display for LookupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scheduler {:?} referenced by the chain of {:?} could not be found",
            self.missing, self.leaf
        )
    }
}

/// Chains for every repository-scoped document plus lookup warnings.
///
/// A leaf whose walk revisits a name has no chain; its `CycleDetected` error
/// is kept in `cycles` and the other leaves resolve as usual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSet {
    pub chains: Vec<Chain>,
    pub warnings: Vec<LookupWarning>,
    pub cycles: Vec<ChainError>,
}

/// Merged leaves plus what was absorbed while resolving them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafSet {
    pub leaves: Vec<SchedulerLeaf>,
    pub warnings: Vec<LookupWarning>,
    pub cycles: Vec<ChainError>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("parent chain of scheduler {leaf:?} revisits {name:?}")]
    CycleDetected { leaf: String, name: String },

    #[error("duplicate scheduler name {0:?}")]
    DuplicateName(String),

    #[error("merging chain of scheduler {leaf:?}: {source}")]
    Merge {
        leaf: String,
        #[source]
        source: MergeError,
    },
}

/// Documents by name.
#[derive(Debug, Clone)]
pub struct DocIndex<'a> {
    by_name: BTreeMap<&'a str, &'a SchedulerDoc>,
}

impl<'a> DocIndex<'a> {
    pub fn new(docs: &'a [SchedulerDoc]) -> Result<Self, ChainError> {
        let mut by_name = BTreeMap::new();
        for doc in docs {
            if by_name.insert(doc.name.as_str(), doc).is_some() {
                return Err(ChainError::DuplicateName(doc.name.clone()));
            }
        }
        Ok(Self { by_name })
    }

    pub fn get(&self, name: &str) -> Option<&'a SchedulerDoc> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

/// Walk the parent references of every repository-scoped document.
///
/// When `team_scheduler` names an existing document it becomes the root of
/// every chain that does not already contain it.
pub fn resolve_chains(
    docs: &[SchedulerDoc],
    team_scheduler: Option<&str>,
) -> Result<ChainSet, ChainError> {
    let index = DocIndex::new(docs)?;
    let team = team_scheduler.filter(|name| !name.is_empty());
    let mut set = ChainSet::default();

    for doc in docs {
        let Some((org, repo)) = doc.scope() else {
            continue;
        };
        let mut members = match walk(doc, &index, &mut set.warnings) {
            Ok(members) => members,
            Err(err) => {
                warn!(leaf = %doc.name, error = %err, "skipping scheduler with cyclic parents");
                set.cycles.push(err);
                continue;
            }
        };

        if let Some(team) = team {
            if index.contains(team) {
                if !members.iter().any(|m| m == team) {
                    members.insert(0, team.to_string());
                }
            } else {
                warn!(
                    team_scheduler = team,
                    leaf = %doc.name,
                    "team scheduler is configured but could not be found"
                );
                set.warnings.push(LookupWarning {
                    leaf: doc.name.clone(),
                    missing: team.to_string(),
                });
            }
        }

        debug!(leaf = %doc.name, chain = ?members, "resolved scheduler chain");
        set.chains.push(Chain {
            org: org.to_string(),
            repo: repo.to_string(),
            members,
        });
    }

    set.chains.sort_by(|a, b| {
        (a.org.as_str(), a.repo.as_str(), a.leaf_name())
            .cmp(&(b.org.as_str(), b.repo.as_str(), b.leaf_name()))
    });
    Ok(set)
}

fn walk(
    leaf: &SchedulerDoc,
    index: &DocIndex<'_>,
    warnings: &mut Vec<LookupWarning>,
) -> Result<Vec<String>, ChainError> {
    let mut members = vec![leaf.name.clone()];
    let mut visited = BTreeSet::from([leaf.name.as_str()]);
    let mut next = leaf.parent.as_deref();

    while let Some(name) = next {
        if !visited.insert(name) {
            return Err(ChainError::CycleDetected {
                leaf: leaf.name.clone(),
                name: name.to_string(),
            });
        }
        let Some(parent) = index.get(name) else {
            warn!(leaf = %leaf.name, missing = name, "parent scheduler not found; chain truncated");
            warnings.push(LookupWarning {
                leaf: leaf.name.clone(),
                missing: name.to_string(),
            });
            break;
        };
        members.push(parent.name.clone());
        next = parent.parent.as_deref();
    }

    members.reverse();
    Ok(members)
}

/// Merge one resolved chain, optionally with extra specs more specific than
/// every member.
pub fn merge_chain(
    chain: &Chain,
    index: &DocIndex<'_>,
    extra: &[&SchedulerSpec],
) -> Result<SchedulerLeaf, ChainError> {
    let mut specs = chain.specs(index);
    specs.extend_from_slice(extra);
    let spec = merge::build(&specs).map_err(|source| ChainError::Merge {
        leaf: chain.leaf_name().to_string(),
        source,
    })?;
    Ok(SchedulerLeaf::new(&chain.org, &chain.repo, spec))
}

/// Resolve and merge every repository-scoped document into a leaf.
///
/// Cyclic chains are reported in the result, not returned as the error;
/// duplicate names and merge failures still abort.
pub fn generate_chains(docs: &[SchedulerDoc]) -> Result<LeafSet, ChainError> {
    let set = resolve_chains(docs, None)?;
    let index = DocIndex::new(docs)?;
    let leaves = set
        .chains
        .iter()
        .map(|chain| merge_chain(chain, &index, &[]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LeafSet {
        leaves,
        warnings: set.warnings,
        cycles: set.cycles,
    })
}
