use std::collections::HashSet;

use crate::ListEntry;

/// Derived sets of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciled {
    /// Followed accounts that do not follow back, in following order.
    pub not_reciprocating: Vec<ListEntry>,
    /// Followers that are not followed back, in followers order.
    pub admirers: Vec<ListEntry>,
}

impl Reconciled {
    /// Entries that are actually shown to the user. The two sets are disjoint.
    pub fn display_set(&self) -> Vec<ListEntry> {
        self.not_reciprocating
            .iter()
            .chain(self.admirers.iter())
            .cloned()
            .collect()
    }
}

pub fn reconcile(followers: &[ListEntry], following: &[ListEntry]) -> Reconciled {
    let follower_handles: HashSet<&str> = followers.iter().map(|e| e.handle.as_str()).collect();
    let following_handles: HashSet<&str> = following.iter().map(|e| e.handle.as_str()).collect();

    Reconciled {
        not_reciprocating: following
            .iter()
            .filter(|e| !follower_handles.contains(e.handle.as_str()))
            .cloned()
            .collect(),
        admirers: followers
            .iter()
            .filter(|e| !following_handles.contains(e.handle.as_str()))
            .cloned()
            .collect(),
    }
}
