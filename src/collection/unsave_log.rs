use std::collections::HashSet;

use log::{error, info};

use crate::remote::{InputRef, RemoteListClient};

/// Undo log of every item removed from the saved collection during one run.
///
/// Entries are kept in removal order. The remote collection always equals the
/// original one minus the items in this log.
#[derive(Debug, Default)]
pub struct UnsaveLog {
    entries: Vec<InputRef>,
    ids: HashSet<i64>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub resaved: usize,
    /// Ids whose resave failed, in the order they were attempted.
    pub unrestored: Vec<i64>,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.unrestored.is_empty()
    }
}

impl UnsaveLog {
    pub fn push(&mut self, item: InputRef) {
        self.ids.insert(item.id());
        self.entries.push(item);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(InputRef::id)
    }

    /// Resaves every logged item, newest removal first.
    ///
    /// A failed resave does not stop the remaining ones; the item stays
    /// unsaved remotely and is reported.
    pub async fn restore<C: RemoteListClient>(self, client: &mut C) -> RestoreReport {
        let total = self.entries.len();
        let mut report = RestoreReport::default();
        for (done, item) in self.entries.into_iter().rev().enumerate() {
            info!("({}/{total}) resaving items", done + 1);
            match client.set_saved_state(&item, true).await {
                Ok(()) => report.resaved += 1,
                Err(e) => {
                    error!(
                        "resaving item {} failed, it is lost from the saved collection: {e}",
                        item.id()
                    );
                    report.unrestored.push(item.id());
                }
            }
        }

        report
    }
}
