use std::{collections::HashSet, path::Path};

use crate::{
    interrupt::Interrupt,
    remote::{AccountTier, InputRef, ItemDescriptor, RemoteError, RemoteListClient},
};

/// The item with `id` as handed out by [`FakeRemote`], `id * 10` bytes large.
pub fn item(id: i64) -> ItemDescriptor {
    ItemDescriptor::new(id, id * 100, id.to_le_bytes().to_vec(), id * 10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ListSaved,
    SetSavedState { id: i64, saved: bool },
    WhoAmI,
    Download { id: i64 },
}

/// In-memory remote that behaves like a saved collection with a window.
///
/// Resaving an item moves it to the front, the same as saving it anew.
pub struct FakeRemote {
    saved: Vec<ItemDescriptor>,
    window: usize,
    tier: AccountTier,
    calls: Vec<Call>,
    set_saved_calls: usize,
    fail_set_saved_at: Option<usize>,
    fail_list_at: Option<usize>,
    failing_downloads: HashSet<i64>,
    interrupt_after_unsaves: Option<(usize, Interrupt)>,
    ignore_unsaves: bool,
}

impl FakeRemote {
    /// Backlog of `count` items with ids `1..=count`, newest first.
    pub fn with_backlog(count: i64, window: usize) -> Self {
        let saved = (1..=count).map(item).collect();
        Self {
            saved,
            window,
            tier: AccountTier::Ordinary,
            calls: Vec::new(),
            set_saved_calls: 0,
            fail_set_saved_at: None,
            fail_list_at: None,
            failing_downloads: HashSet::new(),
            interrupt_after_unsaves: None,
            ignore_unsaves: false,
        }
    }

    pub fn with_tier(mut self, tier: AccountTier) -> Self {
        self.tier = tier;
        self
    }

    /// Fails the n-th (zero based) call of `set_saved_state` without mutating.
    pub fn fail_set_saved_at(mut self, n: usize) -> Self {
        self.fail_set_saved_at = Some(n);
        self
    }

    /// Fails the n-th (zero based) call of `list_saved`.
    pub fn fail_list_at(mut self, n: usize) -> Self {
        self.fail_list_at = Some(n);
        self
    }

    pub fn fail_download_of(mut self, id: i64) -> Self {
        self.failing_downloads.insert(id);
        self
    }

    /// Requests `interrupt` right after the n-th successful unsave.
    pub fn interrupt_after_unsaves(mut self, n: usize, interrupt: Interrupt) -> Self {
        self.interrupt_after_unsaves = Some((n, interrupt));
        self
    }

    /// Accepts unsaves without removing anything.
    pub fn ignoring_unsaves(mut self) -> Self {
        self.ignore_unsaves = true;
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn saved_ids(&self) -> Vec<i64> {
        self.saved.iter().map(ItemDescriptor::id).collect()
    }

    pub fn count(&self, call: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| call(c)).count()
    }

    pub fn set_saved_ids(&self, saved: bool) -> Vec<i64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetSavedState { id, saved: s } if *s == saved => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn unsaves(&self) -> usize {
        self.set_saved_ids(false).len()
    }
}

impl RemoteListClient for FakeRemote {
    async fn list_saved(&mut self) -> Result<Vec<ItemDescriptor>, RemoteError> {
        let listed = self.count(|call| matches!(call, Call::ListSaved));
        self.calls.push(Call::ListSaved);
        if self.fail_list_at == Some(listed) {
            return Err(RemoteError::Transport("listing failed".into()));
        }
        Ok(self.saved.iter().take(self.window).cloned().collect())
    }

    async fn set_saved_state(&mut self, item: &InputRef, saved: bool) -> Result<(), RemoteError> {
        let call = self.set_saved_calls;
        self.set_saved_calls += 1;
        if self.fail_set_saved_at == Some(call) {
            return Err(RemoteError::Transport(format!("saving {} failed", item.id())));
        }
        self.calls.push(Call::SetSavedState {
            id: item.id(),
            saved,
        });

        let position = self.saved.iter().position(|saved| saved.id() == item.id());
        if saved {
            let restored = match position {
                Some(position) => self.saved.remove(position),
                None => self::item(item.id()),
            };
            self.saved.insert(0, restored);
        } else {
            if let Some(position) = position
                && !self.ignore_unsaves
            {
                self.saved.remove(position);
            }
            if let Some((after, interrupt)) = &self.interrupt_after_unsaves
                && self.unsaves() == *after
            {
                interrupt.request();
            }
        }

        Ok(())
    }

    async fn who_am_i(&mut self) -> Result<AccountTier, RemoteError> {
        self.calls.push(Call::WhoAmI);
        Ok(self.tier)
    }

    async fn download(
        &mut self,
        item: &ItemDescriptor,
        destination: &Path,
    ) -> Result<(), RemoteError> {
        self.calls.push(Call::Download { id: item.id() });
        if self.failing_downloads.contains(&item.id()) {
            return Err(RemoteError::Transport(format!("downloading {} failed", item.id())));
        }
        let size = usize::try_from(item.size()).unwrap_or(0);
        tokio::fs::write(destination, vec![0x47; size]).await?;
        Ok(())
    }
}
