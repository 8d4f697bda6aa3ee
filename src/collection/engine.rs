use std::num::NonZeroUsize;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    collection::{RestoreReport, UnsaveLog},
    interrupt::Interrupt,
    remote::{ItemDescriptor, RemoteError, RemoteListClient},
};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("item {0} is still listed after it was unsaved")]
    RepeatedItem(i64),
}

/// Terminal state of one collection run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every saved item, newest first. The remote collection was restored.
    Completed(Vec<ItemDescriptor>),
    /// Stopped on request. Items unsaved so far were not restored.
    Interrupted,
    /// Stopped by an error after a best effort restoration.
    Failed(CollectError),
}

#[derive(Default)]
struct CollectionState {
    accumulated: Vec<ItemDescriptor>,
    pending_unsaved: UnsaveLog,
}

enum Stop {
    Exhausted,
    Interrupted,
}

/// Lists a saved collection past the server window by temporarily unsaving
/// every full window until a short one comes back.
pub struct CollectionEngine<'a, C> {
    client: &'a mut C,
    window_size: NonZeroUsize,
}

impl<'a, C: RemoteListClient> CollectionEngine<'a, C> {
    pub fn new(client: &'a mut C, window_size: NonZeroUsize) -> Self {
        Self {
            client,
            window_size,
        }
    }

    pub async fn collect(mut self, interrupt: &Interrupt) -> RunOutcome {
        let mut state = CollectionState::default();
        let stop = self.walk_windows(&mut state, interrupt).await;
        let CollectionState {
            accumulated,
            pending_unsaved,
        } = state;

        match stop {
            Ok(Stop::Exhausted) => {
                info!("unsaved {} items", pending_unsaved.len());
                info!("got {} items", accumulated.len());
                report_restoration(&pending_unsaved.restore(self.client).await);
                RunOutcome::Completed(accumulated)
            }
            Ok(Stop::Interrupted) => {
                if !pending_unsaved.is_empty() {
                    warn!(
                        "interrupted with {} items unsaved, they are not restored: {:?}",
                        pending_unsaved.len(),
                        pending_unsaved.ids().collect::<Vec<_>>()
                    );
                }
                RunOutcome::Interrupted
            }
            Err(e) => {
                error!("error when collecting items: {e}");
                report_restoration(&pending_unsaved.restore(self.client).await);
                RunOutcome::Failed(e)
            }
        }
    }

    async fn walk_windows(
        &mut self,
        state: &mut CollectionState,
        interrupt: &Interrupt,
    ) -> Result<Stop, CollectError> {
        loop {
            let listing = self.client.list_saved().await?;
            state.accumulated.extend_from_slice(&listing);
            debug!(
                "listed {} items with a window of {}",
                listing.len(),
                self.window_size
            );
            if listing.len() < self.window_size.get() {
                return Ok(Stop::Exhausted);
            }

            for item in &listing {
                if interrupt.is_requested() {
                    return Ok(Stop::Interrupted);
                }
                if state.pending_unsaved.contains(item.id()) {
                    return Err(CollectError::RepeatedItem(item.id()));
                }
                info!(
                    "({}/{}+) unsaving items",
                    state.pending_unsaved.len() + 1,
                    state.accumulated.len()
                );
                let input = item.input_ref();
                self.client.set_saved_state(&input, false).await?;
                state.pending_unsaved.push(input);
            }
        }
    }
}

fn report_restoration(report: &RestoreReport) {
    if report.is_complete() {
        debug!("resaved {} items", report.resaved);
    } else {
        error!(
            "{} items could not be resaved: {:?}",
            report.unrestored.len(),
            report.unrestored
        );
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;
    use crate::remote::fake::{Call, FakeRemote};

    fn window(size: usize) -> NonZeroUsize {
        assert_some!(NonZeroUsize::new(size))
    }

    fn ids(items: &[ItemDescriptor]) -> Vec<i64> {
        items.iter().map(ItemDescriptor::id).collect()
    }

    fn unsave(id: i64) -> Call {
        Call::SetSavedState { id, saved: false }
    }

    fn resave(id: i64) -> Call {
        Call::SetSavedState { id, saved: true }
    }

    #[rstest]
    #[tokio::test]
    async fn test_collects_backlog_beyond_window_and_restores_it() {
        let mut remote = FakeRemote::with_backlog(5, 2);
        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&Interrupt::default())
            .await;

        let RunOutcome::Completed(items) = outcome else {
            panic!("collection should complete, got {outcome:?}");
        };
        assert_eq!(ids(&items), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            remote.calls(),
            &[
                Call::ListSaved,
                unsave(1),
                unsave(2),
                Call::ListSaved,
                unsave(3),
                unsave(4),
                Call::ListSaved,
                resave(4),
                resave(3),
                resave(2),
                resave(1),
            ]
        );
        assert_eq!(remote.saved_ids(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[case::single_short_window(3, 5, 1)]
    #[case::one_full_window(7, 5, 2)]
    #[case::several_full_windows(13, 4, 4)]
    #[case::exact_multiple(8, 4, 3)]
    #[case::empty(0, 4, 1)]
    #[tokio::test]
    async fn test_terminates_after_first_short_window(
        #[case] backlog: i64,
        #[case] size: usize,
        #[case] expected_listings: usize,
    ) {
        let mut remote = FakeRemote::with_backlog(backlog, size);
        let outcome = CollectionEngine::new(&mut remote, window(size))
            .collect(&Interrupt::default())
            .await;

        let RunOutcome::Completed(items) = outcome else {
            panic!("collection should complete, got {outcome:?}");
        };
        assert_eq!(items.len(), usize::try_from(backlog).unwrap_or_default());
        assert_eq!(
            remote.count(|call| matches!(call, Call::ListSaved)),
            expected_listings
        );
        let unsaves = remote.set_saved_ids(false).len();
        assert_le!(unsaves, (expected_listings - 1) * size);
        assert_eq!(remote.set_saved_ids(true).len(), unsaves);
    }

    #[rstest]
    #[tokio::test]
    async fn test_interrupt_before_first_unsave_issues_no_mutation() {
        let mut remote = FakeRemote::with_backlog(5, 2);
        let interrupt = Interrupt::default();
        interrupt.request();

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&interrupt)
            .await;

        assert!(matches!(outcome, RunOutcome::Interrupted));
        assert_eq!(remote.calls(), &[Call::ListSaved]);
        assert_eq!(remote.saved_ids(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_interrupt_between_windows_issues_no_mutation_in_next_window() {
        let interrupt = Interrupt::default();
        let mut remote =
            FakeRemote::with_backlog(5, 2).interrupt_after_unsaves(2, interrupt.clone());

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&interrupt)
            .await;

        assert!(matches!(outcome, RunOutcome::Interrupted));
        assert_eq!(
            remote.calls(),
            &[Call::ListSaved, unsave(1), unsave(2), Call::ListSaved]
        );
        assert_eq!(remote.saved_ids(), vec![3, 4, 5]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_interrupt_mid_window_skips_restoration() {
        let interrupt = Interrupt::default();
        let mut remote =
            FakeRemote::with_backlog(5, 2).interrupt_after_unsaves(3, interrupt.clone());

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&interrupt)
            .await;

        assert!(matches!(outcome, RunOutcome::Interrupted));
        assert_eq!(remote.set_saved_ids(false), vec![1, 2, 3]);
        assert_is_empty!(remote.set_saved_ids(true));
        assert_eq!(remote.saved_ids(), vec![4, 5]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_unsave_restores_and_fails() {
        let mut remote = FakeRemote::with_backlog(5, 2).fail_set_saved_at(2);

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&Interrupt::default())
            .await;

        let RunOutcome::Failed(error) = outcome else {
            panic!("collection should fail, got {outcome:?}");
        };
        assert!(matches!(error, CollectError::Remote(RemoteError::Transport(_))));
        assert_eq!(remote.set_saved_ids(false), vec![1, 2]);
        assert_eq!(remote.set_saved_ids(true), vec![2, 1]);
        assert_eq!(remote.saved_ids(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_listing_restores_and_fails() {
        let mut remote = FakeRemote::with_backlog(5, 2).fail_list_at(1);

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&Interrupt::default())
            .await;

        assert!(matches!(outcome, RunOutcome::Failed(CollectError::Remote(_))));
        assert_eq!(remote.set_saved_ids(true), vec![2, 1]);
        assert_eq!(remote.saved_ids(), vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_ignored_unsave_fails_instead_of_looping() {
        let mut remote = FakeRemote::with_backlog(3, 2).ignoring_unsaves();

        let outcome = CollectionEngine::new(&mut remote, window(2))
            .collect(&Interrupt::default())
            .await;

        assert!(matches!(outcome, RunOutcome::Failed(CollectError::RepeatedItem(1))));
        assert_eq!(remote.count(|call| matches!(call, Call::ListSaved)), 2);
        assert_eq!(remote.set_saved_ids(true), vec![2, 1]);
    }
}
