use crate::controller::{first_error, Controller, LifecycleFuture};
use crate::state::LifecycleFlags;
use futures::future;
use std::cell::RefCell;

/// Controllers deactivating under one initiator, in enlistment order.
///
/// Members are enlisted children-first and their `detaching` futures are
/// collected here.  The initiator settles every pending `detaching`
/// (including those of members enlisted while settling) before any member
/// runs `unbinding`.
#[derive(Default)]
pub(crate) struct DeactivationBatch {
    members: RefCell<Vec<Controller>>,
    pending: RefCell<Vec<LifecycleFuture>>,
}

impl DeactivationBatch {
    pub(crate) fn enlist(&self, member: Controller, detaching: LifecycleFuture) {
        self.members.borrow_mut().push(member);
        self.pending.borrow_mut().push(detaching);
    }

    /// Settle the batch.  Every member completes its deactivation even when
    /// a hook fails; the first failure is returned afterwards.
    pub(crate) async fn settle(&self, initiator: &Controller, flags: LifecycleFlags) -> Result<(), crate::LifecycleError> {
        let mut results = Vec::new();
        loop {
            let pending = std::mem::take(&mut *self.pending.borrow_mut());
            if pending.is_empty() {
                break;
            }
            results.extend(future::join_all(pending).await);
        }

        let members = self.members.borrow().clone();
        tracing::trace!(initiator = %initiator.name(), members = members.len(), "detached batch");
        for member in &members {
            member.unmount();
        }
        let unbinding: Vec<_> = members
            .iter()
            .map(|member| member.unbinding(initiator, flags))
            .collect();
        results.extend(future::join_all(unbinding).await);

        for member in &members {
            member.finish_deactivation(flags);
        }
        self.members.borrow_mut().clear();
        first_error(results)
    }
}
