// Resume read/write path: reconciled views, saved snapshots and document export.

pub mod export;
pub mod handlers;
pub mod reconciler;
pub mod snapshot;
