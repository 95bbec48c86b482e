//! Per-call callback table.

use std::fmt;

use chnative_protocol::{Block, ProfileEvent, ProfileInfo, Progress, ServerLog};

type Slot<'a, T> = Option<Box<dyn FnMut(T) + Send + 'a>>;

/// Sinks for the packets a response stream may carry.
///
/// Every slot is optional. When a packet arrives for a slot that is not
/// set, its payload is still decoded (the stream must stay aligned) and
/// then dropped.
///
/// Each callback runs while the connection's read lock is held, so it
/// should hand work off rather than block.
///
/// ```rust,ignore
/// let mut blocks = Vec::new();
/// let mut on = OnProcess::new().on_data(|block| blocks.push(block));
/// conn.drain(&ctx, &mut on).await?;
/// drop(on);
/// ```
#[derive(Default)]
pub struct OnProcess<'a> {
    data: Slot<'a, Block>,
    logs: Slot<'a, Vec<ServerLog>>,
    progress: Slot<'a, Progress>,
    profile_info: Slot<'a, ProfileInfo>,
    profile_events: Slot<'a, Vec<ProfileEvent>>,
}

impl<'a> OnProcess<'a> {
    /// Create a table with every slot unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every block that has at least one row.
    #[must_use]
    pub fn on_data(mut self, f: impl FnMut(Block) + Send + 'a) -> Self {
        self.data = Some(Box::new(f));
        self
    }

    /// Receive server log records.
    #[must_use]
    pub fn on_logs(mut self, f: impl FnMut(Vec<ServerLog>) + Send + 'a) -> Self {
        self.logs = Some(Box::new(f));
        self
    }

    /// Receive progress updates.
    #[must_use]
    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Receive the query's profile summary.
    #[must_use]
    pub fn on_profile_info(mut self, f: impl FnMut(ProfileInfo) + Send + 'a) -> Self {
        self.profile_info = Some(Box::new(f));
        self
    }

    /// Receive profile event counters.
    #[must_use]
    pub fn on_profile_events(mut self, f: impl FnMut(Vec<ProfileEvent>) + Send + 'a) -> Self {
        self.profile_events = Some(Box::new(f));
        self
    }

    pub(crate) fn data(&mut self, block: Block) {
        if let Some(f) = self.data.as_mut() {
            f(block);
        }
    }

    pub(crate) fn logs(&mut self, logs: Vec<ServerLog>) {
        if let Some(f) = self.logs.as_mut() {
            f(logs);
        }
    }

    pub(crate) fn progress(&mut self, progress: Progress) {
        if let Some(f) = self.progress.as_mut() {
            f(progress);
        }
    }

    pub(crate) fn profile_info(&mut self, info: ProfileInfo) {
        if let Some(f) = self.profile_info.as_mut() {
            f(info);
        }
    }

    pub(crate) fn profile_events(&mut self, events: Vec<ProfileEvent>) {
        if let Some(f) = self.profile_events.as_mut() {
            f(events);
        }
    }
}

impl fmt::Debug for OnProcess<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnProcess")
            .field("data", &self.data.is_some())
            .field("logs", &self.logs.is_some())
            .field("progress", &self.progress.is_some())
            .field("profile_info", &self.profile_info.is_some())
            .field("profile_events", &self.profile_events.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_slots_are_no_ops() {
        let mut on = OnProcess::new();
        on.data(Block::default());
        on.logs(Vec::new());
        on.progress(Progress::default());
        on.profile_info(ProfileInfo::default());
        on.profile_events(Vec::new());
    }

    #[test]
    fn test_set_slot_is_invoked() {
        let mut seen = Vec::new();
        let mut on = OnProcess::new().on_progress(|p| seen.push(p.rows));
        on.progress(Progress {
            rows: 7,
            ..Progress::default()
        });
        on.progress(Progress::default());
        drop(on);
        assert_eq!(seen, vec![7, 0]);
    }

    #[test]
    fn test_debug_shows_set_slots() {
        let on = OnProcess::new().on_logs(|_| {});
        let debug = format!("{on:?}");
        assert!(debug.contains("logs: true"));
        assert!(debug.contains("data: false"));
    }

    #[test]
    fn test_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<OnProcess<'_>>();
    }
}
