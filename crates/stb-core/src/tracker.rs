//! Per-thread hold timer.
//!
//! Each [`ChannelKey`] is either idle (no entry) or held by one participant.
//! Acquire swaps the session in one atomic map operation and release removes
//! it in one, so two racing events on the same key can never both observe the
//! same previous holder.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::info;

use crate::{
    domain::{ChannelKey, UserId},
    formatting::{self, Elapsed},
    identity::IdentityDirectory,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoldSession {
    pub started_at: DateTime<Utc>,
    pub holder: UserId,
}

pub struct SessionTracker {
    sessions: DashMap<ChannelKey, HoldSession>,
    identity: Arc<IdentityDirectory>,
}

impl SessionTracker {
    pub fn new(identity: Arc<IdentityDirectory>) -> Self {
        Self {
            sessions: DashMap::new(),
            identity,
        }
    }

    /// Claim the slot. Always succeeds and preempts any current holder.
    ///
    /// Returns one reply when the slot was idle, or two (release notice for the
    /// previous holder, then the acquire notice) when it was held.
    pub fn acquire(&self, key: ChannelKey, holder: UserId, now: DateTime<Utc>) -> Vec<String> {
        let previous = self.sessions.insert(
            key,
            HoldSession {
                started_at: now,
                holder,
            },
        );

        let mut replies = Vec::with_capacity(2);
        if let Some(prev) = previous {
            let elapsed = Elapsed::between(prev.started_at, now);
            let prev_nick = self.identity.nickname_of(key.chat, prev.holder);
            info!(
                chat = key.chat.0,
                thread = key.thread.0,
                "slot preempted from {} after {elapsed}",
                prev.holder.0
            );
            replies.push(formatting::preempted(&prev_nick, elapsed));
        }

        info!(chat = key.chat.0, thread = key.thread.0, "slot acquired by {}", holder.0);
        let nick = self.identity.nickname_of(key.chat, holder);
        replies.push(formatting::acquired(&nick));
        replies
    }

    /// Release the slot, reporting who held it and for how long.
    pub fn release(&self, key: ChannelKey, now: DateTime<Utc>) -> String {
        let Some((_, prev)) = self.sessions.remove(&key) else {
            return formatting::not_running();
        };

        let elapsed = Elapsed::between(prev.started_at, now);
        info!(
            chat = key.chat.0,
            thread = key.thread.0,
            "slot released by {} after {elapsed}",
            prev.holder.0
        );
        let nick = self.identity.nickname_of(key.chat, prev.holder);
        formatting::released(&nick, elapsed)
    }

    /// Report the current holder and time held so far. No state change.
    pub fn status(&self, key: ChannelKey, now: DateTime<Utc>) -> String {
        let Some(session) = self.session(key) else {
            return formatting::not_running();
        };

        let elapsed = Elapsed::between(session.started_at, now);
        let nick = self.identity.nickname_of(key.chat, session.holder);
        formatting::status(&nick, elapsed)
    }

    pub fn session(&self, key: ChannelKey) -> Option<HoldSession> {
        // Copy out so the shard guard drops immediately.
        self.sessions.get(&key).map(|s| *s.value())
    }

    pub fn holder(&self, key: ChannelKey) -> Option<UserId> {
        self.session(key).map(|s| s.holder)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ThreadId};
    use chrono::Duration;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn setup() -> (Arc<IdentityDirectory>, SessionTracker) {
        let identity = Arc::new(IdentityDirectory::new());
        let tracker = SessionTracker::new(identity.clone());
        (identity, tracker)
    }

    const KEY: ChannelKey = ChannelKey {
        chat: ChatId(1),
        thread: ThreadId(0),
    };

    #[test]
    fn preemption_scenario() {
        let (identity, tracker) = setup();
        identity.observe(KEY.chat, "a", UserId(1));
        identity.observe(KEY.chat, "b", UserId(2));

        let r = tracker.acquire(KEY, UserId(1), t(0));
        assert_eq!(r, vec!["Номер у @a стал".to_string()]);

        let r = tracker.acquire(KEY, UserId(2), t(125));
        assert_eq!(
            r,
            vec![
                "Номер стоял у @a: 2 минут 5 секунд".to_string(),
                "Номер у @b стал".to_string(),
            ]
        );

        let r = tracker.status(KEY, t(185));
        assert_eq!(r, "Таймер работает у @b: 1 минут 0 секунд");
        assert_eq!(tracker.holder(KEY), Some(UserId(2)));
    }

    #[test]
    fn release_then_idle() {
        let (_, tracker) = setup();
        tracker.acquire(KEY, UserId(123456), t(0));

        let r = tracker.release(KEY, t(61));
        assert_eq!(r, "Номер стоял у игрок 3456 (слёт): 1 минут 1 секунд");
        assert_eq!(tracker.holder(KEY), None);

        assert_eq!(tracker.release(KEY, t(62)), "Таймер не запущен");
        assert_eq!(tracker.status(KEY, t(63)), "Таймер не запущен");
    }

    #[test]
    fn acquire_on_idle_yields_single_reply() {
        let (_, tracker) = setup();
        assert_eq!(tracker.acquire(KEY, UserId(1), t(0)).len(), 1);
        assert_eq!(tracker.acquire(KEY, UserId(1), t(1)).len(), 2);
        tracker.release(KEY, t(2));
        assert_eq!(tracker.acquire(KEY, UserId(1), t(3)).len(), 1);
    }

    #[test]
    fn threads_are_independent_slots() {
        let (_, tracker) = setup();
        let other = ChannelKey::new(KEY.chat, ThreadId(42));

        tracker.acquire(KEY, UserId(1), t(0));
        tracker.acquire(other, UserId(2), t(0));
        assert_eq!(tracker.active_count(), 2);

        tracker.release(other, t(10));
        assert_eq!(tracker.holder(KEY), Some(UserId(1)));
        assert_eq!(tracker.holder(other), None);
    }

    fn elapsed_in(reply: &str) -> (i64, i64) {
        let (_, tail) = reply.rsplit_once(':').unwrap();
        let nums: Vec<i64> = tail
            .split_whitespace()
            .filter_map(|w| w.parse().ok())
            .collect();
        (nums[0], nums[1])
    }

    #[test]
    fn status_is_monotonic_and_read_only() {
        let (_, tracker) = setup();
        tracker.acquire(KEY, UserId(9), t(0));
        let before = tracker.session(KEY);

        let first = tracker.status(KEY, t(59));
        let second = tracker.status(KEY, t(59) + Duration::seconds(2));
        assert_eq!(elapsed_in(&first), (0, 59));
        assert_eq!(elapsed_in(&second), (1, 1));
        assert!(elapsed_in(&second) >= elapsed_in(&first));

        assert_eq!(tracker.session(KEY), before);
    }

    #[test]
    fn holder_is_last_unreleased_acquirer() {
        let (_, tracker) = setup();
        let ops: &[(bool, i64)] = &[(true, 1), (true, 2), (false, 0), (true, 3), (true, 4)];
        let mut expected = None;
        for (i, (acquire, user)) in ops.iter().enumerate() {
            if *acquire {
                tracker.acquire(KEY, UserId(*user), t(i as i64));
                expected = Some(UserId(*user));
            } else {
                tracker.release(KEY, t(i as i64));
                expected = None;
            }
            assert_eq!(tracker.holder(KEY), expected);
            assert!(tracker.active_count() <= 1);
        }
    }

    #[test]
    fn concurrent_acquires_leave_exactly_one_holder() {
        let (_, tracker) = setup();
        let tracker = Arc::new(tracker);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = tracker.clone();
                std::thread::spawn(move || tracker.acquire(KEY, UserId(i), t(i)).len())
            })
            .collect();
        let replies: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // Exactly one acquire found the slot idle.
        assert_eq!(replies, 8 * 2 - 1);
        assert_eq!(tracker.active_count(), 1);
    }
}
