//! The capture state machine.

use std::time::Duration;

use super::CAPTURE_BIAS_SECS;
use crate::context::{ContextToken, Navigator};
use crate::error::{NoteError, NoteResult};
use crate::player::PositionProvider;
use crate::storage::{Note, NoteBackend, NoteList, NoteStore};

/// Position minus the capture bias, never below zero.
pub fn biased_start(position: f64) -> f64 {
    (position - CAPTURE_BIAS_SECS).max(0.0)
}

/// Asks `provider` for the playback position, waiting at most `timeout`.
pub async fn fetch_position<P>(provider: &P, timeout: Duration) -> NoteResult<f64>
where
    P: PositionProvider + ?Sized,
{
    tokio::time::timeout(timeout, provider.current_position())
        .await
        .map_err(|_| NoteError::PositionUnavailable("the player did not answer in time".to_string()))?
}

/// Where a session is in its composition cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureState {
    /// Input is empty.
    Idle,
    /// Input is non-empty. `start_time` is set once the position fetch lands.
    Capturing { start_time: Option<f64> },
}

/// Identifies the fetch issued for one composition cycle.
///
/// A result is applied only if the ticket still matches the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTicket {
    generation: u64,
    cycle: u64,
}

/// Tracks the timestamp for the note currently being typed.
pub struct CaptureSession {
    navigator: Navigator,
    token: ContextToken,
    state: CaptureState,
    cycle: u64,
    timeout: Duration,
}

impl CaptureSession {
    /// Starts an idle session for the video behind `token`.
    ///
    /// `timeout` bounds every position fetch the session makes.
    pub fn new(navigator: Navigator, token: ContextToken, timeout: Duration) -> Self {
        Self {
            navigator,
            token,
            state: CaptureState::Idle,
            cycle: 0,
            timeout,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn token(&self) -> &ContextToken {
        &self.token
    }

    /// The biased timestamp captured this cycle, if any.
    pub fn start_time(&self) -> Option<f64> {
        match self.state {
            CaptureState::Capturing { start_time } => start_time,
            CaptureState::Idle => None,
        }
    }

    /// Reacts to the input text changing.
    ///
    /// Returns a ticket when the input goes from empty to non-empty; the
    /// caller fetches the position and hands the result to [`complete`].
    /// Clearing the input drops the cycle and any fetch still in flight.
    ///
    /// [`complete`]: CaptureSession::complete
    pub fn input_changed(&mut self, text: &str) -> Option<CaptureTicket> {
        match (self.state, text.is_empty()) {
            (CaptureState::Idle, false) => {
                self.cycle += 1;
                self.state = CaptureState::Capturing { start_time: None };
                Some(self.ticket())
            }
            (CaptureState::Capturing { .. }, true) => {
                self.reset();
                None
            }
            _ => None,
        }
    }

    /// Applies a fetch result. Returns false if the result was stale.
    pub fn complete(&mut self, ticket: &CaptureTicket, result: NoteResult<f64>) -> bool {
        if *ticket != self.ticket() || !self.navigator.is_current(&self.token) {
            tracing::debug!(?ticket, "Dropping stale capture result");
            return false;
        }
        let CaptureState::Capturing { start_time: None } = self.state else {
            return false;
        };

        match result {
            Ok(position) => {
                let start_time = biased_start(position);
                tracing::debug!(position, start_time, "Captured note start");
                self.state = CaptureState::Capturing {
                    start_time: Some(start_time),
                };
                true
            }
            Err(e) => {
                tracing::debug!("Capture fetch failed, will use live position on submit: {e}");
                false
            }
        }
    }

    /// [`input_changed`] plus the fetch, for callers that can wait on it.
    ///
    /// [`input_changed`]: CaptureSession::input_changed
    pub async fn observe_input<P>(&mut self, text: &str, provider: &P)
    where
        P: PositionProvider + ?Sized,
    {
        if let Some(ticket) = self.input_changed(text) {
            let result = fetch_position(provider, self.timeout).await;
            self.complete(&ticket, result);
        }
    }

    /// Stores a note with the captured time and returns the updated list.
    ///
    /// Without a captured time the live position is fetched instead. If
    /// that fails too, nothing is stored and the session keeps its state
    /// so the user can retry.
    pub async fn submit<B, P>(
        &mut self,
        store: &NoteStore<B>,
        text: &str,
        provider: &P,
    ) -> NoteResult<NoteList>
    where
        B: NoteBackend,
        P: PositionProvider + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(NoteError::EmptyInput);
        }
        self.ensure_current()?;

        let time = match self.start_time() {
            Some(start_time) => start_time,
            None => fetch_position(provider, self.timeout).await?,
        };
        self.ensure_current()?;

        let notes = store.append(&self.token.content_id, Note::new(text, time))?;
        tracing::debug!(id = %self.token.content_id, time, "Note added");

        self.reset();
        Ok(notes)
    }

    /// Points the session at a newly navigated video, discarding the cycle.
    pub fn rebind(&mut self, token: ContextToken) {
        self.token = token;
        self.reset();
    }

    /// Returns to idle. Fetches still in flight are ignored when they land.
    pub fn reset(&mut self) {
        self.cycle += 1;
        self.state = CaptureState::Idle;
    }

    fn ticket(&self) -> CaptureTicket {
        CaptureTicket {
            generation: self.token.generation(),
            cycle: self.cycle,
        }
    }

    fn ensure_current(&self) -> NoteResult<()> {
        if self.navigator.is_current(&self.token) {
            Ok(())
        } else {
            Err(NoteError::StaleContext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider that answers from a script and counts requests.
    #[derive(Default)]
    struct FakePlayer {
        answers: Mutex<VecDeque<NoteResult<f64>>>,
        calls: AtomicUsize,
    }

    impl FakePlayer {
        fn answering(answers: Vec<NoteResult<f64>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PositionProvider for FakePlayer {
        async fn current_position(&self) -> NoteResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(NoteError::PositionUnavailable("no answer".to_string())))
        }

        async fn seek_to(&self, _seconds: f64) -> NoteResult<()> {
            Ok(())
        }
    }

    struct StalledPlayer;

    #[async_trait]
    impl PositionProvider for StalledPlayer {
        async fn current_position(&self) -> NoteResult<f64> {
            std::future::pending().await
        }

        async fn seek_to(&self, _seconds: f64) -> NoteResult<()> {
            std::future::pending().await
        }
    }

    fn session(url: &str) -> (Navigator, CaptureSession) {
        let navigator = Navigator::new();
        let token = navigator.navigate(url).expect("valid test url");
        let session = CaptureSession::new(navigator.clone(), token, Duration::from_millis(100));
        (navigator, session)
    }

    fn unavailable() -> NoteError {
        NoteError::PositionUnavailable("player gone".to_string())
    }

    #[test]
    fn test_biased_start() {
        assert_eq!(biased_start(42.0), 37.0);
        assert_eq!(biased_start(3.0), 0.0);
        assert_eq!(biased_start(5.0), 0.0);
    }

    #[tokio::test]
    async fn test_first_keystroke_captures_biased_time() {
        let (_nav, mut session) = session("abc123");
        let player = FakePlayer::answering(vec![Ok(42.0)]);

        session.observe_input("h", &player).await;
        assert_eq!(session.start_time(), Some(37.0));
    }

    #[tokio::test]
    async fn test_capture_floors_at_zero() {
        let (_nav, mut session) = session("abc123");
        let player = FakePlayer::answering(vec![Ok(3.0)]);

        session.observe_input("h", &player).await;
        assert_eq!(session.start_time(), Some(0.0));
    }

    #[tokio::test]
    async fn test_further_keystrokes_do_not_refetch() {
        let (_nav, mut session) = session("abc123");
        let player = FakePlayer::answering(vec![Ok(42.0), Ok(99.0)]);

        for text in ["h", "he", "hel", "hell"] {
            session.observe_input(text, &player).await;
        }
        assert_eq!(player.calls(), 1);
        assert_eq!(session.start_time(), Some(37.0));
    }

    #[tokio::test]
    async fn test_clearing_input_starts_new_cycle() {
        let (_nav, mut session) = session("abc123");
        let player = FakePlayer::answering(vec![Ok(42.0), Ok(100.0)]);

        session.observe_input("h", &player).await;
        session.observe_input("", &player).await;
        assert_eq!(session.state(), CaptureState::Idle);

        session.observe_input("n", &player).await;
        assert_eq!(session.start_time(), Some(95.0));
        assert_eq!(player.calls(), 2);
    }

    #[test]
    fn test_late_result_after_clear_is_dropped() {
        let (_nav, mut session) = session("abc123");

        let ticket = session.input_changed("h").expect("Should issue a ticket");
        assert!(session.input_changed("he").is_none());
        session.input_changed("");

        assert!(!session.complete(&ticket, Ok(42.0)));
        assert_eq!(session.start_time(), None);
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[test]
    fn test_late_result_after_navigation_is_dropped() {
        let (nav, mut session) = session("abc123");

        let ticket = session.input_changed("h").unwrap();
        nav.navigate("def456").unwrap();

        assert!(!session.complete(&ticket, Ok(42.0)));
        assert_eq!(session.start_time(), None);
    }

    #[test]
    fn test_result_for_previous_cycle_is_dropped() {
        let (_nav, mut session) = session("abc123");

        let old = session.input_changed("a").unwrap();
        session.input_changed("");
        let new = session.input_changed("b").unwrap();

        assert!(!session.complete(&old, Ok(10.0)));
        assert!(session.complete(&new, Ok(20.0)));
        assert_eq!(session.start_time(), Some(15.0));
    }

    #[tokio::test]
    async fn test_submit_uses_captured_time_and_resets() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Ok(42.0), Ok(60.0)]);

        session.observe_input("p", &player).await;
        let notes = session.submit(&store, "  point  ", &player).await.unwrap();

        assert_eq!(notes.len(), 1);
        let note = notes.get(0).unwrap();
        assert_eq!(note.text, "point");
        assert_eq!(note.time, 37.0);
        assert_eq!(player.calls(), 1, "Submit should not refetch");
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn test_submit_without_capture_uses_live_position() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Ok(61.5)]);

        let notes = session.submit(&store, "pasted", &player).await.unwrap();
        assert_eq!(notes.get(0).unwrap().time, 61.5);
    }

    #[tokio::test]
    async fn test_failed_capture_falls_back_to_live_fetch() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Err(unavailable()), Ok(30.0)]);

        session.observe_input("x", &player).await;
        assert_eq!(session.start_time(), None);
        assert!(matches!(session.state(), CaptureState::Capturing { .. }));

        let notes = session.submit(&store, "x", &player).await.unwrap();
        assert_eq!(notes.get(0).unwrap().time, 30.0);
    }

    #[tokio::test]
    async fn test_submit_fails_when_player_unavailable() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Err(unavailable()), Err(unavailable())]);

        session.observe_input("x", &player).await;
        let err = session.submit(&store, "x", &player).await.unwrap_err();

        assert!(matches!(err, NoteError::PositionUnavailable(_)));
        let id = session.token().content_id.clone();
        assert!(store.load(&id).unwrap().is_empty(), "Nothing should be stored");
        assert!(matches!(session.state(), CaptureState::Capturing { .. }));
    }

    #[tokio::test]
    async fn test_stalled_player_fails_submit() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());

        let err = session.submit(&store, "x", &StalledPlayer).await.unwrap_err();
        assert!(matches!(err, NoteError::PositionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let (_nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Ok(1.0)]);

        let err = session.submit(&store, "   ", &player).await.unwrap_err();
        assert_eq!(err, NoteError::EmptyInput);
        assert_eq!(player.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_navigation_is_stale() {
        let (nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Ok(42.0)]);

        session.observe_input("x", &player).await;
        nav.navigate("def456").unwrap();

        let err = session.submit(&store, "x", &player).await.unwrap_err();
        assert_eq!(err, NoteError::StaleContext);
        for id in ["abc123", "def456"] {
            let id = crate::context::ContentId::resolve(id).unwrap();
            assert!(store.load(&id).unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_rebind_targets_new_video() {
        let (nav, mut session) = session("abc123");
        let store = NoteStore::new(MemoryBackend::new());
        let player = FakePlayer::answering(vec![Ok(42.0), Ok(12.0)]);

        session.observe_input("x", &player).await;
        session.rebind(nav.navigate("def456").unwrap());
        assert_eq!(session.state(), CaptureState::Idle);

        session.observe_input("y", &player).await;
        session.submit(&store, "y", &player).await.unwrap();

        let id = crate::context::ContentId::resolve("def456").unwrap();
        let notes = store.load(&id).unwrap();
        assert_eq!(notes.get(0).unwrap().time, 7.0);
    }
}
