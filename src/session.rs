// Session state and the authentication routing guard.
//
// The guard watches the session and re-runs `decide_route` whenever
// `is_authenticated`, `is_loading` or `user` change, issuing one route
// replacement per decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub has_onboarded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<User>,
}

impl SessionState {
    // Session restore still in flight
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            is_authenticated: true,
            is_loading: false,
            user: Some(user),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteTarget {
    MainTabs,
    Onboarding,
    Login,
}

impl RouteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTarget::MainTabs => "main-tabs",
            RouteTarget::Onboarding => "onboarding",
            RouteTarget::Login => "login",
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the app should be for `state`, or `None` while there is nothing to
/// decide yet: the session is still loading, or the user record has not
/// arrived for an authenticated session.
pub fn decide_route(state: &SessionState) -> Option<RouteTarget> {
    if state.is_loading {
        return None;
    }

    if !state.is_authenticated {
        return Some(RouteTarget::Login);
    }

    state.user.as_ref().map(|user| {
        if user.has_onboarded {
            RouteTarget::MainTabs
        } else {
            RouteTarget::Onboarding
        }
    })
}

// Route host; replaces the current stack with `target`
pub trait Navigator: Send + Sync + 'static {
    fn replace(&self, target: RouteTarget);
}

// Owner of the session state. Clones share the same state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::with_state(SessionState::loading())
    }

    pub fn with_state(state: SessionState) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            state: Arc::new(sender),
        }
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Publishes `next`. Observers are only woken if it differs.
    pub fn set(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    pub fn update(&self, modify: impl FnOnce(&mut SessionState)) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            modify(state);
            *state != before
        });
    }

    pub fn sign_in(&self, user: User) {
        self.set(SessionState::signed_in(user));
    }

    pub fn sign_out(&self) {
        self.set(SessionState::signed_out());
    }

    pub fn complete_onboarding(&self) {
        self.update(|state| {
            if let Some(user) = state.user.as_mut() {
                user.has_onboarded = true;
            }
        });
    }
}

pub struct RoutingGuard {
    navigator: Arc<dyn Navigator>,
    last_seen: Option<SessionState>,
}

impl RoutingGuard {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            last_seen: None,
        }
    }

    /// Runs the decision for `state` unless it equals the last state seen.
    /// Returns the route navigated to, if any.
    pub fn evaluate(&mut self, state: &SessionState) -> Option<RouteTarget> {
        if self.last_seen.as_ref() == Some(state) {
            return None;
        }
        self.last_seen = Some(state.clone());

        let target = decide_route(state)?;
        info!(route = %target, "replacing route");
        self.navigator.replace(target);
        Some(target)
    }

    // Returns once every session handle is dropped
    pub async fn run(mut self, mut session: watch::Receiver<SessionState>) {
        loop {
            let state = session.borrow_and_update().clone();
            self.evaluate(&state);

            if session.changed().await.is_err() {
                debug!("session closed, routing guard stopping");
                break;
            }
        }
    }

    pub fn spawn(self, session: watch::Receiver<SessionState>) -> JoinHandle<()> {
        tokio::spawn(self.run(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;
    use test_case::test_case;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<RouteTarget>>,
    }

    impl Navigator for RecordingNavigator {
        fn replace(&self, target: RouteTarget) {
            self.routes.lock().push(target);
        }
    }

    struct ChannelNavigator(mpsc::UnboundedSender<RouteTarget>);

    impl Navigator for ChannelNavigator {
        fn replace(&self, target: RouteTarget) {
            let _ = self.0.send(target);
        }
    }

    fn user(has_onboarded: bool) -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            has_onboarded,
        }
    }

    #[test_case(SessionState::loading(), None ; "loading")]
    #[test_case(SessionState {is_authenticated: true, is_loading: true, user: Some(user(true))}, None ; "loading wins")]
    #[test_case(SessionState::signed_out(), Some(RouteTarget::Login) ; "signed out")]
    #[test_case(SessionState::signed_in(user(false)), Some(RouteTarget::Onboarding) ; "needs onboarding")]
    #[test_case(SessionState::signed_in(user(true)), Some(RouteTarget::MainTabs) ; "onboarded")]
    #[test_case(SessionState {is_authenticated: true, is_loading: false, user: None}, None ; "user record pending")]
    #[test_case(SessionState {is_authenticated: false, is_loading: false, user: Some(user(true))}, Some(RouteTarget::Login) ; "stale user")]
    fn test_decide_route(state: SessionState, expected: Option<RouteTarget>) {
        assert_eq!(decide_route(&state), expected);
    }

    #[test]
    fn test_loading_then_needs_onboarding_navigates_once() {
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = RoutingGuard::new(navigator.clone());

        assert_eq!(guard.evaluate(&SessionState::loading()), None);
        assert_eq!(
            guard.evaluate(&SessionState::signed_in(user(false))),
            Some(RouteTarget::Onboarding)
        );

        assert_eq!(*navigator.routes.lock(), vec![RouteTarget::Onboarding]);
    }

    #[test]
    fn test_unchanged_state_is_not_reevaluated() {
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = RoutingGuard::new(navigator.clone());

        guard.evaluate(&SessionState::signed_in(user(true)));
        guard.evaluate(&SessionState::signed_in(user(true)));
        guard.evaluate(&SessionState::signed_out());

        assert_eq!(
            *navigator.routes.lock(),
            vec![RouteTarget::MainTabs, RouteTarget::Login]
        );
    }

    #[test]
    fn test_profile_edit_renavigates() {
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = RoutingGuard::new(navigator.clone());

        guard.evaluate(&SessionState::signed_in(user(true)));
        let renamed = User {
            name: "Ada Lovelace".to_string(),
            ..user(true)
        };
        assert_eq!(
            guard.evaluate(&SessionState::signed_in(renamed)),
            Some(RouteTarget::MainTabs)
        );

        assert_eq!(
            *navigator.routes.lock(),
            vec![RouteTarget::MainTabs, RouteTarget::MainTabs]
        );
    }

    #[test]
    fn test_session_handle_updates() {
        let handle = SessionHandle::with_state(SessionState::signed_in(user(false)));
        let mut receiver = handle.subscribe();

        handle.set(SessionState::signed_in(user(false)));
        assert!(!receiver.has_changed().unwrap());

        handle.complete_onboarding();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(
            receiver.borrow_and_update().user.as_ref().map(|u| u.has_onboarded),
            Some(true)
        );

        handle.sign_out();
        assert_eq!(handle.current(), SessionState::signed_out());
    }

    async fn next_route(rx: &mut mpsc::UnboundedReceiver<RouteTarget>) -> Option<RouteTarget> {
        tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .ok()
            .flatten()
    }

    async fn no_more_routes(rx: &mut mpsc::UnboundedReceiver<RouteTarget>) -> bool {
        tokio::time::timeout(Duration::from_millis(50), rx.recv())
            .await
            .is_err()
    }

    #[tokio::test]
    async fn test_guard_follows_session_changes() {
        let session = SessionHandle::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = RoutingGuard::new(Arc::new(ChannelNavigator(tx))).spawn(session.subscribe());

        // Loading: nothing happens
        assert!(no_more_routes(&mut rx).await);

        session.sign_in(user(false));
        assert_eq!(next_route(&mut rx).await, Some(RouteTarget::Onboarding));
        assert!(no_more_routes(&mut rx).await);

        session.complete_onboarding();
        assert_eq!(next_route(&mut rx).await, Some(RouteTarget::MainTabs));

        // Session expiring while mounted redirects to login
        session.sign_out();
        assert_eq!(next_route(&mut rx).await, Some(RouteTarget::Login));

        drop(session);
        tokio::time::timeout(Duration::from_millis(500), task)
            .await
            .expect("guard should stop when the session is dropped")
            .unwrap();
    }
}
