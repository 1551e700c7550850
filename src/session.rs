//! Explicit session context with a subscribe/notify observer.
//!
//! Replaces the original front-end's global mutable session state (token and
//! user in browser storage, auth changes broadcast as ad-hoc DOM events).
//! Identity and role are held in one shared context; interested layers
//! subscribe for change events instead of listening on a global channel.

use std::sync::Mutex;

use crate::types::Role;

/// The signed-in identity, as resolved by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// A change to the session, delivered to subscribers in subscription order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
    /// Role changed server-side without a fresh sign-in.
    RoleChanged { user_id: String, role: Role },
}

type Subscriber = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// Shared session state. Locks are held only for the duration of a read or
/// a notification sweep; a poisoned lock degrades to "no session" rather
/// than panicking.
#[derive(Default)]
pub struct SessionContext {
    current: Mutex<Option<Session>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session, if signed in.
    pub fn current(&self) -> Option<Session> {
        self.current.lock().map(|guard| guard.clone()).unwrap_or(None)
    }

    /// Convenience accessors for the aggregation call sites.
    pub fn viewer_id(&self) -> Option<String> {
        self.current().map(|s| s.user_id)
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    /// Register an observer for session changes.
    pub fn subscribe(&self, subscriber: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        if let Ok(mut guard) = self.subscribers.lock() {
            guard.push(Box::new(subscriber));
        }
    }

    pub fn sign_in(&self, session: Session) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(session.clone());
        }
        self.notify(&SessionEvent::SignedIn(session));
    }

    pub fn sign_out(&self) {
        let had_session = self
            .current
            .lock()
            .map(|mut guard| guard.take().is_some())
            .unwrap_or(false);
        if had_session {
            self.notify(&SessionEvent::SignedOut);
        }
    }

    /// Update the role in place, e.g. after the directory reports a change.
    pub fn set_role(&self, role: Role) {
        let changed = match self.current.lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(session) if session.role != role => {
                    session.role = role;
                    Some(session.user_id.clone())
                }
                _ => None,
            },
            Err(_) => None,
        };
        if let Some(user_id) = changed {
            self.notify(&SessionEvent::RoleChanged { user_id, role });
        }
    }

    fn notify(&self, event: &SessionEvent) {
        if let Ok(guard) = self.subscribers.lock() {
            for subscriber in guard.iter() {
                subscriber(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn session(user_id: &str, role: Role) -> Session {
        Session {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            role,
        }
    }

    fn recording_context() -> (SessionContext, Arc<Mutex<Vec<SessionEvent>>>) {
        let ctx = SessionContext::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        ctx.subscribe(move |event| {
            if let Ok(mut guard) = sink.lock() {
                guard.push(event.clone());
            }
        });
        (ctx, seen)
    }

    #[test]
    fn sign_in_updates_current_and_notifies() {
        let (ctx, seen) = recording_context();
        ctx.sign_in(session("u1", Role::Admin));

        assert_eq!(ctx.viewer_id().as_deref(), Some("u1"));
        assert_eq!(ctx.role(), Some(Role::Admin));
        let events = seen.lock().expect("events");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::SignedIn(_)));
    }

    #[test]
    fn sign_out_clears_and_notifies_once() {
        let (ctx, seen) = recording_context();
        ctx.sign_in(session("u1", Role::Others));
        ctx.sign_out();
        ctx.sign_out(); // no session left; no second event

        assert_eq!(ctx.current(), None);
        let events = seen.lock().expect("events");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], SessionEvent::SignedOut);
    }

    #[test]
    fn role_change_notifies_only_on_actual_change() {
        let (ctx, seen) = recording_context();
        ctx.sign_in(session("u1", Role::Others));
        ctx.set_role(Role::Others); // unchanged
        ctx.set_role(Role::Admin);

        assert_eq!(ctx.role(), Some(Role::Admin));
        let events = seen.lock().expect("events");
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            SessionEvent::RoleChanged {
                user_id: "u1".to_string(),
                role: Role::Admin
            }
        );
    }

    #[test]
    fn subscribers_are_notified_in_subscription_order() {
        let ctx = SessionContext::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = order.clone();
            ctx.subscribe(move |_| {
                if let Ok(mut guard) = sink.lock() {
                    guard.push(tag);
                }
            });
        }

        ctx.sign_in(session("u1", Role::Others));
        assert_eq!(*order.lock().expect("order"), vec!["first", "second", "third"]);
    }
}
