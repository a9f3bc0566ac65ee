//! RouteGuard - decides whether a protected view may mount.

use super::store::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not settled yet: render nothing, do not redirect.
    Pending,
    Redirect(String),
    Render,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    redirect_to: String,
    protected: Vec<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new("/")
            .protect("/dashboard")
            .protect("/boost")
            .protect("/become-booster")
            .protect("/boost-lp")
            .protect("/wallet")
            .protect("/send")
    }
}

impl RouteGuard {
    pub fn new(redirect_to: impl Into<String>) -> Self {
        Self { redirect_to: redirect_to.into(), protected: Vec::new() }
    }

    pub fn protect(mut self, path: impl Into<String>) -> Self {
        self.protected.push(path.into());
        self
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|p| p == path)
    }

    /// Decision for a protected view.
    pub fn decide(&self, session: &Session) -> GuardDecision {
        if session.is_loading() {
            GuardDecision::Pending
        } else if session.is_authenticated() {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect(self.redirect_to.clone())
        }
    }

    /// Decision for any path; unprotected paths always render.
    pub fn decide_for(&self, path: &str, session: &Session) -> GuardDecision {
        if self.is_protected(path) {
            self.decide(session)
        } else {
            GuardDecision::Render
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;

    #[test]
    fn pending_while_loading() {
        let guard = RouteGuard::default();
        assert_eq!(guard.decide(&Session::loading()), GuardDecision::Pending);
        assert_eq!(guard.decide_for("/boost", &Session::loading()), GuardDecision::Pending);
    }

    #[test]
    fn redirects_once_settled_without_identity() {
        let guard = RouteGuard::default();
        assert_eq!(guard.decide(&Session::anonymous()), GuardDecision::Redirect("/".into()));
        assert_eq!(guard.decide_for("/", &Session::anonymous()), GuardDecision::Render);
    }

    #[test]
    fn renders_when_authenticated() {
        let guard = RouteGuard::new("/login").protect("/vault");
        let session = Session::authenticated(Identity::new("2vxsx-fae", None).unwrap());
        assert_eq!(guard.decide_for("/vault", &session), GuardDecision::Render);
        assert_eq!(guard.decide_for("/vault", &Session::anonymous()), GuardDecision::Redirect("/login".into()));
    }
}
