//! Authentication flow for the application's own routes.
//!
//! # State Machine
//! ```text
//! no session,  path != login      → redirect login (?next=path unless path == "/")
//! session, account younger than
//!   the onboarding window, path != onboarding, no invitation
//!                                 → redirect onboarding
//! session,     path == login      → redirect to decoded `next` (default dashboard)
//! otherwise                       → continue
//! ```
//!
//! A session only counts when it carries an email. Decode failures arrive
//! here as "no session".

use chrono::{DateTime, Duration, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::config::SessionConfig;
use crate::routing::decision::RoutingDecision;
use crate::routing::request::IncomingRequest;
use crate::session::SessionToken;

/// Characters `encodeURIComponent` leaves alone, besides alphanumerics.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone)]
pub struct AppHandler {
    login_path: String,
    onboarding_path: String,
    dashboard_path: String,
    confirm_email_change_path: String,
    invitation_param: String,
    onboarding_window: Duration,
}

impl AppHandler {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
            onboarding_path: config.onboarding_path.clone(),
            dashboard_path: config.dashboard_path.clone(),
            confirm_email_change_path: config.confirm_email_change_path.clone(),
            invitation_param: config.invitation_param.clone(),
            onboarding_window: Duration::try_seconds(config.onboarding_window_secs).unwrap_or_else(Duration::zero),
        }
    }

    pub fn handle(
        &self,
        request: &IncomingRequest,
        session: Option<&SessionToken>,
        now: DateTime<Utc>,
    ) -> RoutingDecision {
        let path = request.path();
        let session = session.filter(|s| s.is_authenticated());

        let Some(session) = session else {
            if path == self.login_path {
                return RoutingDecision::Continue;
            }
            return RoutingDecision::redirect(self.login_redirect(request));
        };

        let recently_created = session
            .created_at()
            .zip(now.checked_sub_signed(self.onboarding_window))
            .is_some_and(|(created, window_start)| created > window_start);
        if recently_created
            && path != self.onboarding_path
            && !request.has_param(&self.invitation_param)
        {
            return RoutingDecision::redirect(join_or_base(request.url(), &self.onboarding_path));
        }

        if path == self.login_path {
            let next = request.param("next").unwrap_or(&self.dashboard_path);
            let next = percent_decode_str(next)
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| next.to_string());
            let location = request
                .url()
                .join(&next)
                .unwrap_or_else(|_| join_or_base(request.url(), &self.dashboard_path));
            return RoutingDecision::redirect(location);
        }

        RoutingDecision::Continue
    }

    fn login_redirect(&self, request: &IncomingRequest) -> Url {
        let mut login = join_or_base(request.url(), &self.login_path);
        let path = request.path();
        if path != "/" {
            let next = if path == self.confirm_email_change_path {
                request.path_and_query()
            } else {
                path.to_string()
            };
            login.set_query(Some(&format!("next={}", encode_component(&next))));
        }
        login
    }
}

/// Percent-encode with the `encodeURIComponent` character set.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

fn join_or_base(base: &Url, path: &str) -> Url {
    base.join(path).unwrap_or_else(|_| base.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUser;

    fn handler() -> AppHandler {
        AppHandler::from_config(&SessionConfig::default())
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn session(created_secs_ago: Option<i64>) -> SessionToken {
        SessionToken {
            email: Some("ada@example.com".into()),
            user: Some(SessionUser {
                created_at: created_secs_ago.map(|s| (now() - Duration::seconds(s)).to_rfc3339()),
            }),
        }
    }

    fn location(decision: RoutingDecision) -> String {
        match decision {
            RoutingDecision::Redirect { location, permanent } => {
                assert!(!permanent);
                format!("{}{}", location.path(), location.query().map(|q| format!("?{}", q)).unwrap_or_default())
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    fn req(path: &str) -> IncomingRequest {
        IncomingRequest::new("https", "app.papermark.com", path).unwrap()
    }

    #[test]
    fn test_unauthenticated_goes_to_login_with_next() {
        let d = handler().handle(&req("/dashboard"), None, now());
        assert_eq!(location(d), "/login?next=%2Fdashboard");
    }

    #[test]
    fn test_unauthenticated_root_has_no_next() {
        let d = handler().handle(&req("/"), None, now());
        assert_eq!(location(d), "/login");
    }

    #[test]
    fn test_unauthenticated_login_continues() {
        assert_eq!(handler().handle(&req("/login"), None, now()), RoutingDecision::Continue);
    }

    #[test]
    fn test_confirm_email_change_keeps_query() {
        let d = handler().handle(&req("/auth/confirm-email-change?token=abc&x=1"), None, now());
        assert_eq!(
            location(d),
            "/login?next=%2Fauth%2Fconfirm-email-change%3Ftoken%3Dabc%26x%3D1"
        );
        // Other paths drop their query.
        let d = handler().handle(&req("/documents?page=2"), None, now());
        assert_eq!(location(d), "/login?next=%2Fdocuments");
    }

    #[test]
    fn test_session_without_email_is_unauthenticated() {
        let token = SessionToken { email: None, user: None };
        let d = handler().handle(&req("/dashboard"), Some(&token), now());
        assert_eq!(location(d), "/login?next=%2Fdashboard");
    }

    #[test]
    fn test_new_account_goes_to_onboarding() {
        let d = handler().handle(&req("/dashboard"), Some(&session(Some(2))), now());
        assert_eq!(location(d), "/welcome");
    }

    #[test]
    fn test_new_account_with_invitation_continues() {
        let d = handler().handle(&req("/dashboard?invitation=abc"), Some(&session(Some(2))), now());
        assert_eq!(d, RoutingDecision::Continue);
    }

    #[test]
    fn test_new_account_on_onboarding_continues() {
        let d = handler().handle(&req("/welcome"), Some(&session(Some(2))), now());
        assert_eq!(d, RoutingDecision::Continue);
    }

    #[test]
    fn test_oversized_onboarding_window_never_panics() {
        for secs in [i64::MAX, 9_000_000_000_000] {
            let config = SessionConfig {
                onboarding_window_secs: secs,
                ..SessionConfig::default()
            };
            let d = AppHandler::from_config(&config).handle(&req("/dashboard"), Some(&session(Some(2))), now());
            assert_eq!(d, RoutingDecision::Continue, "{}", secs);
        }
    }

    #[test]
    fn test_onboarding_window_boundary() {
        // Exactly at the window edge the account no longer counts as new.
        let d = handler().handle(&req("/dashboard"), Some(&session(Some(10))), now());
        assert_eq!(d, RoutingDecision::Continue);
        let d = handler().handle(&req("/dashboard"), Some(&session(Some(9))), now());
        assert_eq!(location(d), "/welcome");
    }

    #[test]
    fn test_new_account_on_login_goes_to_onboarding_first() {
        let d = handler().handle(&req("/login?next=%2Fsettings"), Some(&session(Some(1))), now());
        assert_eq!(location(d), "/welcome");
    }

    #[test]
    fn test_login_with_session_follows_next() {
        let d = handler().handle(&req("/login?next=%2Fsettings"), Some(&session(None)), now());
        assert_eq!(location(d), "/settings");
    }

    #[test]
    fn test_login_with_double_encoded_next() {
        let d = handler().handle(&req("/login?next=%252Fdocuments%253Fa%253D1"), Some(&session(Some(3600))), now());
        assert_eq!(location(d), "/documents?a=1");
    }

    #[test]
    fn test_login_with_session_defaults_to_dashboard() {
        let d = handler().handle(&req("/login"), Some(&session(Some(3600))), now());
        assert_eq!(location(d), "/dashboard");
    }

    #[test]
    fn test_malformed_next_is_kept_verbatim() {
        let d = handler().handle(&req("/login?next=%25E0%25A4"), Some(&session(None)), now());
        // The second decoding pass yields invalid UTF-8, so the once-decoded value is used.
        assert_eq!(location(d), "/%E0%A4");
    }

    #[test]
    fn test_unparsable_created_at_is_ignored() {
        let token = SessionToken {
            email: Some("ada@example.com".into()),
            user: Some(SessionUser { created_at: Some("yesterday".into()) }),
        };
        assert_eq!(handler().handle(&req("/dashboard"), Some(&token), now()), RoutingDecision::Continue);
    }

    #[test]
    fn test_established_session_continues() {
        let d = handler().handle(&req("/documents/abc"), Some(&session(Some(86_400))), now());
        assert_eq!(d, RoutingDecision::Continue);
    }

    #[test]
    fn test_encode_component_matches_browser() {
        assert_eq!(encode_component("/a b/(x)!*~'.-_"), "%2Fa%20b%2F(x)!*~'.-_");
    }
}
