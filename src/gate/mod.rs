//! Request-time integration: the before-action check that turns a decision
//! into either nothing (allow) or exactly one deny response.

mod redirect;

use std::sync::Arc;

use serde_json::json;

use crate::enforcement::capability::Clearance;
use crate::enforcement::controller::Controller;
use crate::error::TierGuardError;
use crate::persona::Persona;

pub const DENIAL_NOTICE: &str = "You are not authorized to perform this action.";
pub const UNAUTHORIZED: u16 = 401;
pub const DEFAULT_FALLBACK_LOCATION: &str = "/";

/// Response representation negotiated by the host for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Browser-facing HTML.
    Interactive,
    /// JSON API.
    MachineReadable,
    Other,
}

impl Representation {
    /// Map a negotiated format name (`html`, `json`, ...) to a representation.
    pub fn from_format(format: &str) -> Self {
        match format.to_ascii_lowercase().as_str() {
            "html" => Representation::Interactive,
            "json" => Representation::MachineReadable,
            _ => Representation::Other,
        }
    }
}

/// What the host exposes about the request being dispatched.
pub trait RequestContext {
    fn action(&self) -> &str;

    /// Principal yielded by the named accessor, e.g. `current_user`.
    /// `None` for anonymous requests.
    fn current_principal(&self, accessor: &str) -> Option<&dyn Persona>;

    fn representation(&self) -> Representation;

    fn referrer(&self) -> Option<&str> {
        None
    }

    /// Host (and port, if non-default) the request was addressed to.
    fn host(&self) -> Option<&str> {
        None
    }
}

/// Deny responses the host knows how to produce.
pub trait ResponseSink {
    fn redirect_with_notice(&mut self, notice: &str, location: &str);

    fn render_json(&mut self, status: u16, body: &serde_json::Value);

    fn head(&mut self, status: u16);
}

/// Pre-action hook registration offered by the host's dispatcher.
/// Ordering relative to other hooks is the caller's concern.
pub trait HookRegistry {
    fn before_action(&mut self, controller: &str, gate: AuthorizationGate);
}

impl HookRegistry for Vec<AuthorizationGate> {
    fn before_action(&mut self, _controller: &str, gate: AuthorizationGate) {
        self.push(gate);
    }
}

#[derive(Debug)]
pub enum Outcome {
    Allow(Clearance),
    Deny,
}

impl Outcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allow(_))
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    controller: Arc<Controller>,
    fallback_location: String,
}

impl AuthorizationGate {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self {
            controller,
            fallback_location: DEFAULT_FALLBACK_LOCATION.to_owned(),
        }
    }

    pub fn with_fallback_location(mut self, location: impl Into<String>) -> Self {
        self.fallback_location = location.into();
        self
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Run the check for one request. On deny, exactly one sink method is
    /// called; on allow, none is. Configuration mistakes are returned as errors
    /// and produce no response.
    pub fn authorize<R, S>(&self, request: &R, sink: &mut S) -> Result<Outcome, TierGuardError>
    where
        R: RequestContext + ?Sized,
        S: ResponseSink + ?Sized,
    {
        if let Some(clearance) = self.controller.request_clearance(request)? {
            return Ok(Outcome::Allow(clearance));
        }

        let representation = request.representation();
        tracing::warn!(
            controller = %self.controller.name(),
            action = %request.action(),
            ?representation,
            "request denied"
        );

        match representation {
            Representation::Interactive => {
                let location =
                    redirect::safe_location(request.referrer(), request.host(), &self.fallback_location);
                sink.redirect_with_notice(DENIAL_NOTICE, &location);
            }
            Representation::MachineReadable => sink.render_json(UNAUTHORIZED, &json!({})),
            Representation::Other => sink.head(UNAUTHORIZED),
        }
        Ok(Outcome::Deny)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaType;
    use crate::persona::tests::TestUser;

    #[derive(Debug, Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }

    impl ResponseSink for RecordingSink {
        fn redirect_with_notice(&mut self, notice: &str, location: &str) {
            self.calls.push(format!("redirect {location} ({notice})"));
        }

        fn render_json(&mut self, status: u16, body: &serde_json::Value) {
            self.calls.push(format!("json {status} {body}"));
        }

        fn head(&mut self, status: u16) {
            self.calls.push(format!("head {status}"));
        }
    }

    struct Request {
        user: Option<TestUser>,
        representation: Representation,
        referrer: Option<&'static str>,
    }

    impl RequestContext for Request {
        fn action(&self) -> &str {
            "update"
        }

        fn current_principal(&self, _accessor: &str) -> Option<&dyn Persona> {
            self.user.as_ref().map(|u| u as &dyn Persona)
        }

        fn representation(&self) -> Representation {
            self.representation
        }

        fn referrer(&self) -> Option<&str> {
            self.referrer
        }

        fn host(&self) -> Option<&str> {
            Some("app.example.com")
        }
    }

    fn gate() -> AuthorizationGate {
        let mut user = PersonaType::new("User").unwrap();
        user.define_tiers([("trainee", "Trainee"), ("staff", "Staff"), ("admin", "Admin")])
            .unwrap();
        let controller = Arc::new(Controller::new("posts".to_owned(), None));
        controller.bind(Arc::new(user), None).unwrap();
        controller.grant([("staff", "update")]).unwrap();
        AuthorizationGate::new(controller)
    }

    fn request(tier: Option<&'static str>, representation: Representation) -> Request {
        Request {
            user: tier.map(TestUser::at),
            representation,
            referrer: None,
        }
    }

    #[test]
    fn allow_has_no_side_effect() {
        let mut sink = RecordingSink::default();
        let outcome = gate()
            .authorize(&request(Some("admin"), Representation::Interactive), &mut sink)
            .unwrap();
        match outcome {
            Outcome::Allow(clearance) => assert_eq!(clearance.tier(), "staff"),
            Outcome::Deny => panic!("expected Allow"),
        }
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn interactive_deny_redirects_with_notice() {
        let mut sink = RecordingSink::default();
        let outcome = gate()
            .authorize(&request(Some("trainee"), Representation::Interactive), &mut sink)
            .unwrap();
        assert!(!outcome.is_allowed());
        assert_eq!(
            sink.calls,
            ["redirect / (You are not authorized to perform this action.)"]
        );
    }

    #[test]
    fn interactive_deny_goes_back_only_on_same_host() {
        let mut sink = RecordingSink::default();
        let mut req = request(None, Representation::Interactive);
        req.referrer = Some("https://app.example.com/posts");
        gate().authorize(&req, &mut sink).unwrap();

        req.referrer = Some("https://evil.example/");
        gate().with_fallback_location("/login").authorize(&req, &mut sink).unwrap();

        assert_eq!(sink.calls.len(), 2);
        assert!(sink.calls[0].starts_with("redirect https://app.example.com/posts "));
        assert!(sink.calls[1].starts_with("redirect /login "));
    }

    #[test]
    fn machine_readable_deny_is_empty_json_401() {
        let mut sink = RecordingSink::default();
        gate()
            .authorize(&request(Some("trainee"), Representation::MachineReadable), &mut sink)
            .unwrap();
        assert_eq!(sink.calls, ["json 401 {}"]);
    }

    #[test]
    fn other_deny_is_bodyless_401() {
        let mut sink = RecordingSink::default();
        gate()
            .authorize(&request(None, Representation::Other), &mut sink)
            .unwrap();
        assert_eq!(sink.calls, ["head 401"]);
    }

    #[test]
    fn configuration_errors_produce_no_response() {
        let mut sink = RecordingSink::default();
        let controller = Arc::new(Controller::new("orphans".to_owned(), None));
        let result = AuthorizationGate::new(controller)
            .authorize(&request(Some("admin"), Representation::Interactive), &mut sink);
        assert!(result.is_err());
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn formats_map_to_representations() {
        assert_eq!(Representation::from_format("html"), Representation::Interactive);
        assert_eq!(Representation::from_format("JSON"), Representation::MachineReadable);
        assert_eq!(Representation::from_format("csv"), Representation::Other);
    }
}
