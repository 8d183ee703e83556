use actix_web::dev::Payload;
use actix_web::{Error, FromRequest, HttpRequest};
use futures_util::future::{Ready, ready};

/// Header the fronting auth layer sets after verifying the session. The
/// server itself performs no authentication; an absent or unreadable value
/// is an anonymous request.
pub const SESSION_EMAIL_HEADER: &str = "x-auth-request-email";

#[derive(Debug, Clone)]
pub struct SessionIdentity(Option<String>);

impl SessionIdentity {
    pub fn email(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequest for SessionIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let email = req
            .headers()
            .get(SESSION_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from);
        ready(Ok(SessionIdentity(email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn header_value_becomes_the_session_email() {
        let req = TestRequest::default()
            .insert_header((SESSION_EMAIL_HEADER, "alice@example.com"))
            .to_http_request();
        let identity = SessionIdentity::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(identity.email(), Some("alice@example.com"));
    }

    #[actix_web::test]
    async fn missing_or_blank_header_is_anonymous() {
        let req = TestRequest::default().to_http_request();
        let identity = SessionIdentity::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert!(identity.email().is_none());

        let req = TestRequest::default()
            .insert_header((SESSION_EMAIL_HEADER, "   "))
            .to_http_request();
        let identity = SessionIdentity::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert!(identity.email().is_none());
    }
}
