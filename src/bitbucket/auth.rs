//! Bitbucket credentials.

use std::fmt;

/// How requests to the Bitbucket API authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum BitbucketAuth {
    /// Username plus app password, sent as HTTP basic auth.
    Basic {
        username: String,
        app_password: String,
    },
    /// Repository, project, or workspace access token, sent as a bearer token.
    Token(String),
}

impl BitbucketAuth {
    /// Attach the credentials to an outgoing request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            BitbucketAuth::Basic {
                username,
                app_password,
            } => request.basic_auth(username, Some(app_password)),
            BitbucketAuth::Token(token) => request.bearer_auth(token),
        }
    }

    /// Short name of the scheme, for logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            BitbucketAuth::Basic { .. } => "app password",
            BitbucketAuth::Token(_) => "access token",
        }
    }
}

impl fmt::Debug for BitbucketAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitbucketAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("app_password", &"[REDACTED]")
                .finish(),
            BitbucketAuth::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
        }
    }
}
