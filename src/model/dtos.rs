use std::fmt;

/// Both credentials a join request carries. Only built from ready providers.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub csrf_token: String,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            csrf_token: csrf_token.into(),
        }
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AuthTokens { .. }")
    }
}

/// Common parameters for a join request
#[derive(Clone, Copy)]
pub struct JoinParams<'a> {
    pub access_token: &'a str,
    pub csrf_token: &'a str,
    pub class_code: &'a str,
}

impl<'a> JoinParams<'a> {
    pub fn new(tokens: &'a AuthTokens, class_code: &'a str) -> Self {
        Self {
            access_token: &tokens.access_token,
            csrf_token: &tokens.csrf_token,
            class_code,
        }
    }
}
