/*
[INPUT]:  Authorization server schema and serde requirements
[OUTPUT]: Typed request bodies for the OAuth endpoints
[POS]:    Data layer - request type definitions
[UPDATE]: When request bodies change
*/

use serde::Serialize;

pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// Body of `POST /oauth/token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'static str,
    pub code: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub fn authorization_code(code: &'a str) -> Self {
        Self {
            grant_type: GRANT_TYPE_AUTHORIZATION_CODE,
            code,
        }
    }
}

/// Body of `POST /oauth/session-register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRegisterRequest<'a> {
    pub refresh_token: &'a str,
}
