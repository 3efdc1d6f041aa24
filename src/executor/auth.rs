//! Authorization schemes a datasource can attach to its requests.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::context::DataContext;
use crate::error::{DatasourceError, DatasourceResult};

use super::models::{PreparedRequest, AUTHORIZATION, FORM_DATA};
use super::response::map_response;
use super::transport::HttpTransport;

pub const BASIC: &str = "BASIC";
pub const OAUTH2_BEARER: &str = "OAUTH2_BEARER";
pub const OAUTH2_PASSWORD: &str = "OAUTH2_PASSWORD";

/// Credentials for the OAuth2 resource-owner password grant.
#[derive(Clone, Deserialize)]
pub struct PasswordGrant {
    #[serde(deserialize_with = "scalar_string")]
    pub username: String,
    #[serde(deserialize_with = "scalar_string")]
    pub password: String,
    #[serde(deserialize_with = "scalar_string")]
    pub client_id: String,
    #[serde(deserialize_with = "scalar_string")]
    pub client_secret: String,
    /// Token endpoint.
    pub url: String,
}

#[derive(Clone, Default)]
pub enum Authorization {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    Password(PasswordGrant),
}

#[derive(Deserialize)]
struct BasicCredentials {
    #[serde(deserialize_with = "scalar_string")]
    username: String,
    #[serde(deserialize_with = "scalar_string")]
    password: String,
}

#[derive(Deserialize)]
struct BearerCredentials {
    #[serde(deserialize_with = "scalar_string")]
    token: String,
}

/// Accepts a string, number or boolean credential and keeps its text form.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

impl Authorization {
    /// Picks the scheme named by `authtype`.
    ///
    /// Unknown auth types and absent or non-object credentials resolve to
    /// [`Authorization::None`]. Credentials missing a field the scheme needs
    /// are a configuration error.
    pub fn resolve(authtype: Option<&str>, credentials: Option<&Value>) -> DatasourceResult<Self> {
        let Some(authtype) = authtype else {
            return Ok(Self::None);
        };
        let Some(credentials) = credentials.filter(|value| value.is_object()) else {
            return Ok(Self::None);
        };

        let authorization = match authtype {
            BASIC => {
                let creds: BasicCredentials = parse_credentials(authtype, credentials)?;
                Self::Basic {
                    username: creds.username,
                    password: creds.password,
                }
            }
            OAUTH2_BEARER => {
                let creds: BearerCredentials = parse_credentials(authtype, credentials)?;
                Self::Bearer { token: creds.token }
            }
            OAUTH2_PASSWORD => Self::Password(parse_credentials(authtype, credentials)?),
            other => {
                tracing::debug!(authtype = other, "unknown auth type, sending requests unauthenticated");
                Self::None
            }
        };
        Ok(authorization)
    }

    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Basic { .. } => Some(BASIC),
            Self::Bearer { .. } => Some(OAUTH2_BEARER),
            Self::Password(_) => Some(OAUTH2_PASSWORD),
        }
    }

    /// Sets the `Authorization` header on `request`; nothing else is touched.
    pub(crate) async fn apply(
        &self,
        request: &mut PreparedRequest,
        transport: &HttpTransport,
    ) -> DatasourceResult<()> {
        match self {
            Self::None => {}
            Self::Basic { username, password } => {
                request.set_header(AUTHORIZATION, basic_header(username, password));
            }
            Self::Bearer { token } => {
                request.set_header(AUTHORIZATION, format!("Bearer {token}"));
            }
            Self::Password(grant) => {
                let token = fetch_password_token(grant, transport).await?;
                request.set_header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
            Self::Password(grant) => f
                .debug_struct("Password")
                .field("username", &grant.username)
                .field("client_id", &grant.client_id)
                .field("url", &grant.url)
                .finish_non_exhaustive(),
        }
    }
}

fn parse_credentials<T: DeserializeOwned>(authtype: &str, credentials: &Value) -> DatasourceResult<T> {
    T::deserialize(credentials)
        .map_err(|err| DatasourceError::Config(format!("{authtype} credentials: {err}")))
}

pub(crate) fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

pub(crate) fn password_token_request(grant: &PasswordGrant) -> PreparedRequest {
    let body = json!({
        "username": grant.username,
        "password": grant.password,
        "grant_type": "password",
        "client_id": grant.client_id,
        "client_secret": grant.client_secret,
    });

    PreparedRequest {
        method: "POST".to_string(),
        url: grant.url.clone(),
        headers: vec![("Accept".to_string(), "application/json".to_string())],
        body: body.to_string(),
        body_type: FORM_DATA.to_string(),
    }
}

async fn fetch_password_token(
    grant: &PasswordGrant,
    transport: &HttpTransport,
) -> DatasourceResult<String> {
    tracing::debug!(url = %grant.url, client_id = %grant.client_id, "requesting password grant token");

    let response = transport.send(&password_token_request(grant)).await?;
    let result = map_response(response, &DataContext::new(), &[])?;

    result
        .get("response")
        .and_then(|response| response.get("access_token"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DatasourceError::Authorization(format!(
                "token response from {} has no access_token",
                grant.url
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn basic_header_encodes_username_and_password() {
        assert_eq!(basic_header("u", "p"), "Basic dTpw");
        assert_eq!(basic_header("user", "pass"), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn resolve_selects_scheme_by_authtype() {
        let basic = Authorization::resolve(
            Some("BASIC"),
            Some(&json!({"username": "u", "password": "p"})),
        )
        .unwrap();
        assert!(matches!(basic, Authorization::Basic { ref username, .. } if username == "u"));

        let bearer =
            Authorization::resolve(Some("OAUTH2_BEARER"), Some(&json!({"token": "abc"}))).unwrap();
        assert!(matches!(bearer, Authorization::Bearer { ref token } if token == "abc"));

        let password = Authorization::resolve(
            Some("OAUTH2_PASSWORD"),
            Some(&json!({
                "username": "u",
                "password": "p",
                "client_id": "id",
                "client_secret": "secret",
                "url": "https://auth.test/token"
            })),
        )
        .unwrap();
        assert_eq!(password.kind(), Some(OAUTH2_PASSWORD));
    }

    #[test]
    fn resolve_passes_through_unknown_or_missing_settings() {
        let creds = json!({"token": "abc"});
        assert!(matches!(
            Authorization::resolve(Some("NTLM"), Some(&creds)).unwrap(),
            Authorization::None
        ));
        assert!(matches!(
            Authorization::resolve(None, Some(&creds)).unwrap(),
            Authorization::None
        ));
        assert!(matches!(
            Authorization::resolve(Some("BASIC"), None).unwrap(),
            Authorization::None
        ));
        assert!(matches!(
            Authorization::resolve(Some("BASIC"), Some(&json!("u:p"))).unwrap(),
            Authorization::None
        ));
    }

    #[test]
    fn resolve_accepts_numeric_credentials() {
        let password = Authorization::resolve(
            Some("OAUTH2_PASSWORD"),
            Some(&json!({
                "username": "u",
                "password": "p",
                "client_id": 2,
                "client_secret": "secret",
                "url": "https://auth.test/token"
            })),
        )
        .unwrap();
        let Authorization::Password(grant) = password else {
            panic!("expected a password grant");
        };
        assert_eq!(grant.client_id, "2");
        assert!(password_token_request(&grant)
            .body
            .contains(r#""client_id":"2""#));

        let basic =
            Authorization::resolve(Some("BASIC"), Some(&json!({"username": 1001, "password": 42})))
                .unwrap();
        assert!(matches!(basic, Authorization::Basic { ref username, ref password }
            if username == "1001" && password == "42"));

        let bearer = Authorization::resolve(Some("OAUTH2_BEARER"), Some(&json!({"token": 123456})))
            .unwrap();
        assert!(matches!(bearer, Authorization::Bearer { ref token } if token == "123456"));
    }

    #[test]
    fn resolve_rejects_structured_credential_values() {
        let err = Authorization::resolve(Some("OAUTH2_BEARER"), Some(&json!({"token": {"a": 1}})))
            .unwrap_err();
        assert!(matches!(err, DatasourceError::Config(_)));
    }

    #[test]
    fn resolve_reports_missing_credential_fields() {
        let err = Authorization::resolve(Some("BASIC"), Some(&json!({"username": "u"}))).unwrap_err();
        assert!(matches!(err, DatasourceError::Config(ref message) if message.contains("password")));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let auth = Authorization::Bearer {
            token: "super-secret".into(),
        };
        assert!(!format!("{auth:?}").contains("super-secret"));

        let basic = Authorization::Basic {
            username: "u".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{basic:?}").contains("hunter2"));
    }

    #[test]
    fn password_token_request_is_form_encoded_post() {
        let grant = PasswordGrant {
            username: "u".into(),
            password: "p".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            url: "https://auth.test/token".into(),
        };
        let request = password_token_request(&grant);

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://auth.test/token");
        assert!(request.is_form_data());
        assert_eq!(
            request.body,
            r#"{"username":"u","password":"p","grant_type":"password","client_id":"id","client_secret":"secret"}"#
        );
    }
}
