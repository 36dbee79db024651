//! Conversions from external infrastructure errors into domain errors.

use agnost_domain::AgnostError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AgnostError);

impl From<InfraError> for AgnostError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AgnostError> for InfraError {
    fn from(value: AgnostError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAgnostError {
    fn into_agnost(self) -> AgnostError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AgnostError */
/* -------------------------------------------------------------------------- */

impl IntoAgnostError for HttpError {
    fn into_agnost(self) -> AgnostError {
        if self.is_timeout() {
            return AgnostError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AgnostError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return AgnostError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return AgnostError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        AgnostError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_agnost())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AgnostError */
/* -------------------------------------------------------------------------- */

impl IntoAgnostError for JsonError {
    fn into_agnost(self) -> AgnostError {
        if self.is_syntax() || self.is_eof() {
            AgnostError::Config(format!("Invalid JSON format: {self}"))
        } else {
            AgnostError::Serialization(self.to_string())
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_agnost())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → AgnostError */
/* -------------------------------------------------------------------------- */

impl IntoAgnostError for TomlError {
    fn into_agnost(self) -> AgnostError {
        AgnostError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        Self(value.into_agnost())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: AgnostError = InfraError::from(error).into();
        match mapped {
            AgnostError::Network(msg) => assert!(msg.contains("503")),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: AgnostError = InfraError::from(error).into();
        assert_eq!(mapped, AgnostError::Network("HTTP request timed out".into()));
    }

    #[test]
    fn json_syntax_error_maps_to_config_error() {
        let err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let mapped: AgnostError = InfraError::from(err).into();
        assert!(matches!(mapped, AgnostError::Config(_)));
    }

    #[test]
    fn json_data_error_maps_to_serialization_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), 3);
        let err = serde_json::to_string(&map).unwrap_err();
        let mapped: AgnostError = InfraError::from(err).into();
        assert!(matches!(mapped, AgnostError::Serialization(_)));
    }

    #[test]
    fn toml_error_maps_to_config_error() {
        let err = toml::from_str::<toml::Table>("endpoint = ").unwrap_err();
        let mapped: AgnostError = InfraError::from(err).into();
        match mapped {
            AgnostError::Config(msg) => assert!(msg.starts_with("Invalid TOML format")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
