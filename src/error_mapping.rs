//! Mapping of lower-layer errors onto `AppError`, so every failure shown to
//! the user goes through `AppError::user_message`.

use stratus_core::{
    AppError, ConfigError, DatabaseError, NetworkError, PermissionError, ReqwestErrorExt,
    RusqliteErrorExt, WeatherError,
};
use stratus_weather::{LocationError, WeatherError as ProviderError};

pub fn from_provider(e: ProviderError) -> AppError {
    match e {
        ProviderError::Network(e) => AppError::Network(e.into_network_error()),
        ProviderError::Api { status: 401, .. } => AppError::Weather(WeatherError::InvalidApiKey),
        ProviderError::Api { status, .. } if status >= 500 => {
            AppError::Weather(WeatherError::ServiceUnavailable)
        }
        ProviderError::Api { status, message } => {
            AppError::Weather(WeatherError::ApiError(format!("{}: {}", status, message)))
        }
        ProviderError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
        ProviderError::Location(e) => from_location(e),
        ProviderError::InvalidUrl(s) => AppError::Config(ConfigError::Invalid(s)),
        ProviderError::Cache(s) => AppError::Database(DatabaseError::QueryFailed(s)),
    }
}

pub fn from_location(e: LocationError) -> AppError {
    match e {
        LocationError::PermissionDenied => AppError::Permission(PermissionError::LocationDenied),
        LocationError::ServiceUnavailable => AppError::Weather(WeatherError::ServiceUnavailable),
        LocationError::InvalidCoordinates {
            latitude,
            longitude,
        } => AppError::Weather(WeatherError::InvalidCoordinates(format!(
            "{}, {}",
            latitude, longitude
        ))),
    }
}

/// Classify an error bubbling out of a command.
pub fn classify(err: anyhow::Error) -> AppError {
    let err = match err.downcast::<AppError>() {
        Ok(app) => return app,
        Err(err) => err,
    };
    let err = match err.downcast::<ProviderError>() {
        Ok(e) => return from_provider(e),
        Err(err) => err,
    };
    let err = match err.downcast::<LocationError>() {
        Ok(e) => return from_location(e),
        Err(err) => err,
    };
    match err.downcast::<rusqlite::Error>() {
        Ok(e) => AppError::Database(e.into_database_error()),
        Err(err) => AppError::Other(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_invalid_key() {
        let app = from_provider(ProviderError::Api {
            status: 401,
            message: "Invalid API key".into(),
        });
        assert!(matches!(app, AppError::Weather(WeatherError::InvalidApiKey)));
    }

    #[test]
    fn test_server_error_maps_to_unavailable() {
        let app = from_provider(ProviderError::Api {
            status: 502,
            message: String::new(),
        });
        assert!(matches!(app, AppError::Weather(WeatherError::ServiceUnavailable)));
    }

    #[test]
    fn test_classify_finds_wrapped_location_error() {
        let err = anyhow::Error::new(LocationError::InvalidCoordinates {
            latitude: 95.0,
            longitude: 0.0,
        })
        .context("saving location");
        let app = classify(err);
        assert!(matches!(
            app,
            AppError::Weather(WeatherError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_classify_database_error() {
        let app = classify(anyhow::Error::new(rusqlite::Error::QueryReturnedNoRows));
        assert!(matches!(app, AppError::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_classify_falls_back_to_other() {
        let app = classify(anyhow::anyhow!("boom"));
        assert!(matches!(app, AppError::Other(_)));
        assert_eq!(
            app.user_message(),
            "An unexpected error occurred. Please try again."
        );
    }
}
