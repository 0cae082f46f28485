use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::{
    config::Config,
    export,
    extract::extract,
    lookup::{Client, LocationReport, LookupError, Payload},
    model::{CellRadio, TowerRecord},
};

#[derive(Debug)]
pub enum Outcome {
    /// The dump doesn't exist, nothing was written
    MissingInput,
    /// The dump contained no usable towers, nothing was written
    NoTowers,
    /// Towers were written to the CSV file and sent for lookup
    Exported {
        towers: Vec<TowerRecord>,
        lookup: Result<LocationReport, LookupError>,
    },
}

pub async fn run(config: &Config) -> Result<Outcome> {
    run_with(config, || {
        Client::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
            .context("Failed to build HTTP client")
    })
    .await
}

/// Run with `client` called for the HTTP client once towers were written.
pub async fn run_with<F>(config: &Config, client: F) -> Result<Outcome>
where
    F: FnOnce() -> Result<Client>,
{
    if !config.input.exists() {
        warn!(
            "{} not found, you might be running this outside the capture script",
            config.input.display()
        );
        return Ok(Outcome::MissingInput);
    }

    let towers = extract_only(&config.input)?;
    if towers.is_empty() {
        info!("No cell tower information found in {}", config.input.display());
        return Ok(Outcome::NoTowers);
    }

    export::write_file(&config.output, &towers)?;
    info!(
        "Extracted {} unique cell towers to {}",
        towers.len(),
        config.output.display()
    );
    for (i, tower) in towers.iter().enumerate() {
        info!("{}. {tower}", i + 1);
    }

    let token = read_token(&config.token_path)?;
    let client = client()?;
    let lookup = locate(&client, &token, config.radio, &towers).await;

    Ok(Outcome::Exported { towers, lookup })
}

/// Read a dump and extract its towers.
pub fn extract_only(path: &Path) -> Result<Vec<TowerRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(extract(&text))
}

fn read_token(path: &Path) -> Result<String> {
    let token = fs::read_to_string(path)
        .with_context(|| format!("Failed to read API token from {}", path.display()))?;
    Ok(token.trim().to_owned())
}

/// Send one lookup for `towers` and log what came back.
pub async fn locate(
    client: &Client,
    token: &str,
    radio: CellRadio,
    towers: &[TowerRecord],
) -> Result<LocationReport, LookupError> {
    let payload = Payload::new(token, radio, towers);
    info!(
        cells = payload.cells().len(),
        "Sending request to {}",
        client.endpoint()
    );

    let result = client.locate(&payload).await;
    match &result {
        Ok(report) => {
            for (label, value) in report.fields() {
                info!("{label}: {value}");
            }
            if let Some(message) = report.error_message() {
                warn!("Lookup rejected: {message}");
            }
        }
        Err(e) => warn!("{e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::bail;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::{
        lookup::tests::{closed_endpoint, endpoint, test_client},
        model::Field,
    };

    const DUMP: &str = "\
mCellInfo=[CellInfoLte:{mRegistered=YES CellIdentityLte:{ mCi=12345 mPci=55 mTac=678 mEarfcn=1300 mMcc=310 mMnc=260} CellSignalStrengthLte: rssi=-51}
 CellInfoLte:{mRegistered=NO CellIdentityLte:{ mCi=2147483647 mPci=101 mTac=2147483647 mEarfcn=1300 mMcc=null mMnc=null}}]
mCellInfo=[CellInfoLte:{mRegistered=YES CellIdentityLte:{ mCi=12345 mPci=55 mTac=678 mEarfcn=1300 mMcc=310 mMnc=260} CellSignalStrengthLte: rssi=-53}]
";

    struct Fixture {
        dir: tempfile::TempDir,
        config: Config,
    }

    fn fixture(dump: Option<&str>, token: Option<&str>, endpoint: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            input: dir.path().join("output.txt"),
            output: dir.path().join("cell_towers.csv"),
            token_path: dir.path().join("api_key.txt"),
            endpoint: endpoint.to_owned(),
            ..Config::default()
        };
        if let Some(dump) = dump {
            fs::write(&config.input, dump).unwrap();
        }
        if let Some(token) = token {
            fs::write(&config.token_path, token).unwrap();
        }
        Fixture { dir, config }
    }

    fn written(config: &Config) -> Vec<TowerRecord> {
        export::read_csv(fs::File::open(&config.output).unwrap()).unwrap()
    }

    fn exported(outcome: Outcome) -> (Vec<TowerRecord>, Result<LocationReport, LookupError>) {
        match outcome {
            Outcome::Exported { towers, lookup } => (towers, lookup),
            other => panic!("expected export, got {other:?}"),
        }
    }

    fn no_client() -> Result<Client> {
        bail!("client requested")
    }

    #[tokio::test]
    async fn missing_input() {
        let f = fixture(None, None, &closed_endpoint());
        let outcome = run_with(&f.config, no_client).await.unwrap();
        assert!(matches!(outcome, Outcome::MissingInput));
        assert!(!f.config.output.exists());
    }

    #[tokio::test]
    async fn no_towers() {
        // no token file either, so reaching the lookup would fail the run
        let f = fixture(Some(""), None, &closed_endpoint());
        let outcome = run_with(&f.config, no_client).await.unwrap();
        assert!(matches!(outcome, Outcome::NoTowers));
        assert!(!f.config.output.exists());
    }

    #[tokio::test]
    async fn located() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/process"))
            .and(body_partial_json(json!({
                "token": "secret",
                "mcc": 310,
                "mnc": 260,
                "cells": [{ "lac": 678, "cid": 12345 }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "balance": 10,
                "lat": 47.6,
                "lon": -122.3,
                "accuracy": 800,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = endpoint(&server);
        let f = fixture(Some(DUMP), Some("secret\n"), &endpoint);
        let outcome = run_with(&f.config, || Ok(test_client(&endpoint)))
            .await
            .unwrap();

        let (towers, lookup) = exported(outcome);
        assert_eq!(towers.len(), 1);
        assert_eq!(towers[0].get(Field::CellId), Some("12345"));
        assert_eq!(written(&f.config), towers);

        let report = lookup.unwrap();
        assert_eq!(report.status, Some(json!("ok")));
        assert_eq!(report.address, None);
    }

    #[tokio::test]
    async fn unreachable_service_keeps_csv() {
        let endpoint = closed_endpoint();
        let f = fixture(Some(DUMP), Some("secret"), &endpoint);
        let outcome = run_with(&f.config, || Ok(test_client(&endpoint)))
            .await
            .unwrap();

        let (towers, lookup) = exported(outcome);
        assert!(matches!(lookup, Err(LookupError::Transport(_))));
        assert_eq!(written(&f.config), towers);
    }

    #[tokio::test]
    async fn timeout_keeps_csv() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "ok" }))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let mut f = fixture(Some(DUMP), Some("secret"), &endpoint(&server));
        f.config.timeout_secs = 1;
        let outcome = run(&f.config).await.unwrap();

        let (towers, lookup) = exported(outcome);
        assert!(matches!(lookup, Err(LookupError::Transport(ref e)) if e.is_timeout()));
        assert_eq!(written(&f.config), towers);
    }

    #[tokio::test]
    async fn missing_token_is_fatal() {
        let f = fixture(Some(DUMP), None, &closed_endpoint());
        let err = run_with(&f.config, no_client).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read API token"));
        // the CSV is written before the token is needed
        assert!(f.config.output.exists());
    }

    #[test]
    fn extract_only_missing_file() {
        let err = extract_only(&PathBuf::from("/nonexistent/radio.txt")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
