use chrono::{Duration, Utc};
use convoy_calendar::components::google_calendar::token::{
    ClientSecrets, ClientSecretsBlock, StoredCredential,
};
use convoy_calendar::config::Config;
use convoy_calendar::error::{auth_error, other_error, SyncResult};
use serde::Deserialize;
use url::Url;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[tokio::main]
async fn main() -> SyncResult<()> {
    // Load configuration
    let config = Config::load()?;
    let secrets = ClientSecrets::load(&config.client_secrets_path)?;
    let token_uri = secrets
        .token_uri
        .clone()
        .unwrap_or_else(|| config.token_uri.clone());

    // Loopback server on an ephemeral port receives the redirect
    let server = tiny_http::Server::http("127.0.0.1:0")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    let port = server
        .server_addr()
        .to_ip()
        .map(|addr| addr.port())
        .ok_or_else(|| other_error("Callback server has no IP address"))?;
    let redirect_uri = format!("http://localhost:{}", port);

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    let auth_uri = secrets.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
    let mut auth_url = Url::parse(auth_uri)
        .map_err(|e| other_error(&format!("Invalid auth URI: {}", e)))?;
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", &redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("scope", &config.scopes.join(" "))
        .append_pair("state", &state);

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Open this URL to continue:\n{}", auth_url);
    }

    println!("Waiting for authorization callback on {}...", redirect_uri);
    let request = server.recv()?;

    // Always answer the browser, so the tab does not hang on failure
    let outcome = match authorization_code(request.url(), &state) {
        Ok(code) => exchange_and_save(&config, &secrets, &token_uri, &redirect_uri, &code).await,
        Err(e) => Err(e),
    };
    let page = match &outcome {
        Ok(()) => tiny_http::Response::from_string(
            "Authorization successful! You can close this window.",
        ),
        Err(e) => tiny_http::Response::from_string(format!("Authorization failed: {}", e))
            .with_status_code(400),
    };
    request.respond(page)?;
    outcome?;

    println!("Token saved to {}", config.token_path.display());

    Ok(())
}

/// Extract the authorization code from the redirect's path and query
fn authorization_code(request_url: &str, expected_state: &str) -> SyncResult<String> {
    let callback = Url::parse(&format!("http://localhost{}", request_url))
        .map_err(|e| other_error(&format!("Malformed callback URL: {}", e)))?;
    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(expected_state) {
        return Err(auth_error("State mismatch in authorization callback"));
    }
    param("code").ok_or_else(|| match param("error") {
        Some(reason) => auth_error(&format!("Authorization denied: {}", reason)),
        None => other_error("No authorization code found in callback"),
    })
}

/// Exchange the code for tokens and write the credential file
async fn exchange_and_save(
    config: &Config,
    secrets: &ClientSecretsBlock,
    token_uri: &str,
    redirect_uri: &str,
    code: &str,
) -> SyncResult<()> {
    let client = reqwest::Client::new();
    let response = client
        .post(token_uri)
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        return Err(auth_error(&format!("Failed to get token: {}", error_text)));
    }

    let tokens: TokenResponse = response.json().await?;
    let expires = Utc::now() + Duration::seconds(tokens.expires_in.unwrap_or(3600));

    let credential = StoredCredential {
        access_token: Some(tokens.access_token),
        refresh_token: tokens.refresh_token,
        client_id: Some(secrets.client_id.clone()),
        client_secret: Some(secrets.client_secret.clone()),
        token_uri: Some(token_uri.to_string()),
        scopes: config.scopes.clone(),
        expiry: Some(expires.to_rfc3339()),
        expires_at: Some(expires.timestamp()),
    };
    credential.save(&config.token_path)
}
