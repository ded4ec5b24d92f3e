//! Consent page rendering.
//!
//! The authorization endpoint serves a minimal self-contained HTML page.
//! Every original request parameter is carried through hidden form fields so
//! the decision endpoint can re-validate the request from scratch; nothing
//! about the pending authorization is kept server-side.

use echo_auth::oauth::AuthorizationRequest;
use echo_auth::types::EchoApp;

/// Renders the consent page for an authenticated user.
#[must_use]
pub fn render_consent_page(app: &EchoApp, request: &AuthorizationRequest) -> String {
    let scopes = request
        .scopes()
        .iter()
        .map(|scope| format!("<li><code>{}</code></li>", escape_html(scope)))
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Authorize {name}</title></head>
<body>
  <h1>Authorize {name}</h1>
  <p><strong>{name}</strong> is requesting access to your Echo account.</p>
  <p>Requested permissions:</p>
  <ul>{scopes}</ul>
  <p>You will be redirected to <code>{redirect}</code>.</p>
  <form method="post" action="/api/oauth/authorize/decision">
{hidden}
    <button type="submit" name="action" value="approve">Authorize</button>
    <button type="submit" name="action" value="deny">Deny</button>
  </form>
</body>
</html>
"#,
        name = escape_html(&app.name),
        scopes = scopes,
        redirect = escape_html(request.redirect_uri.as_str()),
        hidden = hidden_fields(request),
    )
}

/// Renders the owner remediation page shown when the app's own owner arrives
/// with a callback URL that is not on the allowlist yet.
#[must_use]
pub fn render_callback_authorization_page(app: &EchoApp, request: &AuthorizationRequest) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Authorize callback URL</title></head>
<body>
  <h1>Unrecognized callback URL</h1>
  <p><code>{redirect}</code> is not an authorized callback URL for
  <strong>{name}</strong>.</p>
  <p>You own this app. You can authorize this URL and continue, or cancel.</p>
  <form method="post" action="/api/oauth/authorize/decision">
{hidden}
    <button type="submit" name="action" value="authorize_url">Authorize this URL and continue</button>
    <button type="submit" name="action" value="deny">Cancel</button>
  </form>
</body>
</html>
"#,
        name = escape_html(&app.name),
        redirect = escape_html(request.redirect_uri.as_str()),
        hidden = hidden_fields(request),
    )
}

/// Hidden inputs carrying the original request parameters.
fn hidden_fields(request: &AuthorizationRequest) -> String {
    [
        ("client_id", request.client_id.to_string()),
        ("redirect_uri", request.redirect_uri.to_string()),
        ("code_challenge", request.code_challenge.as_str().to_string()),
        (
            "code_challenge_method",
            request.code_challenge_method.as_str().to_string(),
        ),
        ("scope", request.scope.clone()),
        ("state", request.state.clone()),
    ]
    .iter()
    .map(|(name, value)| {
        format!(
            "    <input type=\"hidden\" name=\"{name}\" value=\"{}\">\n",
            escape_html(value)
        )
    })
    .collect()
}

/// Minimal HTML escaping for text and attribute values.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
