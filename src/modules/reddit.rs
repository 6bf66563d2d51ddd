//! # Reddit unread poller (timer-driven).
//!
//! Authenticates with the password grant on every cycle — the default
//! interval equals the token lifetime (3600 s), so each poll starts by
//! exchanging credentials for a fresh access token via an authenticated
//! form POST, then fetches the unread listing with it. Status handling
//! mirrors the notifier: 401/403 and unknown statuses disable the module.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::bar::BarSettings;
use crate::config::Settings;
use crate::error::ModuleError;
use crate::format::{Builder, Formatter, Label, DEFAULT_FORMAT};
use crate::modules::notifier::{check_status, count_unread};
use crate::modules::{lock, Module, Schedule};
use crate::sources::HttpClient;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const UNREAD_URL: &str = "https://oauth.reddit.com/message/unread";

/// Render snapshot: the unread count and its label.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct RedditState {
    notifications: usize,
    label: Option<Label>,
}

/// Timer-driven reddit unread-messages module.
pub struct RedditModule {
    name: String,
    formatter: Formatter,
    builder: Mutex<Builder>,
    http: Arc<dyn HttpClient>,
    app_id: String,
    app_secret: String,
    username: String,
    password: String,
    interval: Duration,
    empty_notifications: bool,
    label: Option<Label>,
    state: Mutex<RedditState>,
}

impl std::fmt::Debug for RedditModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RedditModule {
    pub const TAG_LABEL: &'static str = "<label>";

    /// Creates the module; all four credentials are required.
    pub fn new(
        settings: &Settings,
        _bar: &BarSettings,
        name: &str,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ModuleError> {
        let app_id = settings.get::<String>(name, "app-id")?;
        let app_secret = settings.get::<String>(name, "app-secret")?;
        let username = settings.get::<String>(name, "username")?;
        let password = settings.get::<String>(name, "password")?;
        // access token expires after 3600s
        let interval = settings.get_seconds_or(name, "interval", Duration::from_secs(3600))?;
        let empty_notifications = settings.get_or(name, "empty-notifications", false)?;

        let mut formatter = Formatter::new();
        formatter.add(settings, name, DEFAULT_FORMAT, Self::TAG_LABEL, &[Self::TAG_LABEL])?;

        let label = if formatter.has(Self::TAG_LABEL) {
            Some(Label::from_settings(
                settings,
                name,
                "label",
                "Notifications: %notifications%",
            )?)
        } else {
            None
        };
        let initial = label.clone().map(|mut l| {
            l.replace_token(
                "%notifications%",
                if empty_notifications { "0" } else { "" },
            );
            l
        });

        Ok(Self {
            name: name.to_string(),
            formatter,
            builder: Mutex::new(Builder::new()),
            http,
            app_id,
            app_secret,
            username,
            password,
            interval,
            empty_notifications,
            label,
            state: Mutex::new(RedditState {
                notifications: 0,
                label: initial,
            }),
        })
    }

    /// Exchanges credentials for an access token.
    async fn authenticate(&self) -> Result<String, ModuleError> {
        let fields = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];
        let body = self
            .http
            .post(
                TOKEN_URL,
                &fields,
                Some((self.app_id.as_str(), self.app_secret.as_str())),
            )
            .await?;
        check_status(self.http.response_code())?;

        extract_string_field(&body, "access_token")
            .ok_or_else(|| ModuleError::protocol("Malformed token response"))
    }

    fn render_label(&self, notifications: usize) -> Option<Label> {
        self.label.clone().map(|mut label| {
            label.reset_tokens();
            let value = if notifications > 0 || self.empty_notifications {
                notifications.to_string()
            } else {
                String::new()
            };
            label.replace_token("%notifications%", &value);
            label
        })
    }
}

#[async_trait]
impl Module for RedditModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> Schedule {
        Schedule::Interval(self.interval)
    }

    fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn builder(&self) -> &Mutex<Builder> {
        &self.builder
    }

    async fn update(&self) -> Result<bool, ModuleError> {
        let token = self.authenticate().await?;

        let url = format!("{UNREAD_URL}?access_token={token}");
        let body = self.http.get(&url).await?;
        check_status(self.http.response_code())?;

        let notifications = count_unread(&body);
        let next = RedditState {
            notifications,
            label: self.render_label(notifications),
        };

        let mut state = lock(&self.state);
        let changed = *state != next;
        *state = next;
        Ok(changed)
    }

    fn build(&self, builder: &mut Builder, tag: &str) -> bool {
        if tag != Self::TAG_LABEL {
            return false;
        }
        if let Some(label) = &lock(&self.state).label {
            builder.node(label);
        }
        true
    }
}

/// Pulls a `"key":"value"` string field out of a JSON-ish body.
fn extract_string_field(body: &str, key: &str) -> Option<String> {
    let marker = format!("\"{key}\"");
    let after_key = &body[body.find(&marker)? + marker.len()..];
    let after_colon = after_key.trim_start().strip_prefix(':')?;
    let quoted = after_colon.trim_start().strip_prefix('"')?;
    let end = quoted.find('"')?;
    Some(quoted[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use crate::error::HttpError;

    /// Records the POST so tests can assert the authenticated request.
    struct FakeReddit {
        token_body: String,
        unread_body: String,
        status: AtomicU16,
        posts: StdMutex<Vec<(String, Vec<(String, String)>, Option<(String, String)>)>>,
        gets: AtomicUsize,
    }

    impl FakeReddit {
        fn arc(token_body: &str, unread_body: &str, status: u16) -> Arc<Self> {
            Arc::new(Self {
                token_body: token_body.to_string(),
                unread_body: unread_body.to_string(),
                status: AtomicU16::new(status),
                posts: StdMutex::new(Vec::new()),
                gets: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl HttpClient for FakeReddit {
        async fn get(&self, _url: &str) -> Result<String, HttpError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self.unread_body.clone())
        }

        async fn post(
            &self,
            url: &str,
            fields: &[(&str, &str)],
            auth: Option<(&str, &str)>,
        ) -> Result<String, HttpError> {
            self.posts.lock().unwrap().push((
                url.to_string(),
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                auth.map(|(u, p)| (u.to_string(), p.to_string())),
            ));
            Ok(self.token_body.clone())
        }

        fn response_code(&self) -> u16 {
            self.status.load(Ordering::SeqCst)
        }
    }

    fn module(http: Arc<FakeReddit>) -> RedditModule {
        let settings = Settings::new()
            .with("reddit", "app-id", "app")
            .with("reddit", "app-secret", "shh")
            .with("reddit", "username", "user")
            .with("reddit", "password", "pass");
        RedditModule::new(&settings, &BarSettings::default(), "reddit", http).unwrap()
    }

    const TOKEN_OK: &str = r#"{"access_token": "tok123", "token_type": "bearer"}"#;

    #[tokio::test]
    async fn update_authenticates_then_counts_unread() {
        let http = FakeReddit::arc(TOKEN_OK, r#"[{"unread":true},{"unread":true}]"#, 200);
        let m = module(http.clone());
        assert!(m.update().await.unwrap());
        assert_eq!(m.get_output().unwrap(), "Notifications: 2");

        let posts = http.posts.lock().unwrap();
        let (url, fields, auth) = &posts[0];
        assert_eq!(url, TOKEN_URL);
        assert_eq!(
            fields[0],
            ("grant_type".to_string(), "password".to_string())
        );
        assert_eq!(auth, &Some(("app".to_string(), "shh".to_string())));
        assert_eq!(http.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bad_credentials_disable_the_module() {
        let http = FakeReddit::arc("", "", 401);
        let m = module(http.clone());
        let err = m.update().await.unwrap_err();
        assert_eq!(err.to_string(), "Bad credentials");
        // the unread fetch never happened
        assert_eq!(http.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_token_response_is_a_protocol_error() {
        let http = FakeReddit::arc(r#"{"error": "invalid_grant"}"#, "", 200);
        let m = module(http);
        assert_eq!(
            m.update().await.unwrap_err().to_string(),
            "Malformed token response"
        );
    }

    #[test]
    fn missing_credentials_fail_construction() {
        let settings = Settings::new().with("reddit", "app-id", "app");
        let err = RedditModule::new(
            &settings,
            &BarSettings::default(),
            "reddit",
            FakeReddit::arc("", "", 200),
        )
        .unwrap_err();
        assert!(err.to_string().contains("app-secret"));
    }

    #[test]
    fn string_field_extraction_handles_spacing() {
        assert_eq!(
            extract_string_field(r#"{"access_token":"abc"}"#, "access_token").as_deref(),
            Some("abc")
        );
        assert_eq!(
            extract_string_field(r#"{ "access_token" : "a b c" }"#, "access_token").as_deref(),
            Some("a b c")
        );
        assert_eq!(extract_string_field("{}", "access_token"), None);
    }
}
