//! # Notification poller (timer-driven).
//!
//! Polls a notifications endpoint on a fixed interval (default 60 s) and
//! renders the number of unread entries. Unexpected response statuses are
//! fatal: a 401 disables the module with "Bad credentials" rather than
//! hammering the endpoint with a broken token.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::bar::BarSettings;
use crate::config::Settings;
use crate::error::ModuleError;
use crate::format::{Builder, Formatter, Label, DEFAULT_FORMAT};
use crate::modules::{lock, Module, Schedule};
use crate::sources::HttpClient;

const NOTIFICATIONS_URL: &str = "https://api.github.com/notifications";

/// Render snapshot: the unread count and its label.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct NotifierState {
    notifications: usize,
    label: Option<Label>,
}

/// Timer-driven unread-notifications module.
pub struct NotifierModule {
    name: String,
    formatter: Formatter,
    builder: Mutex<Builder>,
    http: Arc<dyn HttpClient>,
    token: String,
    interval: Duration,
    empty_notifications: bool,
    label: Option<Label>,
    state: Mutex<NotifierState>,
}

impl std::fmt::Debug for NotifierModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl NotifierModule {
    pub const TAG_LABEL: &'static str = "<label>";

    /// Creates the module; the access token is required.
    pub fn new(
        settings: &Settings,
        _bar: &BarSettings,
        name: &str,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, ModuleError> {
        let token = settings.get::<String>(name, "token")?;
        let interval = settings.get_seconds_or(name, "interval", Duration::from_secs(60))?;
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

        // Seed the label so the first render (before the first poll
        // completes) shows an empty count instead of the raw token.
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
            token,
            interval,
            empty_notifications,
            label,
            state: Mutex::new(NotifierState {
                notifications: 0,
                label: initial,
            }),
        })
    }

    /// Renders the label for a given unread count.
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
impl Module for NotifierModule {
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
        let url = format!("{NOTIFICATIONS_URL}?access_token={}", self.token);
        let body = self.http.get(&url).await?;

        check_status(self.http.response_code())?;

        let notifications = count_unread(&body);
        let next = NotifierState {
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

/// Maps unexpected response statuses to fatal module errors.
pub(crate) fn check_status(code: u16) -> Result<(), ModuleError> {
    match code {
        200 => Ok(()),
        401 => Err(ModuleError::protocol("Bad credentials")),
        403 => Err(ModuleError::protocol(
            "Maximum number of login attempts exceeded",
        )),
        code => Err(ModuleError::protocol(format!("Unspecified error ({code})"))),
    }
}

/// Counts `"unread":true` occurrences in a response body.
pub(crate) fn count_unread(body: &str) -> usize {
    body.matches("\"unread\":true").count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

    use crate::error::HttpError;

    /// Scripted HTTP fake: fixed body + status, counts requests.
    pub(crate) struct FakeHttp {
        pub body: String,
        pub status: AtomicU16,
        pub requests: AtomicUsize,
        pub fail_transport: bool,
    }

    impl FakeHttp {
        pub fn arc(body: &str, status: u16) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                status: AtomicU16::new(status),
                requests: AtomicUsize::new(0),
                fail_transport: false,
            })
        }
    }

    #[async_trait]
    impl HttpClient for FakeHttp {
        async fn get(&self, _url: &str) -> Result<String, HttpError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_transport {
                return Err(HttpError::new("could not resolve host"));
            }
            Ok(self.body.clone())
        }

        async fn post(
            &self,
            _url: &str,
            _fields: &[(&str, &str)],
            _auth: Option<(&str, &str)>,
        ) -> Result<String, HttpError> {
            self.get("").await
        }

        fn response_code(&self) -> u16 {
            self.status.load(Ordering::SeqCst)
        }
    }

    fn module(http: Arc<FakeHttp>, settings: Settings) -> NotifierModule {
        let settings = settings.with("notifier", "token", "sekrit");
        NotifierModule::new(&settings, &BarSettings::default(), "notifier", http).unwrap()
    }

    const TWO_UNREAD: &str =
        r#"[{"unread":true,"id":1},{"unread":false,"id":2},{"unread":true,"id":3}]"#;

    #[tokio::test]
    async fn two_unread_entries_render_count() {
        let m = module(FakeHttp::arc(TWO_UNREAD, 200), Settings::new());
        assert!(m.update().await.unwrap());
        assert_eq!(m.get_output().unwrap(), "Notifications: 2");
    }

    #[tokio::test]
    async fn bad_credentials_is_a_fatal_protocol_error() {
        let m = module(FakeHttp::arc("", 401), Settings::new());
        let err = m.update().await.unwrap_err();
        assert_eq!(err.to_string(), "Bad credentials");
        assert!(matches!(err, ModuleError::Protocol { .. }));
    }

    #[tokio::test]
    async fn rate_limit_and_unknown_statuses_map_to_messages() {
        let m = module(FakeHttp::arc("", 403), Settings::new());
        assert_eq!(
            m.update().await.unwrap_err().to_string(),
            "Maximum number of login attempts exceeded"
        );

        let m = module(FakeHttp::arc("", 500), Settings::new());
        assert_eq!(
            m.update().await.unwrap_err().to_string(),
            "Unspecified error (500)"
        );
    }

    #[tokio::test]
    async fn transport_failure_is_fatal() {
        let http = Arc::new(FakeHttp {
            body: String::new(),
            status: AtomicU16::new(0),
            requests: AtomicUsize::new(0),
            fail_transport: true,
        });
        let m = module(http, Settings::new());
        assert!(matches!(
            m.update().await.unwrap_err(),
            ModuleError::Transport(_)
        ));
    }

    #[tokio::test]
    async fn zero_unread_renders_empty_unless_configured() {
        let m = module(FakeHttp::arc("[]", 200), Settings::new());
        m.update().await.unwrap();
        assert_eq!(m.get_output().unwrap(), "Notifications: ");

        let m = module(
            FakeHttp::arc("[]", 200),
            Settings::new().with("notifier", "empty-notifications", "true"),
        );
        m.update().await.unwrap();
        assert_eq!(m.get_output().unwrap(), "Notifications: 0");
    }

    #[test]
    fn token_is_required() {
        let err = NotifierModule::new(
            &Settings::new(),
            &BarSettings::default(),
            "notifier",
            FakeHttp::arc("", 200),
        )
        .unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn repeated_identical_polls_report_unchanged() {
        let m = module(FakeHttp::arc(TWO_UNREAD, 200), Settings::new());
        assert!(m.update().await.unwrap());
        assert!(!m.update().await.unwrap());
    }
}
