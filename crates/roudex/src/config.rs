//! Factory configuration.
//!
//! [`Settings`] holds the plain values a host may keep in its own configuration file, while
//! [`Config`] adds the runtime collaborators: the database handle, an optional failure
//! responder and the classifier.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::classifier::{Classifier, IdentityClassifier};
use crate::error::ConfigError;
use crate::responder::FailureResponder;
use crate::storage::DocumentStore;

/// Default name of the data stack inside a request context
pub const DEFAULT_STACK_NAME: &str = "$$";

/// The control-flow model of the host the middleware is installed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkKind {
    /// `next` is a completion signal, transitions happen inside a storage callback
    Callback,
    /// the middleware is a suspendable routine that awaits downstream
    Coroutine,
    /// the middleware returns a future composed with combinators
    Promise,
}

impl FrameworkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkKind::Callback => "callback",
            FrameworkKind::Coroutine => "coroutine",
            FrameworkKind::Promise => "promise",
        }
    }
}

impl AsRef<str> for FrameworkKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "callback" => Ok(FrameworkKind::Callback),
            "coroutine" => Ok(FrameworkKind::Coroutine),
            "promise" => Ok(FrameworkKind::Promise),
            other => Err(ConfigError::unsupported_framework(other)),
        }
    }
}

/// Serializable part of the configuration.
///
/// ```
/// use roudex::Settings;
///
/// let settings = Settings::from_json(r#"{ "app": "promise", "state_stack": false }"#).unwrap();
/// assert_eq!(settings.app.as_deref(), Some("promise"));
/// assert_eq!(settings.stack_name, "$$");
/// assert!(!settings.state_stack);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// framework identifier, one of `callback`, `coroutine` or `promise`
    pub app: Option<String>,
    /// name the data stack is stored under
    pub stack_name: String,
    /// nest the data stack under the context's `state` container
    pub state_stack: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { app: None, stack_name: DEFAULT_STACK_NAME.to_string(), state_stack: true }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Validated, immutable configuration owned by the factory
pub struct Config {
    pub(crate) framework: FrameworkKind,
    pub(crate) db: Arc<dyn DocumentStore>,
    pub(crate) stack_name: String,
    pub(crate) state_stack: bool,
    pub(crate) on_error: Option<Arc<dyn FailureResponder>>,
    pub(crate) classifier: Arc<dyn Classifier>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn framework(&self) -> FrameworkKind {
        self.framework
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn state_stack(&self) -> bool {
        self.state_stack
    }

    pub fn db(&self) -> &Arc<dyn DocumentStore> {
        &self.db
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("framework", &self.framework)
            .field("engine", &self.db.engine())
            .field("stack_name", &self.stack_name)
            .field("state_stack", &self.state_stack)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

pub struct ConfigBuilder {
    settings: Settings,
    db: Option<Arc<dyn DocumentStore>>,
    on_error: Option<Arc<dyn FailureResponder>>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self { settings: Settings::default(), db: None, on_error: None, classifier: None }
    }

    /// Starts from previously loaded settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn app(mut self, app: impl AsRef<str>) -> Self {
        self.settings.app = Some(app.as_ref().to_string());
        self
    }

    pub fn db(mut self, db: Arc<dyn DocumentStore>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn stack_name(mut self, stack_name: impl Into<String>) -> Self {
        self.settings.stack_name = stack_name.into();
        self
    }

    pub fn state_stack(mut self, state_stack: bool) -> Self {
        self.settings.state_stack = state_stack;
        self
    }

    /// Replaces the framework's default failure responder
    pub fn on_error<R: FailureResponder + 'static>(mut self, responder: R) -> Self {
        self.on_error = Some(Arc::new(responder));
        self
    }

    pub fn classifier<C: Classifier + 'static>(mut self, classifier: C) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Validates the framework identifier and the presence of a database.
    ///
    /// The storage engine itself is checked when the factory selects its storage adapter.
    pub fn build(self) -> Result<Config, ConfigError> {
        let app = self.settings.app.ok_or(ConfigError::MissingApp)?;
        let framework = app.parse::<FrameworkKind>()?;
        let db = self.db.ok_or(ConfigError::MissingDb)?;

        let stack_name = if self.settings.stack_name.is_empty() {
            DEFAULT_STACK_NAME.to_string()
        } else {
            self.settings.stack_name
        };

        Ok(Config {
            framework,
            db,
            stack_name,
            state_stack: self.settings.state_stack,
            on_error: self.on_error,
            classifier: self.classifier.unwrap_or_else(|| Arc::new(IdentityClassifier)),
        })
    }
}
