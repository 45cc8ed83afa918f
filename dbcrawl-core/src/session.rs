//! The command-line session state machine.
//!
//! A session walks `INIT → RESOLVE_CONNECTOR → LOAD_CONFIG → PARSE_OPTIONS →
//! ACQUIRE_CONNECTION → EXECUTE → RELEASE → DONE`. Any failure moves it to
//! `FAILED` and aborts the remaining steps; the only cleanup guaranteed after
//! that is closing a connection that was already opened.
//!
//! [`CommandLineSession::prepare`] stops before any network I/O and returns a
//! [`PreparedSession`] that can be inspected; [`PreparedSession::execute`]
//! finishes the run.

use crate::config::args::tokenize;
use crate::config::{
    ConfigFileLoader, ConfigOrigin, LayeredConfig, TomlFileLoader, config_file_paths,
};
use crate::connector::{
    ConnectionOptions, ConnectionSource, ConnectorRegistry, DatabaseConnection, DatabaseConnector,
    ResolvedConnector, resolve,
};
use crate::error::{CrawlError, Result};
use crate::executor::{CommandExecutor, ExecutionContext};
use crate::observer::{Notice, SessionObserver, SessionState, TracingObserver};
use crate::options::{CrawlOptions, OutputOptions};
use crate::parsers::{OptionGroupParser, ParseState, default_parsers};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Current state plus the observer that hears about every change.
struct StateTracker {
    state: SessionState,
    observer: Arc<dyn SessionObserver>,
}

impl StateTracker {
    fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            state: SessionState::Init,
            observer,
        }
    }

    fn advance(&mut self, to: SessionState) {
        self.observer.on_transition(self.state, to);
        self.state = to;
    }

    fn notice(&self, notice: &Notice) {
        self.observer.on_notice(notice);
    }

    fn fail(&mut self, error: CrawlError) -> CrawlError {
        warn!("Session failed in {}: {}", self.state, error);
        self.advance(SessionState::Failed);
        error
    }
}

/// One run of the command line, from raw arguments to a finished command.
pub struct CommandLineSession {
    id: Uuid,
    args: Vec<String>,
    registry: Arc<ConnectorRegistry>,
    executor: Arc<dyn CommandExecutor>,
    observer: Arc<dyn SessionObserver>,
    loader: Arc<dyn ConfigFileLoader>,
    parsers: Vec<Box<dyn OptionGroupParser>>,
}

impl CommandLineSession {
    /// Creates a session over raw arguments, excluding the program name.
    ///
    /// Notices go to `tracing`, configuration files are read as TOML and the
    /// default option group parsers are used until replaced.
    pub fn new(
        args: Vec<String>,
        registry: Arc<ConnectorRegistry>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            args,
            registry,
            executor,
            observer: Arc::new(TracingObserver),
            loader: Arc::new(TomlFileLoader),
            parsers: default_parsers(),
        }
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the configuration file loader.
    #[must_use]
    pub fn with_config_loader(mut self, loader: Arc<dyn ConfigFileLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replaces the option group parsers, run in the given order.
    #[must_use]
    pub fn with_parsers(mut self, parsers: Vec<Box<dyn OptionGroupParser>>) -> Self {
        self.parsers = parsers;
        self
    }

    /// Random id attached to every log line of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Runs every step up to and including ACQUIRE_CONNECTION.
    ///
    /// No connection is opened.
    ///
    /// # Errors
    /// Returns the first failure: a command-line error for missing arguments,
    /// no-connector-found before any configuration is loaded, or a
    /// configuration error naming the offending key.
    pub async fn prepare(self) -> Result<PreparedSession> {
        let span = info_span!("session", id = %self.id);
        let mut tracker = StateTracker::new(Arc::clone(&self.observer));
        match self.prepare_steps(&mut tracker).instrument(span).await {
            Ok(prepared) => Ok(prepared),
            Err(error) => Err(tracker.fail(error)),
        }
    }

    /// Prepares the session and executes its command.
    ///
    /// # Errors
    /// Returns the first failure of [`Self::prepare`] or
    /// [`PreparedSession::execute`].
    pub async fn run(self) -> Result<()> {
        self.prepare().await?.execute().await
    }

    async fn prepare_steps(self, tracker: &mut StateTracker) -> Result<PreparedSession> {
        if self.args.iter().all(|arg| arg.trim().is_empty()) {
            return Err(CrawlError::command_line(
                "no arguments given; specify a connection and a command",
            ));
        }

        tracker.advance(SessionState::ResolveConnector);
        let ResolvedConnector {
            connector,
            source,
            inferred_url,
        } = resolve(&self.args, &self.registry)?;
        tracker.notice(&Notice::ConnectorSelected {
            server_type: connector.server_type().to_string(),
            by_server_tag: source == ConnectionSource::ServerTag,
        });

        tracker.advance(SessionState::LoadConfig);
        let inline = tokenize(&self.args)?;
        let mut config = LayeredConfig::new();
        config.merge(connector.bundled_config()?);
        for path in config_file_paths(&inline) {
            let layer = self.loader.load(&path).await?;
            config.merge(layer);
            tracker.notice(&Notice::ConfigFileLoaded {
                path: path.display().to_string(),
            });
        }
        config.merge(inline.clone());
        debug!("Merged {} configuration entries", config.len());

        tracker.advance(SessionState::ParseOptions);
        for parser in &self.parsers {
            parser.normalize_aliases(&mut config);
        }
        let mut state = ParseState::default();
        for parser in &self.parsers {
            parser.apply(&mut config, &mut state, self.observer.as_ref())?;
            tracker.notice(&Notice::ParserApplied {
                parser: parser.name(),
            });
        }
        let command = state
            .command
            .ok_or_else(|| CrawlError::command_line("no command given"))?;

        tracker.advance(SessionState::AcquireConnection);
        let mut connection_layer = inline.select(source.connection_keys(), ConfigOrigin::Connection);
        if let Some(url) = inferred_url
            && !connection_layer.contains("url")
        {
            connection_layer.insert("url", Some(url));
        }
        config.merge(connection_layer);
        for key in source.connection_keys() {
            config.consume(key);
        }
        let connection_options =
            connector.new_connection_options(state.credentials, &config, source)?;
        info!("Prepared '{}' against {}", command, connection_options);

        Ok(PreparedSession {
            id: self.id,
            tracker: StateTracker {
                state: tracker.state,
                observer: Arc::clone(&self.observer),
            },
            connector,
            source,
            executor: self.executor,
            command,
            options: state.options.build(),
            output: state.output,
            additional: state.additional,
            config,
            connection_options,
        })
    }
}

impl fmt::Debug for CommandLineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLineSession")
            .field("id", &self.id)
            .field("args", &self.args.len())
            .field("registry", &self.registry)
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A session whose configuration is fully resolved and whose connection
/// options are built, but whose connection is not yet open.
pub struct PreparedSession {
    id: Uuid,
    tracker: StateTracker,
    connector: Arc<dyn DatabaseConnector>,
    source: ConnectionSource,
    executor: Arc<dyn CommandExecutor>,
    command: String,
    options: CrawlOptions,
    output: OutputOptions,
    additional: BTreeMap<String, Option<String>>,
    config: LayeredConfig,
    connection_options: ConnectionOptions,
}

impl PreparedSession {
    /// Session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state; `ACQUIRE_CONNECTION` until [`Self::execute`] runs.
    pub fn state(&self) -> SessionState {
        self.tracker.state
    }

    /// The command to run.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Frozen crawl options.
    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Output settings.
    pub fn output(&self) -> &OutputOptions {
        &self.output
    }

    /// Entries no parser interpreted.
    pub fn additional(&self) -> &BTreeMap<String, Option<String>> {
        &self.additional
    }

    /// The fully merged configuration.
    pub fn config(&self) -> &LayeredConfig {
        &self.config
    }

    /// Options the connector will open the connection with.
    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.connection_options
    }

    /// The selected connector.
    pub fn connector(&self) -> &Arc<dyn DatabaseConnector> {
        &self.connector
    }

    /// How the connector was selected.
    pub fn source(&self) -> ConnectionSource {
        self.source
    }

    /// Opens the connection, runs the command and releases the connection.
    ///
    /// The connection is closed exactly once on every path after it opens.
    /// When both the command and the release fail, the command error is
    /// returned and the release failure is reported as a notice.
    ///
    /// # Errors
    /// Returns a connection error if the connection cannot be opened or
    /// released, or the command's own error.
    pub async fn execute(self) -> Result<()> {
        let span = info_span!("session", id = %self.id);
        self.execute_steps().instrument(span).await
    }

    async fn execute_steps(mut self) -> Result<()> {
        self.tracker.advance(SessionState::Execute);
        let mut connection = match self.connector.connect(&self.connection_options).await {
            Ok(connection) => connection,
            Err(error) => return Err(self.tracker.fail(error)),
        };
        debug!("Opened connection to {}", self.connection_options);

        let outcome = self.run_command(&mut *connection).await;

        self.tracker.advance(SessionState::Release);
        let released = connection.close().await;

        match (outcome, released) {
            (Ok(()), Ok(())) => {
                info!("Command '{}' completed", self.command);
                self.tracker.advance(SessionState::Done);
                Ok(())
            }
            (Ok(()), Err(error)) => {
                let error = match error {
                    CrawlError::Connection { .. } => error,
                    other => CrawlError::connection_failed("Failed to release connection", other),
                };
                Err(self.tracker.fail(error))
            }
            (Err(error), Ok(())) => Err(self.tracker.fail(error)),
            (Err(error), Err(release)) => {
                self.tracker.notice(&Notice::ReleaseFailed {
                    message: release.to_string(),
                });
                Err(self.tracker.fail(error))
            }
        }
    }

    async fn run_command(&mut self, connection: &mut dyn DatabaseConnection) -> Result<()> {
        let retrieval = self
            .connector
            .retrieval_options_builder()
            .from_config(&mut self.config)?
            .build();
        let context = ExecutionContext {
            command: &self.command,
            options: &self.options,
            output: &self.output,
            additional: &self.additional,
            retrieval: &retrieval,
            config: &self.config,
        };
        info!("Running command '{}'", self.command);
        self.executor.execute(&context, connection).await
    }
}

impl fmt::Debug for PreparedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedSession")
            .field("id", &self.id)
            .field("state", &self.tracker.state)
            .field("server_type", &self.connector.server_type())
            .field("source", &self.source)
            .field("command", &self.command)
            .field("connection_options", &self.connection_options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SessionState::*;
    use crate::parsers::test_support::RecordingObserver;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TransitionLog {
        transitions: Mutex<Vec<(SessionState, SessionState)>>,
        notices: RecordingObserver,
    }

    impl SessionObserver for TransitionLog {
        fn on_transition(&self, from: SessionState, to: SessionState) {
            self.transitions.lock().unwrap().push((from, to));
        }

        fn on_notice(&self, notice: &Notice) {
            self.notices.on_notice(notice);
        }
    }

    struct NoopExecutor;

    #[async_trait::async_trait]
    impl CommandExecutor for NoopExecutor {
        fn commands(&self) -> &[&'static str] {
            &[]
        }

        async fn execute(
            &self,
            _: &ExecutionContext<'_>,
            _: &mut dyn DatabaseConnection,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn session(args: &[&str], log: &Arc<TransitionLog>) -> CommandLineSession {
        CommandLineSession::new(
            args.iter().map(|a| (*a).to_string()).collect(),
            Arc::new(ConnectorRegistry::with_default_connectors()),
            Arc::new(NoopExecutor),
        )
        .with_observer(Arc::clone(log) as Arc<dyn SessionObserver>)
    }

    #[tokio::test]
    async fn test_session_empty_arguments_fail_in_init() {
        let log = Arc::new(TransitionLog::default());
        let error = session(&[], &log).prepare().await.unwrap_err();

        assert!(matches!(error, CrawlError::CommandLine { .. }));
        assert_eq!(*log.transitions.lock().unwrap(), vec![(Init, Failed)]);
    }

    #[tokio::test]
    async fn test_session_without_connector_never_loads_config() {
        let log = Arc::new(TransitionLog::default());
        let error = session(&["-schemas", "PUBLIC", "list"], &log)
            .prepare()
            .await
            .unwrap_err();

        assert!(matches!(error, CrawlError::NoConnectorFound { .. }));
        assert_eq!(
            *log.transitions.lock().unwrap(),
            vec![(Init, ResolveConnector), (ResolveConnector, Failed)]
        );
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_session_prepare_reaches_acquire_connection() {
        let log = Arc::new(TransitionLog::default());
        let prepared = session(&["-server", "sqlite", "-database", "crm.db", "ping"], &log)
            .prepare()
            .await
            .unwrap();

        assert_eq!(prepared.state(), AcquireConnection);
        assert_eq!(prepared.command(), "ping");
        assert_eq!(prepared.connection_options().url(), "sqlite://crm.db");
        assert_eq!(
            *log.transitions.lock().unwrap(),
            vec![
                (Init, ResolveConnector),
                (ResolveConnector, LoadConfig),
                (LoadConfig, ParseOptions),
                (ParseOptions, AcquireConnection),
            ]
        );

        let notices = log.notices.notices.lock().unwrap();
        assert!(notices.contains(&Notice::ConnectorSelected {
            server_type: "sqlite".to_string(),
            by_server_tag: true,
        }));
        let parsers = notices
            .iter()
            .filter(|notice| matches!(notice, Notice::ParserApplied { .. }))
            .count();
        assert_eq!(parsers, 6);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_session_missing_placeholder_value_fails_in_acquire() {
        let log = Arc::new(TransitionLog::default());
        let error = session(&["-server", "sqlite", "ping"], &log)
            .prepare()
            .await
            .unwrap_err();

        assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "database"));
        assert_eq!(
            log.transitions.lock().unwrap().last(),
            Some(&(AcquireConnection, Failed))
        );
    }
}
