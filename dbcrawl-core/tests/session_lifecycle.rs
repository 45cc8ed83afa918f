//! Command-line session integration tests.
//!
//! This test suite covers:
//! - Option resolution through the full parser chain
//! - Configuration precedence across bundled, file and inline layers
//! - State transitions and notices
//! - Connection release on every exit path from EXECUTE

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use common::{
    CapturingExecutor, CountingLoader, Faults, MockConnector, RecordingObserver, args, registry,
};
use dbcrawl_core::{
    CommandLineSession, ConfigOrigin, ConnectionSource, CrawlError, InfoLevel, Notice,
    SessionState,
};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::Ordering;

struct Harness {
    executor: Arc<CapturingExecutor>,
    observer: Arc<RecordingObserver>,
    loader: Arc<CountingLoader>,
    counters: Arc<common::Counters>,
    session: CommandLineSession,
}

fn harness(tokens: Vec<String>, faults: Faults) -> Harness {
    let (registry, counters) = registry(MockConnector::new(faults));
    let executor = Arc::new(CapturingExecutor::default());
    let observer = Arc::new(RecordingObserver::default());
    let loader = Arc::new(CountingLoader::default());
    let session = CommandLineSession::new(tokens, registry, executor.clone())
        .with_observer(observer.clone())
        .with_config_loader(loader.clone());
    Harness {
        executor,
        observer,
        loader,
        counters,
        session,
    }
}

const CONNECT: &[&str] = &["-server", "mockdb", "-database", "crm"];

fn with_connection(extra: &[&str]) -> Vec<String> {
    let mut tokens = args(CONNECT);
    tokens.extend(args(extra));
    tokens
}

// =============================================================================
// Option resolution
// =============================================================================

#[tokio::test]
async fn test_session_schema_and_table_rules() {
    let tokens = with_connection(&["-schemas", "^PUBLIC$", "-tables", ".*", "list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    let options = prepared.options();
    assert!(options.schemas.matches("PUBLIC"));
    assert!(!options.schemas.matches("SALES"));
    assert!(options.tables.matches("ORDERS"));
    assert!(options.tables.matches("X"));
}

#[tokio::test]
async fn test_session_default_info_level_is_standard() {
    let tokens = with_connection(&["list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(prepared.options().info_level.level(), InfoLevel::Standard);
}

#[tokio::test]
async fn test_session_info_level_alias() {
    let tokens = with_connection(&["-i", "maximum", "list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(prepared.options().info_level.level(), InfoLevel::Maximum);
}

#[tokio::test]
async fn test_session_snapshots_are_identical_across_runs() {
    let tokens = with_connection(&[
        "-schemas",
        "PUBLIC|SALES",
        "-grep-columns",
        ".*\\.EMAIL",
        "-invert-match",
        "-parents",
        "2",
        "list",
    ]);
    let first = harness(tokens.clone(), Faults::default()).session.prepare().await.unwrap();
    let second = harness(tokens, Faults::default()).session.prepare().await.unwrap();

    assert_eq!(first.options(), second.options());
    assert_eq!(first.output(), second.output());
    assert_eq!(first.additional(), second.additional());
    assert_ne!(first.id(), second.id());
}

#[tokio::test]
async fn test_session_empty_table_types_clear_the_filter() {
    let cleared = harness(with_connection(&["-tabletypes", "", "list"]), Faults::default())
        .session
        .prepare()
        .await
        .unwrap();
    assert_eq!(cleared.options().table_types, None);

    let defaulted = harness(with_connection(&["list"]), Faults::default())
        .session
        .prepare()
        .await
        .unwrap();
    assert_eq!(
        defaulted.options().table_types,
        Some(vec!["TABLE".to_string(), "VIEW".to_string()])
    );
}

#[tokio::test]
async fn test_session_unknown_keys_pass_through() {
    let tokens = with_connection(&["-portablenames", "-sort-columns=natural", "list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    let additional = prepared.additional();
    assert_eq!(additional.get("portablenames"), Some(&None));
    assert_eq!(
        additional.get("sort-columns"),
        Some(&Some("natural".to_string()))
    );
    assert!(!additional.contains_key("server"));
    assert!(!additional.contains_key("database"));
    assert!(!additional.contains_key("schemas"));
}

#[tokio::test]
async fn test_session_invalid_enum_names_key() {
    let tokens = with_connection(&["-infolevel", "verbose", "list"]);
    let h = harness(tokens, Faults::default());
    let error = h.session.prepare().await.unwrap_err();

    assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "infolevel"));
    assert_eq!(h.observer.states().last(), Some(&SessionState::Failed));
    assert_eq!(h.counters.opened(), 0);
}

#[tokio::test]
async fn test_session_unbalanced_pattern_is_config_error() {
    let tokens = with_connection(&["-tables", "A)|(B", "list"]);
    let h = harness(tokens, Faults::default());
    let error = h.session.prepare().await.unwrap_err();

    assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "tables"));
    assert_eq!(error.kind(), "config");
    assert_eq!(h.counters.opened(), 0);
}

#[tokio::test]
async fn test_session_unreadable_password_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pw").to_str().unwrap().to_string();

    let tokens = with_connection(&["-password:file", path.as_str(), "list"]);
    let h = harness(tokens, Faults::default());
    let error = h.session.prepare().await.unwrap_err();

    assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "password:file"));
    assert_eq!(error.kind(), "config");
    assert_eq!(h.counters.opened(), 0);
}

// =============================================================================
// Configuration precedence
// =============================================================================

#[tokio::test]
async fn test_session_config_file_precedence() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "title = \"From file\"\nschemas = \"FILE_SCHEMA\"\nport = 7100"
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let tokens = with_connection(&["-g", path.as_str(), "-title", "From args", "list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(prepared.options().title, "From args");
    assert!(prepared.options().schemas.matches("FILE_SCHEMA"));
    assert_eq!(prepared.connection_options().url(), "mock://localhost:7100/crm");
    assert_eq!(prepared.config().origin("title"), Some(&ConfigOrigin::CommandLine));
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 1);
    assert!(h.observer.notices().iter().any(|notice| matches!(
        notice,
        Notice::ConfigFileLoaded { path: loaded } if *loaded == path
    )));
}

#[tokio::test]
async fn test_session_missing_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml").to_str().unwrap().to_string();

    let tokens = with_connection(&["-g", path.as_str(), "list"]);
    let h = harness(tokens, Faults::default());
    let error = h.session.prepare().await.unwrap_err();

    assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "configfile"));
    assert_eq!(error.kind(), "config");
    assert!(error.to_string().contains("absent.toml"));
    assert_eq!(h.observer.states().last(), Some(&SessionState::Failed));
}

#[tokio::test]
async fn test_session_bundled_defaults_apply_without_files() {
    let h = harness(with_connection(&["list"]), Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(prepared.options().title, "Bundled title");
    assert_eq!(prepared.connection_options().url(), "mock://localhost:7000/crm");
    assert_eq!(prepared.source(), ConnectionSource::ServerTag);
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_session_connection_arguments_build_url() {
    let tokens = with_connection(&["-host", "db.internal", "-urlx", "sslmode=require", "list"]);
    let h = harness(tokens, Faults::default());
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(
        prepared.connection_options().url(),
        "mock://db.internal:7000/crm?sslmode=require"
    );
    assert_eq!(prepared.config().origin("host"), Some(&ConfigOrigin::Connection));
}

#[tokio::test]
async fn test_session_url_mode() {
    let h = harness(
        args(&["-url", "mock://reporting:9000/warehouse", "list"]),
        Faults::default(),
    );
    let prepared = h.session.prepare().await.unwrap();

    assert_eq!(prepared.source(), ConnectionSource::Url);
    assert_eq!(
        prepared.connection_options().url(),
        "mock://reporting:9000/warehouse"
    );
    assert!(h.observer.notices().contains(&Notice::ConnectorSelected {
        server_type: "mockdb".to_string(),
        by_server_tag: false,
    }));
}

#[tokio::test]
async fn test_session_missing_connector_skips_config_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "title = \"unused\"").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let h = harness(
        args(&["-g", path.as_str(), "-tables", ".*", "list"]),
        Faults::default(),
    );
    let error = h.session.prepare().await.unwrap_err();

    assert!(matches!(error, CrawlError::NoConnectorFound { .. }));
    assert_eq!(h.loader.loads.load(Ordering::SeqCst), 0);
    assert!(!h.observer.states().contains(&SessionState::LoadConfig));
    assert_eq!(
        h.observer.states(),
        vec![SessionState::ResolveConnector, SessionState::Failed]
    );
}

// =============================================================================
// Execution and release
// =============================================================================

#[tokio::test]
async fn test_session_successful_run() {
    let tokens = with_connection(&["-retrieval.identifier_quote=`", "list"]);
    let h = harness(tokens, Faults::default());
    h.session.run().await.unwrap();

    assert_eq!(
        h.observer.states(),
        vec![
            SessionState::ResolveConnector,
            SessionState::LoadConfig,
            SessionState::ParseOptions,
            SessionState::AcquireConnection,
            SessionState::Execute,
            SessionState::Release,
            SessionState::Done,
        ]
    );
    assert_eq!(h.counters.opened(), 1);
    assert_eq!(h.counters.closed(), 1);

    let captured = h.executor.captured.lock().unwrap().clone().unwrap();
    assert_eq!(captured.command, "list");
    assert_eq!(captured.retrieval.server_type, "mockdb");
    assert_eq!(captured.retrieval.identifier_quote, "`");
}

#[tokio::test]
async fn test_session_failure_mid_execute_releases_once() {
    let faults = Faults {
        ping: true,
        ..Faults::default()
    };
    let h = harness(with_connection(&["list"]), faults);
    let error = h.session.run().await.unwrap_err();

    assert!(matches!(error, CrawlError::Execution { ref command, .. } if command == "list"));
    assert_eq!(h.counters.closed(), 1);
    assert_eq!(
        h.observer.states()[4..],
        [SessionState::Execute, SessionState::Release, SessionState::Failed]
    );
}

#[tokio::test]
async fn test_session_release_failure_after_success_is_connection_error() {
    let faults = Faults {
        close: true,
        ..Faults::default()
    };
    let h = harness(with_connection(&["list"]), faults);
    let error = h.session.run().await.unwrap_err();

    assert!(matches!(error, CrawlError::Connection { .. }));
    assert_eq!(h.counters.closed(), 1);
}

#[tokio::test]
async fn test_session_execution_error_wins_over_release_failure() {
    let faults = Faults {
        ping: true,
        close: true,
        ..Faults::default()
    };
    let h = harness(with_connection(&["list"]), faults);
    let error = h.session.run().await.unwrap_err();

    assert!(matches!(error, CrawlError::Execution { .. }));
    assert_eq!(h.counters.closed(), 1);
    assert!(h
        .observer
        .notices()
        .iter()
        .any(|notice| matches!(notice, Notice::ReleaseFailed { .. })));
}

#[tokio::test]
async fn test_session_connect_failure_has_nothing_to_release() {
    let faults = Faults {
        connect: true,
        ..Faults::default()
    };
    let h = harness(with_connection(&["list"]), faults);
    let error = h.session.run().await.unwrap_err();

    assert!(matches!(error, CrawlError::Connection { .. }));
    assert_eq!(h.counters.closed(), 0);
    assert!(!h.observer.states().contains(&SessionState::Release));
    assert!(h.executor.captured.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_session_invalid_retrieval_setting_still_releases() {
    let tokens = with_connection(&["-retrieval.strategy=guess", "list"]);
    let h = harness(tokens, Faults::default());
    let error = h.session.run().await.unwrap_err();

    assert!(matches!(error, CrawlError::Config { ref key, .. } if key == "retrieval.strategy"));
    assert_eq!(h.counters.opened(), 1);
    assert_eq!(h.counters.closed(), 1);
    assert!(h.executor.captured.lock().unwrap().is_none());
}
