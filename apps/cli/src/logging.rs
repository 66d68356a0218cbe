use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TARGETS: [&str; 6] = [
    "sitestudio",
    "sitestudio_core",
    "sitestudio_highlight",
    "sitestudio_project",
    "sitestudio_runexec",
    "sitestudio_session",
];

/// 初始化 stderr 日誌；`RUST_LOG` 優先。 / Installs the stderr subscriber; `RUST_LOG` wins.
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbose),
    );
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = subscriber.try_init();
}

fn default_directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
