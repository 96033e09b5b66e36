use tracing::{Dispatch, Level};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::writer::{BoxMakeWriter, MakeWriter, MakeWriterExt},
    EnvFilter,
};

/// Installs the global subscriber for a Lambda process.
///
/// Warnings and errors go to stderr, everything else to stdout. The filter comes from
/// `AWS_LAMBDA_LOG_LEVEL`, then `RUST_LOG`, defaulting to `info`. Setting
/// `AWS_LAMBDA_LOG_FORMAT=JSON` switches to one JSON object per line.
pub fn init_subscriber() {
    let directives = std::env::var("AWS_LAMBDA_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_default();
    let json = is_json_format(std::env::var("AWS_LAMBDA_LOG_FORMAT").ok().as_deref());

    let dispatch = build_dispatch(&directives, json, std::io::stderr, std::io::stdout);
    if let Err(e) = tracing::dispatcher::set_global_default(dispatch) {
        eprintln!("Failed to install tracing subscriber: {:?}", e);
    }
}

/// Builds the subscriber with warn/error routed to `errors` and lower levels to `progress`.
pub fn build_dispatch<E, P>(directives: &str, json: bool, errors: E, progress: P) -> Dispatch
where
    E: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    P: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives);

    let writer = BoxMakeWriter::new(errors)
        .with_max_level(Level::WARN)
        .or_else(BoxMakeWriter::new(progress));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .without_time();

    if json {
        Dispatch::new(builder.json().finish())
    } else {
        Dispatch::new(builder.finish())
    }
}

fn is_json_format(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|format| format.eq_ignore_ascii_case("json"))
}

#[cfg(any(test, feature = "mocks"))]
pub use capture::LogCapture;

#[cfg(any(test, feature = "mocks"))]
mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory log sink, cloned into a subscriber as a writer.
    #[derive(Clone, Default)]
    pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        pub fn writer(&self) -> impl Fn() -> LogCapture + Send + Sync + 'static {
            let capture = self.clone();
            move || capture.clone()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
