use std::io::Write;

#[cfg(feature = "debug-logging")]
const OUTPUT_LOG_FILE: &str = "output_log.txt";
#[cfg(feature = "debug-logging")]
const INPUT_LOG_FILE: &str = "input_log.txt";

/// Install the global logger. `RUST_LOG` wins over `default_filter`.
pub fn init(default_filter: &str) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}: {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    })
    .try_init();

    if result.is_err() {
        debug!("Logger already initialized");
    }
}

/// Replace anything that is not printable ASCII with '.'.
pub fn sanitize(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/// Bytes written to the PTY.
pub fn log_input_data(data: &[u8]) {
    trace!("PTY input: {}", sanitize(data));
    #[cfg(feature = "debug-logging")]
    append_to(INPUT_LOG_FILE, data);
}

/// Bytes read from the PTY.
pub fn log_output_data(data: &[u8]) {
    trace!("PTY output: {}", sanitize(data));
    #[cfg(feature = "debug-logging")]
    append_to(OUTPUT_LOG_FILE, data);
}

#[cfg(feature = "debug-logging")]
fn append_to(path: &str, data: &[u8]) {
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path);
    match file {
        Ok(mut f) => {
            let _ = writeln!(f, "{}", sanitize(data));
        }
        Err(e) => warn!("Cannot open {path}: {e}"),
    }
}
