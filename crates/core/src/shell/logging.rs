use std::sync::Once;

use log::LevelFilter;

use super::config::LogLevel;

static INIT_LOG: Once = Once::new();

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

pub fn init_log(level: LogLevel) {
    INIT_LOG.call_once(|| {
        platform::init_log(level);
    });
}

pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.into())
}

/// `[LEVEL] target - message`, errors also carry their source location.
#[cfg_attr(all(target_vendor = "apple", not(test)), allow(dead_code))]
fn line(record: &log::Record<'_>) -> String {
    if record.level() != log::Level::Error {
        return format!("[{}] {} - {}", record.level(), record.target(), record.args());
    }

    let line = record.line().map_or_else(|| "unknown".into(), |l| l.to_string());
    format!(
        "[{}] {} {}:{line} - {}",
        record.level(),
        record.target(),
        record.file().unwrap_or("unknown"),
        record.args()
    )
}

// The HTTP stack logs every connection at debug.
const NOISY_TARGETS: [&str; 3] = ["reqwest", "hyper", "hyper_util"];

#[cfg(all(target_os = "android", not(test)))]
mod platform {
    use super::*;

    pub fn init_log(level: LogLevel) {
        let mut filter = android_logger::FilterBuilder::new();
        filter.filter_level(level.into());
        for target in NOISY_TARGETS {
            filter.filter_module(target, LevelFilter::Warn);
        }

        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(level.into())
                .with_tag("WebShell")
                .with_filter(filter.build())
                .format(|f, record| writeln!(f, "{}", line(record))),
        );
    }
}

#[cfg(all(target_vendor = "apple", not(test)))]
mod platform {
    use super::*;

    pub fn init_log(level: LogLevel) {
        let mut logger = oslog::OsLogger::new("com.webshell.core").level_filter(level.into());
        for target in NOISY_TARGETS {
            logger = logger.category_level_filter(target, LevelFilter::Warn);
        }

        if let Err(e) = logger.init() {
            eprintln!("{e}");
        }
    }
}

#[cfg(any(test, not(any(target_os = "android", target_vendor = "apple"))))]
mod platform {
    use std::io::Write;

    use env_logger::{Builder, Env};

    use super::*;

    pub fn init_log(level: LogLevel) {
        let env = Env::default();
        let mut builder = Builder::from_env(env);
        builder
            .is_test(cfg!(test))
            .format(|formatter, record| writeln!(formatter, "{}", line(record)))
            .filter(None, level.into());

        for target in NOISY_TARGETS {
            builder.filter(Some(target), LevelFilter::Warn);
        }

        let _ = builder.try_init();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn only_errors_carry_a_location() {
        let info = log::Record::builder()
            .level(log::Level::Info)
            .target("webshell_core::shell")
            .args(format_args!("Started on Welcome"))
            .build();
        assert_eq!(line(&info), "[INFO] webshell_core::shell - Started on Welcome");

        let error = log::Record::builder()
            .level(log::Level::Error)
            .target("webshell_core::remote")
            .file(Some("src/remote/mod.rs"))
            .line(Some(42))
            .args(format_args!("boom"))
            .build();
        assert_eq!(
            line(&error),
            "[ERROR] webshell_core::remote src/remote/mod.rs:42 - boom"
        );
    }
}
