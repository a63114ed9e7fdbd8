use regex::Regex;
use std::sync::LazyLock;

/// `[<timestamp>] <LEVEL>: <message>` as printed by the refresh tool in verbose mode
static LEVEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[.*?\]\s+(INFO|WARNING|ERROR):\s+(.+)$").expect("valid level pattern")
});

/// `<url> <rate unit/s> <seconds s>`, a per-mirror download measurement
static SERVER_STAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://\S+)\s+(\S+\s+\S+/s)\s+(\S+\s+s)$").expect("valid server pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    ServerStat,
    Warning,
    Error,
}

/// One classified line of helper output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Info(String),
    ServerStat {
        raw: String,
        server: String,
        rate: String,
        time: String,
    },
    Warning(String),
    Error(String),
}

impl LogRecord {
    pub fn kind(&self) -> LogKind {
        match self {
            LogRecord::Info(_) => LogKind::Info,
            LogRecord::ServerStat { .. } => LogKind::ServerStat,
            LogRecord::Warning(_) => LogKind::Warning,
            LogRecord::Error(_) => LogKind::Error,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            LogRecord::Info(raw) | LogRecord::Warning(raw) | LogRecord::Error(raw) => raw,
            LogRecord::ServerStat { raw, .. } => raw,
        }
    }
}

/// Classify one line. Anything unrecognised becomes `Info` with the line as-is.
pub fn classify(line: &str) -> LogRecord {
    let line = line.trim();

    let Some(caps) = LEVEL_LINE.captures(line) else {
        return LogRecord::Info(line.to_string());
    };

    let message = caps[2].trim().to_string();
    match &caps[1] {
        "WARNING" => LogRecord::Warning(message),
        "ERROR" => LogRecord::Error(message),
        _ => match SERVER_STAT.captures(&message) {
            Some(stat) => LogRecord::ServerStat {
                server: stat[1].to_string(),
                rate: stat[2].to_string(),
                time: stat[3].to_string(),
                raw: message,
            },
            None => LogRecord::Info(message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_with_measurement_is_a_server_stat() {
        let record = classify("[2024-01-15 10:30:45] INFO: https://mirror.example.com 5.2 MiB/s 0.5 s");

        assert_eq!(record.kind(), LogKind::ServerStat);
        match record {
            LogRecord::ServerStat { server, rate, time, .. } => {
                assert_eq!(server, "https://mirror.example.com");
                assert_eq!(rate, "5.2 MiB/s");
                assert_eq!(time, "0.5 s");
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn error_level_keeps_the_message() {
        assert_eq!(
            classify("[2024-01-15 10:30:45] ERROR: connection timed out"),
            LogRecord::Error("connection timed out".to_string())
        );
    }

    #[test]
    fn warning_level_keeps_the_message() {
        assert_eq!(
            classify("[2024-01-15 10:30:45] WARNING: failed to rate http download"),
            LogRecord::Warning("failed to rate http download".to_string())
        );
    }

    #[test]
    fn unstructured_text_passes_through() {
        assert_eq!(
            classify("garbage text with no structure"),
            LogRecord::Info("garbage text with no structure".to_string())
        );
    }

    #[test]
    fn plain_info_message_is_info() {
        assert_eq!(
            classify("[2024-01-15 10:30:45] INFO: refreshing mirrors"),
            LogRecord::Info("refreshing mirrors".to_string())
        );
    }

    #[test]
    fn unknown_level_and_odd_input_never_fail() {
        assert_eq!(
            classify("[ts] DEBUG: something"),
            LogRecord::Info("[ts] DEBUG: something".to_string())
        );
        assert_eq!(classify(""), LogRecord::Info(String::new()));
        assert_eq!(classify("  [unterminated INFO: x  "), LogRecord::Info("[unterminated INFO: x".to_string()));
        assert_eq!(classify("[x] INFO: ftp://m.example 1 KiB/s 2 s").kind(), LogKind::Info);
    }

    #[test]
    fn raw_is_always_available() {
        let record = classify("[t] INFO: http://m.example/arch/ 12.0 KiB/s 3.10 s");
        assert_eq!(record.raw(), "http://m.example/arch/ 12.0 KiB/s 3.10 s");
    }
}
