use std::collections::HashMap;

use serde::Serialize;

/// Structured logging utilities for ComMute
///
/// Every accepted change signal and every player command goes through these
/// helpers so a log file reads as a sequence of operations:
///
/// - **Operations** (change signal handling, startup query): start/complete/failed
/// - **Player commands**: one line per remote call with its outcome
/// - **State transitions**: ducking mode changes
///
/// The log level is taken from `RUST_LOG` (default `info`).

/// Structured log event types
#[derive(Debug, Clone, Serialize)]
pub enum LogEvent {
    Operation {
        name: String,
        phase: OperationPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<LogContext>,
    },
    Player {
        command: String,
        status: PlayerStatus,
    },
}

#[derive(Debug, Clone, Serialize)]
pub enum OperationPhase {
    Start,
    Complete { duration_ms: u64 },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LogContext {
    #[serde(flatten)]
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub enum PlayerStatus {
    Success,
    Failed { error: String },
}

/// Install the global logger. Safe to call more than once.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialized");
    }
}

pub fn log_event(event: LogEvent) {
    match event {
        LogEvent::Operation { name, phase, context } => {
            let ctx_str = context
                .map(|c| format!(" | {:?}", c.fields))
                .unwrap_or_default();
            match phase {
                OperationPhase::Start => {
                    log::info!("🚀 {} STARTING{}", name, ctx_str);
                }
                OperationPhase::Complete { duration_ms } => {
                    log::info!("✅ {} COMPLETE in {}ms{}", name, duration_ms, ctx_str);
                }
                OperationPhase::Skipped { reason } => {
                    log::trace!("⏭️ {} SKIPPED: {}{}", name, reason, ctx_str);
                }
                OperationPhase::Failed { error } => {
                    log::warn!("❌ {} FAILED: {}{}", name, error, ctx_str);
                }
            }
        }
        LogEvent::Player { command, status } => match status {
            PlayerStatus::Success => log::debug!("🎛️ player {} OK", command),
            PlayerStatus::Failed { error } => {
                log::warn!("🎛️ player {} FAILED: {}", command, error)
            }
        },
    }
}

fn to_context(fields: &HashMap<String, String>) -> Option<LogContext> {
    if fields.is_empty() {
        None
    } else {
        Some(LogContext {
            fields: fields.clone(),
        })
    }
}

#[inline]
pub fn log_operation_start(operation: &str, params: &HashMap<String, String>) {
    log_event(LogEvent::Operation {
        name: operation.to_string(),
        phase: OperationPhase::Start,
        context: to_context(params),
    });
}

#[inline]
pub fn log_operation_complete(
    operation: &str,
    duration_ms: u64,
    results: &HashMap<String, String>,
) {
    log_event(LogEvent::Operation {
        name: operation.to_string(),
        phase: OperationPhase::Complete { duration_ms },
        context: to_context(results),
    });
}

pub fn log_operation_skipped(operation: &str, reason: &str) {
    log_event(LogEvent::Operation {
        name: operation.to_string(),
        phase: OperationPhase::Skipped {
            reason: reason.to_string(),
        },
        context: None,
    });
}

pub fn log_operation_failed(operation: &str, error: &str, context: &HashMap<String, String>) {
    log_event(LogEvent::Operation {
        name: operation.to_string(),
        phase: OperationPhase::Failed {
            error: error.to_string(),
        },
        context: to_context(context),
    });
}

/// Log the outcome of a remote player command.
pub fn log_player_command<T, E: std::fmt::Display>(command: &str, result: &Result<T, E>) {
    let status = match result {
        Ok(_) => PlayerStatus::Success,
        Err(e) => PlayerStatus::Failed {
            error: e.to_string(),
        },
    };
    log_event(LogEvent::Player {
        command: command.to_string(),
        status,
    });
}

/// Log ducking mode transitions
pub fn log_state_transition(component: &str, from_state: &str, to_state: &str) {
    log::info!("🔄 STATE [{}]: {} → {}", component, from_state, to_state);
}

/// Log application lifecycle events
pub fn log_lifecycle_event(event: &str, context: Option<&HashMap<String, String>>) {
    log::info!(
        "🚀 LIFECYCLE {} - Version: {}",
        event,
        env!("CARGO_PKG_VERSION")
    );

    if let Some(ctx) = context {
        if !ctx.is_empty() {
            log::info!("   📋 Context: {:?}", ctx);
        }
    }
}

/// Log file operations with details
pub fn log_file_operation(operation: &str, path: &str, success: bool, error: Option<&str>) {
    let status = if success { "✅" } else { "❌" };
    log::info!("{} FILE {} - {}", status, operation.to_uppercase(), path);

    if let Some(err) = error {
        log::error!("   ❌ Error: {}", err);
    }
}

/// Macro for quick context creation
#[macro_export]
macro_rules! log_context {
    ($($key:expr => $value:expr),* $(,)?) => {
        {
            // Only create HashMap if logging is actually enabled
            if log::log_enabled!(log::Level::Info) {
                let mut context = std::collections::HashMap::new();
                $(
                    context.insert($key.to_string(), $value.to_string());
                )*
                context
            } else {
                std::collections::HashMap::new()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_macro() {
        let context = log_context! {
            "decision" => "duck",
            "ad_volume" => 15,
        };

        if log::log_enabled!(log::Level::Info) {
            assert_eq!(context.len(), 2);
            assert_eq!(context.get("ad_volume"), Some(&"15".to_string()));
        } else {
            assert!(context.is_empty());
        }
    }

    #[test]
    fn test_log_event_serializes() {
        let event = LogEvent::Operation {
            name: "change_signal".to_string(),
            phase: OperationPhase::Complete { duration_ms: 12 },
            context: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("change_signal"));
        assert!(!json.contains("context"));
    }

    #[test]
    fn test_logging_helpers_do_not_panic() {
        init_logging();
        init_logging();
        log_player_command::<(), String>("set_volume", &Err("boom".to_string()));
        log_player_command::<u8, String>("get_volume", &Ok(10));
        log_operation_skipped("change_signal", "handler busy");
        log_state_transition("ducking", "ContentPlaying", "AdPlaying");
        log_file_operation("save", "/tmp/x", false, Some("denied"));
    }
}
