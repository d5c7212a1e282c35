// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Environment-driven configuration.
//!
//! Every tunable comes from an environment variable with a safe default.
//! Malformed values never abort startup: they log a warning and fall back
//! to the default, so a typo in a deployment manifest degrades gracefully
//! instead of taking the service down.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use signkit_core::Actions;

/// Reads a string variable, treating unset or blank as absent.
fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Reads and parses a variable, falling back to the default on absence or
/// parse failure.
fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    let Some(raw) = env_string(name) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` means permissive.
    pub cors_origins: Vec<String>,
    /// When set, WebSocket connections must present it as `?api_key=`.
    pub api_key: Option<String>,
    /// Maximum raw `frame` string length before the silent size drop.
    pub max_frame_payload: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_origins: vec!["*".to_string()],
            api_key: None,
            max_frame_payload: 5_000_000,
        }
    }
}

impl ServerConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let cors_origins = env_string("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);

        Self {
            host: env_string("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            cors_origins,
            api_key: env_string("API_KEY"),
            max_frame_payload: env_parse("MAX_FRAME_PAYLOAD", defaults.max_frame_payload),
        }
    }
}

/// Detection pipeline tunables.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub actions: Actions,
    /// Window length W fed to the classifier.
    pub sequence_length: usize,
    /// Stability filter confidence gate. Deliberately unclamped: a value
    /// above 1.0 disables stability (and therefore sentences) entirely.
    pub confidence_threshold: f32,
    /// Stability filter history size S.
    pub stability_window: usize,
    /// Silence that closes a sentence, in seconds.
    pub sentence_timeout_s: f64,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            actions: Actions::default(),
            sequence_length: 30,
            confidence_threshold: 0.7,
            stability_window: 8,
            sentence_timeout_s: 2.0,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

impl DetectionConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let actions = env_string("ACTIONS")
            .and_then(|csv| Actions::from_csv(&csv))
            .unwrap_or(defaults.actions);

        let mut sequence_length = env_parse("SEQUENCE_LENGTH", defaults.sequence_length);
        if sequence_length == 0 {
            tracing::warn!(var = "SEQUENCE_LENGTH", "Value must be positive, using default");
            sequence_length = defaults.sequence_length;
        }

        let mut stability_window = env_parse("STABILITY_WINDOW", defaults.stability_window);
        if stability_window == 0 {
            tracing::warn!(var = "STABILITY_WINDOW", "Value must be positive, using default");
            stability_window = defaults.stability_window;
        }

        let mut sentence_timeout_s = env_parse("SENTENCE_TIMEOUT", defaults.sentence_timeout_s);
        if !sentence_timeout_s.is_finite() || sentence_timeout_s < 0.0 {
            tracing::warn!(var = "SENTENCE_TIMEOUT", "Value must be non-negative, using default");
            sentence_timeout_s = defaults.sentence_timeout_s;
        }

        Self {
            actions,
            sequence_length,
            confidence_threshold: env_parse(
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            ),
            stability_window,
            sentence_timeout_s,
            min_detection_confidence: env_parse(
                "MIN_DETECTION_CONFIDENCE",
                defaults.min_detection_confidence,
            ),
            min_tracking_confidence: env_parse(
                "MIN_TRACKING_CONFIDENCE",
                defaults.min_tracking_confidence,
            ),
        }
    }

    pub fn sentence_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.sentence_timeout_s)
    }
}

/// Per-connection frame admission limits.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_frames: usize,
    pub window_s: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_frames: 60, window_s: 10.0 }
    }
}

impl RateLimitConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        let mut window_s = env_parse("RATE_LIMIT_WINDOW_S", defaults.window_s);
        if !window_s.is_finite() || window_s < 0.0 {
            tracing::warn!(var = "RATE_LIMIT_WINDOW_S", "Value must be non-negative, using default");
            window_s = defaults.window_s;
        }
        Self { max_frames: env_parse("RATE_LIMIT_FRAMES", defaults.max_frames), window_s }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_s)
    }

    /// The wire error message for a rejected frame.
    pub fn rejection_message(&self) -> String {
        format!(
            "Rate limit exceeded: max {} frames per {} seconds",
            self.max_frames, self.window_s
        )
    }
}

/// On-disk model artifact locations.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub classifier_path: String,
    pub landmark_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: "models/sign_classifier.onnx".to_string(),
            landmark_path: "models/holistic_landmarks.onnx".to_string(),
        }
    }
}

impl ModelConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            classifier_path: env_string("MODEL_PATH").unwrap_or(defaults.classifier_path),
            landmark_path: env_string("LANDMARK_MODEL_PATH").unwrap_or(defaults.landmark_path),
        }
    }
}

/// Logging configuration for console and optional file output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are additionally written to this file.
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file_path: None }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env_string("LOG_LEVEL").unwrap_or(defaults.level),
            file_path: env_string("LOG_FILE"),
        }
    }
}

/// Root configuration for the signd server.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub detection: DetectionConfig,
    pub rate_limit: RateLimitConfig,
    pub model: ModelConfig,
    pub log: LogConfig,
}

impl Config {
    /// Loads the full configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            detection: DetectionConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            model: ModelConfig::from_env(),
            log: LogConfig::from_env(),
        }
    }
}

/// The environment variables the server reads, with their defaults.
/// Printed by `signd config env`.
pub const ENV_VARS: &[(&str, &str, &str)] = &[
    ("HOST", "0.0.0.0", "bind host"),
    ("PORT", "8001", "listen port"),
    ("CORS_ORIGINS", "*", "comma-separated allowed origins"),
    ("API_KEY", "(unset)", "when set, required as ?api_key= on WebSocket connect"),
    ("MAX_FRAME_PAYLOAD", "5000000", "max raw frame string length"),
    ("MODEL_PATH", "models/sign_classifier.onnx", "sign classifier ONNX artifact"),
    ("LANDMARK_MODEL_PATH", "models/holistic_landmarks.onnx", "holistic landmark ONNX artifact"),
    ("ACTIONS", "(built-in 10 glosses)", "comma-separated action labels, training order"),
    ("SEQUENCE_LENGTH", "30", "classifier window length"),
    ("CONFIDENCE_THRESHOLD", "0.7", "stability filter confidence gate"),
    ("STABILITY_WINDOW", "8", "stability filter history size"),
    ("SENTENCE_TIMEOUT", "2.0", "seconds of silence that close a sentence"),
    ("MIN_DETECTION_CONFIDENCE", "0.5", "landmark group detection confidence"),
    ("MIN_TRACKING_CONFIDENCE", "0.5", "landmark group tracking confidence"),
    ("RATE_LIMIT_FRAMES", "60", "frames per window per connection"),
    ("RATE_LIMIT_WINDOW_S", "10.0", "rate limit window in seconds"),
    ("LOG_LEVEL", "info", "default log level when RUST_LOG is unset"),
    ("LOG_FILE", "(unset)", "optional log file path"),
];
