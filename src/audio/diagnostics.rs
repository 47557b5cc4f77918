//! Structured diagnostics for the sound subsystem
//!
//! Audio never raises errors to callers. Every failure becomes a
//! [`Diagnostic`] handed to a [`DiagnosticSink`]; the default sink forwards
//! to the `log` facade.

use std::fmt;

use super::error::AudioError;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Context construction failed (no audio on this platform)
    Unsupported,
    /// Context resume rejected by platform policy
    ResumeRejected,
    /// Sound fetch failed (network error or non-success status)
    FetchFailed,
    /// Sound bytes could not be decoded
    DecodeFailed,
    /// Play requested while the context is not running
    ContextNotRunning,
    /// No buffer after loading completed (the sound failed to load)
    BufferMissing,
    /// No buffer yet, loading still in flight
    StillLoading,
    /// No buffer and loading never started despite initialization
    LoadingNotStarted,
    /// Backend failed to build or start the playback graph
    PlaybackFailed,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Unsupported => "unsupported",
            DiagnosticCode::ResumeRejected => "resume-rejected",
            DiagnosticCode::FetchFailed => "fetch-failed",
            DiagnosticCode::DecodeFailed => "decode-failed",
            DiagnosticCode::ContextNotRunning => "context-not-running",
            DiagnosticCode::BufferMissing => "buffer-missing",
            DiagnosticCode::StillLoading => "still-loading",
            DiagnosticCode::LoadingNotStarted => "loading-not-started",
            DiagnosticCode::PlaybackFailed => "playback-failed",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic event
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Sound id or family name involved, if any
    pub sound: Option<String>,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, detail: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            sound: None,
            detail: detail.into(),
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Diagnostic for a failed per-sound load
    pub fn load_failed(id: &str, err: &AudioError) -> Self {
        let code = match err {
            AudioError::Decode(_) => DiagnosticCode::DecodeFailed,
            _ => DiagnosticCode::FetchFailed,
        };
        Self::new(Severity::Error, code, err.to_string()).with_sound(id)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sound {
            Some(sound) => write!(f, "[{}] {}: {}", self.code, sound, self.detail),
            None => write!(f, "[{}] {}", self.code, self.detail),
        }
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Sink that forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Debug => log::debug!("{}", diagnostic),
            Severity::Info => log::info!("{}", diagnostic),
            Severity::Warn => log::warn!("{}", diagnostic),
            Severity::Error => log::error!("{}", diagnostic),
        }
    }
}
