//! Run-scoped state shared by every component
//!
//! A [`RunContext`] is built once per generation run and handed to the
//! dictionary loader, the enumerators and the writer loop. It owns the
//! cancellation flag, the transformed-dictionary cache and the progress sink,
//! so nothing in the crate needs global state.

use crate::dictionary::DictionaryCache;
use crate::progress::{NullReporter, ProgressReporter};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Emit a progress event every this many generated entries
pub const PROGRESS_UPDATE_INTERVAL: u64 = 50_000;

/// Cooperative cancellation flag
///
/// Clones share the same flag. Once cancelled it stays cancelled; every
/// enumerator and consumer loop polls it before producing the next element.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Ctrl-C / SIGTERM handler bound to this token
    ///
    /// The first signal cancels the run so pending output is flushed. A second
    /// signal exits immediately with status 130.
    pub fn interrupt_handler(&self) -> impl FnMut() + Send + 'static {
        let token = self.clone();
        move || {
            if token.is_cancelled() {
                std::process::exit(130);
            }
            log::warn!("Interrupted; finishing pending writes (Ctrl-C again to abort)");
            token.cancel();
        }
    }
}

/// Per-run context
pub struct RunContext {
    pub token: CancellationToken,
    pub cache: DictionaryCache,
    pub reporter: Arc<dyn ProgressReporter>,
    pub progress_interval: u64,
}

impl RunContext {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            token: CancellationToken::new(),
            cache: DictionaryCache::default(),
            reporter,
            progress_interval: PROGRESS_UPDATE_INTERVAL,
        }
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(Arc::new(NullReporter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();

        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());

        // Setting twice is harmless
        other.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_context_uses_given_token() {
        let token = CancellationToken::new();
        let ctx = RunContext::default().with_token(token.clone());

        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_interrupt_handler_cancels_run() {
        let token = CancellationToken::new();
        let ctx = RunContext::default().with_token(token.clone());
        let mut handler = token.interrupt_handler();

        assert!(!ctx.is_cancelled());
        handler();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_progress_interval_never_zero() {
        let ctx = RunContext::default().with_progress_interval(0);
        assert_eq!(ctx.progress_interval, 1);
    }
}
