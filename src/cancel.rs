use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Shared interrupt flag plus counts of children and hidden-input prompts
/// still in flight, so the interrupt path knows whether it may exit.
#[derive(Debug, Clone, Default)]
pub(crate) struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notice_claimed: Arc<AtomicBool>,
    active_children: Arc<AtomicUsize>,
    secret_prompts: Arc<AtomicUsize>,
}

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True for exactly one caller; whoever gets it prints the notice.
    pub(crate) fn claim_notice(&self) -> bool {
        !self.notice_claimed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn track_child(&self) -> ActiveGuard {
        ActiveGuard::new(&self.active_children)
    }

    /// Held while the terminal echo is off.
    pub(crate) fn track_secret_prompt(&self) -> ActiveGuard {
        ActiveGuard::new(&self.secret_prompts)
    }

    pub(crate) fn active_children(&self) -> usize {
        self.active_children.load(Ordering::SeqCst)
    }

    pub(crate) fn secret_prompt_active(&self) -> bool {
        self.secret_prompts.load(Ordering::SeqCst) > 0
    }

    /// Returns true if every tracked child was released in time.
    pub(crate) fn wait_for_children(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while self.active_children() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        true
    }
}

pub(crate) struct ActiveGuard {
    counter: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What the signal thread does after an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InterruptAction {
    /// Nothing will unwind on its own; exit from the signal thread.
    Exit,
    /// Children were killed; the main thread unwinds with `Cancelled`.
    Unwind,
    /// Echo is off; the prompt returns `Cancelled` once Enter is pressed.
    AwaitSecretPrompt,
}

pub(crate) fn interrupt_action(token: &CancelToken, grace: Duration) -> InterruptAction {
    token.cancel();
    if token.secret_prompt_active() {
        return InterruptAction::AwaitSecretPrompt;
    }
    if token.active_children() == 0 {
        return InterruptAction::Exit;
    }
    if token.wait_for_children(grace) {
        InterruptAction::Unwind
    } else {
        InterruptAction::Exit
    }
}

#[cfg(unix)]
pub(crate) fn install_interrupt_handler(
    token: CancelToken,
    on_exit: impl Fn(&CancelToken) + Send + 'static,
) -> anyhow::Result<()> {
    use crate::app::constants::{CHILD_GRACE_SECS, SECRET_PROMPT_CANCEL_HINT};
    use anyhow::Context;
    use signal_hook::consts::SIGINT;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT]).context("register SIGINT handler")?;
    std::thread::spawn(move || {
        for _ in signals.forever() {
            match interrupt_action(&token, Duration::from_secs(CHILD_GRACE_SECS)) {
                InterruptAction::Exit => on_exit(&token),
                InterruptAction::Unwind => {}
                InterruptAction::AwaitSecretPrompt => {
                    eprintln!();
                    eprintln!("{SECRET_PROMPT_CANCEL_HINT}");
                }
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn install_interrupt_handler(
    _token: CancelToken,
    _on_exit: impl Fn(&CancelToken) + Send + 'static,
) -> anyhow::Result<()> {
    Ok(())
}
