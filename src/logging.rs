use std::io::{Error, ErrorKind, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Sink for user facing messages and progress reporting. The library only
/// talks to this trait; binaries install a concrete implementation once at
/// startup (see `defaultlogger`). When nothing is installed messages are
/// dropped, so library code can report unconditionally.
pub trait Messenger: Sync + Send {
    fn message(&self, message: &str);

    fn start_progress_percent(&self, message: &str);
    fn progress_percent(&self, percent: f64);
    fn finish_progress_percent(&self);
}

struct NopMessenger;
impl Messenger for NopMessenger {
    fn message(&self, _message: &str) {}

    fn start_progress_percent(&self, _message: &str) {}
    fn progress_percent(&self, _percent: f64) {}
    fn finish_progress_percent(&self) {}
}

static mut MESSENGER: &dyn Messenger = &NopMessenger;
static STATE: AtomicUsize = AtomicUsize::new(0);

pub fn set_messenger(messenger: &'static dyn Messenger) -> Result<()> {
    set_messenger_inner(|| messenger)
}

pub fn set_boxed_messenger(messenger: Box<dyn Messenger>) -> Result<()> {
    set_messenger_inner(|| Box::leak(messenger))
}

fn set_messenger_inner<F>(make: F) -> Result<()>
where
    F: FnOnce() -> &'static dyn Messenger,
{
    let old_state =
        match STATE.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(s) | Err(s) => s,
        };
    match old_state {
        0 => {
            unsafe {
                MESSENGER = make();
            }
            STATE.store(2, Ordering::SeqCst);
            Ok(())
        }
        1 => {
            while STATE.load(Ordering::SeqCst) == 1 {
                std::hint::spin_loop();
            }
            Err(Error::new(ErrorKind::Other, "messenger already being set"))
        }
        _ => Err(Error::new(ErrorKind::Other, "messenger already set")),
    }
}

pub fn messenger() -> &'static dyn Messenger {
    if STATE.load(Ordering::SeqCst) != 2 {
        static NOP: NopMessenger = NopMessenger;
        &NOP
    } else {
        unsafe { MESSENGER }
    }
}

#[macro_export]
macro_rules! message {
    ($($arg:tt)*) => {
        $crate::logging::messenger().message(&format!($($arg)*))
    };
}
