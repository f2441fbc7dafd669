use indicatif::{ProgressBar, ProgressStyle};

use crate::logging::{set_boxed_messenger, Messenger};

use std::io::Result;
use std::sync::Mutex;

/// Console messenger: plain lines for messages, an indicatif bar for the
/// percent progress. Messages arriving while a bar is active are printed
/// above it so the bar is not clobbered.
pub struct ConsoleMessenger {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleMessenger {
    pub fn new() -> ConsoleMessenger {
        ConsoleMessenger {
            bar: Mutex::new(None),
        }
    }
}

impl Messenger for ConsoleMessenger {
    fn message(&self, message: &str) {
        match self.bar.lock().unwrap().as_ref() {
            Some(pb) => {
                pb.println(message);
            }
            None => {
                println!("{}", message);
            }
        }
    }

    fn start_progress_percent(&self, message: &str) {
        let pb = ProgressBar::new(1000);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:100.cyan/blue}] {percent:>4}% ({eta_precise}) {msg}")
                .progress_chars("#>-"),
        );
        pb.set_message(message);
        self.bar.lock().unwrap().replace(pb);
    }

    fn progress_percent(&self, percent: f64) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_position((percent * 10.0) as u64);
        }
    }

    fn finish_progress_percent(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish();
        }
    }
}

pub fn register_messenger_default() -> Result<()> {
    set_boxed_messenger(Box::new(ConsoleMessenger::new()))
}
