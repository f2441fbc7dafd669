use crate::callback::CollectResult;

use std::fmt;

fn as_secs(dur: std::time::Duration) -> f64 {
    (dur.as_secs() as f64) * 1.0 + (dur.subsec_nanos() as f64) * 0.000000001
}

pub struct Timer(std::time::SystemTime);

impl Timer {
    pub fn new() -> Timer {
        Timer(std::time::SystemTime::now())
    }

    pub fn since(&self) -> f64 {
        as_secs(self.0.elapsed().unwrap())
    }

    pub fn reset(&mut self) {
        self.0 = std::time::SystemTime::now();
    }
}

pub struct LogTimes {
    pub timer: Timer,
    pub msgs: Vec<(String, f64)>,
    pub longest: usize,
}
impl LogTimes {
    pub fn new() -> LogTimes {
        LogTimes {
            timer: Timer::new(),
            msgs: Vec::new(),
            longest: 6,
        }
    }
    pub fn add(&mut self, msg: &str) {
        self.longest = usize::max(self.longest, msg.len());
        self.msgs.push((String::from(msg), self.timer.since()));
        self.timer.reset();
    }
}
impl fmt::Display for LogTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tot = 0.0;
        for (a, b) in &self.msgs {
            write!(
                f,
                "{}:{}{:6.2}s\n",
                a,
                " ".repeat(self.longest - a.len()),
                b
            )?;
            tot += b;
        }
        write!(f, "TOTAL:{}{:6.2}s", " ".repeat(self.longest - 5), tot)
    }
}

pub struct ThreadTimer(cpu_time::ThreadTime);

impl ThreadTimer {
    pub fn new() -> ThreadTimer {
        ThreadTimer(cpu_time::ThreadTime::now())
    }

    pub fn since(&self) -> f64 {
        as_secs(self.0.elapsed())
    }
}

/// Rate limits periodic reporting: `checktime` answers only once the
/// threshold has passed since the last answer.
pub struct Checktime {
    st: Timer,
    lt: Timer,
    thres: f64,
}

impl Checktime {
    pub fn new() -> Checktime {
        Self::with_threshold(2.0)
    }
    pub fn with_threshold(thres: f64) -> Checktime {
        Checktime {
            st: Timer::new(),
            lt: Timer::new(),
            thres: thres,
        }
    }

    pub fn checktime(&mut self) -> Option<f64> {
        if self.lt.since() > self.thres {
            self.lt.reset();
            return Some(self.st.since());
        }
        None
    }
    pub fn gettime(&self) -> f64 {
        self.st.since()
    }
}

/// Result of a pipeline run: named cpu timings plus whatever other data the
/// stages want to hand back, merged stage by stage.
pub struct Timings<O> {
    pub timings: Vec<(String, f64)>,
    pub others: Vec<(String, O)>,
}

impl<O> Timings<O> {
    pub fn new() -> Timings<O> {
        Timings {
            timings: Vec::new(),
            others: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, tm: f64) {
        self.timings.push((String::from(name), tm));
    }

    pub fn add_other(&mut self, name: &str, other: O) {
        self.others.push((String::from(name), other));
    }

    pub fn combine(&mut self, mut other: Timings<O>) {
        self.timings.extend(std::mem::take(&mut other.timings));
        self.others.extend(std::mem::take(&mut other.others));
    }
}

impl<O> fmt::Display for Timings<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timings:")?;
        for (name, tm) in &self.timings {
            write!(f, "\n  {}: {:0.1}s", name, tm)?;
        }
        Ok(())
    }
}

pub struct MergeTimings<O> {
    _marker: std::marker::PhantomData<O>,
}

impl<O> MergeTimings<O> {
    pub fn new() -> MergeTimings<O> {
        MergeTimings {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<O> CollectResult for MergeTimings<O>
where
    O: Sync + Send + 'static,
{
    type InType = Timings<O>;
    type OutType = Timings<O>;
    fn collect(&self, vals: Vec<Timings<O>>) -> Timings<O> {
        let mut res = Timings::new();
        for v in vals {
            res.combine(v);
        }
        res
    }
}
