use std::io::{Error, ErrorKind, Result};
use std::sync::mpsc;
use std::thread;

/// A pipeline stage: accepts values one at a time, produces a result when
/// the input is exhausted. Stages own the next stage and forward to it, so
/// a pipeline is built back to front.
pub trait CallFinish: Sync + Send + 'static {
    type CallType;
    type ReturnType;
    fn call(&mut self, c: Self::CallType);
    fn finish(&mut self) -> Result<Self::ReturnType>;
}

const CHANNEL_BUFFER: usize = 1;

fn call_all<T: Send + 'static, U: Send + 'static>(
    recv: mpsc::Receiver<T>,
    mut cf: Box<impl CallFinish<CallType = T, ReturnType = U>>,
) -> Result<U> {
    for c in recv.iter() {
        cf.call(c);
    }
    cf.finish()
}

/// Runs the wrapped stage on its own thread, fed through a bounded channel.
/// Dropping the sender at finish lets the thread drain and return.
pub struct Callback<T, U> {
    send: Option<mpsc::SyncSender<T>>,
    result: Option<thread::JoinHandle<Result<U>>>,
}

impl<T, U> Callback<T, U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    pub fn new(cf: Box<impl CallFinish<CallType = T, ReturnType = U>>) -> Callback<T, U> {
        let (send, recv) = mpsc::sync_channel(CHANNEL_BUFFER);
        let result = thread::spawn(move || call_all(recv, cf));
        Callback {
            send: Some(send),
            result: Some(result),
        }
    }
}

impl<T, U> CallFinish for Callback<T, U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    type CallType = T;
    type ReturnType = U;

    fn call(&mut self, c: T) {
        if let Some(s) = &self.send {
            s.send(c).expect("callback thread stopped");
        }
    }

    fn finish(&mut self) -> Result<U> {
        self.send = None;
        match self.result.take() {
            Some(r) => match r.join() {
                Ok(p) => p,
                Err(e) => Err(Error::new(
                    ErrorKind::Other,
                    format!("failed to join callback thread {:?}", e),
                )),
            },
            None => Err(Error::new(ErrorKind::Other, "finish called twice")),
        }
    }
}

/// Combines the results of several parallel stages.
pub trait CollectResult: Sync + Send + 'static {
    type InType;
    type OutType;
    fn collect(&self, vals: Vec<Self::InType>) -> Self::OutType;
}

/// Dispatches calls round robin over a set of stages, then collects their
/// results with a `CollectResult` once every stage has finished.
pub struct CallbackMerge<T, U, V> {
    callbacks: Vec<Box<dyn CallFinish<CallType = T, ReturnType = U>>>,
    collect: Box<dyn CollectResult<InType = U, OutType = V>>,
    idx: usize,
}

impl<T, U, V> CallbackMerge<T, U, V>
where
    T: Send + 'static,
    U: Send + 'static,
    V: Send + 'static,
{
    pub fn new(
        callbacks: Vec<Box<dyn CallFinish<CallType = T, ReturnType = U>>>,
        collect: Box<dyn CollectResult<InType = U, OutType = V>>,
    ) -> CallbackMerge<T, U, V> {
        CallbackMerge {
            callbacks,
            collect,
            idx: 0,
        }
    }
}

impl<T, U, V> CallFinish for CallbackMerge<T, U, V>
where
    T: Send + 'static,
    U: Send + 'static,
    V: Send + 'static,
{
    type CallType = T;
    type ReturnType = V;

    fn call(&mut self, c: T) {
        let l = self.callbacks.len();
        self.callbacks[self.idx % l].call(c);
        self.idx += 1;
    }

    fn finish(&mut self) -> Result<V> {
        let mut res = Vec::new();
        let mut err: Option<Error> = None;
        for cb in self.callbacks.iter_mut() {
            match cb.finish() {
                Ok(r) => {
                    res.push(r);
                }
                Err(e) => {
                    err = Some(e);
                }
            }
        }
        match err {
            Some(e) => Err(e),
            None => Ok(self.collect.collect(res)),
        }
    }
}
