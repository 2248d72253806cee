use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::error;

use crate::remuneraciones::tools::error::Result;
use crate::remuneraciones::tools::pipeline::Progress;

/// Notification sent from a pipeline thread to whoever drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress { percent: u8, message: String },
    /// Terminal: the run wrote this output file.
    Finished(PathBuf),
    /// Terminal: the run failed with this user-facing message.
    Failed(String),
}

/// Runs `job` on its own thread. The job receives a progress callback;
/// after it returns or panics exactly one terminal event is sent and the
/// channel closes.
pub fn spawn<F>(output: PathBuf, job: F) -> (JoinHandle<()>, Receiver<WorkerEvent>)
where
    F: FnOnce(&mut Progress<'_>) -> Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<WorkerEvent>();
    let handle = thread::spawn(move || {
        let progress_tx: Sender<WorkerEvent> = tx.clone();
        let mut report = move |percent: u8, message: &str| {
            let _ = progress_tx.send(WorkerEvent::Progress {
                percent,
                message: message.to_string(),
            });
        };
        let terminal = match panic::catch_unwind(AssertUnwindSafe(|| job(&mut report))) {
            Ok(Ok(())) => WorkerEvent::Finished(output),
            Ok(Err(err)) => WorkerEvent::Failed(err.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "worker job panicked");
                WorkerEvent::Failed(format!("internal error: {message}"))
            }
        };
        let _ = tx.send(terminal);
    });
    (handle, rx)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
