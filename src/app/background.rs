//! Background task handling
//!
//! Jobs run on the tokio runtime; their single result comes back as a
//! [`BackgroundMessage`] and is applied on the event loop by
//! [`drain_messages`]. Channel sends use `let _ =`: a dropped receiver means
//! the app is shutting down and nobody is listening.

use crate::app::messages::BackgroundMessage;
use crate::job::{supervisor, Launch};
use crate::ui::{App, ToastKind};
use crate::util::truncate;
use chrono::Local;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use tracing::{debug, error};

pub fn drain_messages(app: &mut App, rx: &mpsc::Receiver<BackgroundMessage>) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            BackgroundMessage::JobCompleted(event) => {
                // Stale events (dismissed or replaced jobs) are logged by the board.
                if app.board.complete(event, &mut app.host).is_ok() {
                    app.scroll = 0;
                }
            }
            BackgroundMessage::Error(e) => {
                error!(error = %e, "background task failed");
                app.show_toast(&truncate(&e, 80), ToastKind::Error);
            }
        }
    }
}

/// Trigger a job for the app's selection and hand it to the runtime.
pub fn start_job(app: &mut App, tx: mpsc::Sender<BackgroundMessage>) {
    match app.board.trigger(&app.selection, Local::now(), &mut app.host) {
        Ok(launch) => {
            app.target = Some(launch.target.clone());
            app.scroll = 0;
            app.search_input.clear();
            spawn_job(tx, launch);
        }
        Err(e) => debug!(error = %e, "trigger refused"),
    }
}

/// Run a launched job in the background and report its completion.
pub fn spawn_job(tx: mpsc::Sender<BackgroundMessage>, launch: Launch) {
    let done = tx.clone();
    spawn_background(tx, "archive_job", async move {
        let event = supervisor::run(launch.job_id, launch.command).await;
        let _ = done.send(BackgroundMessage::JobCompleted(event));
    });
}

pub fn spawn_background<F>(tx: mpsc::Sender<BackgroundMessage>, task_name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            let _ = tx.send(BackgroundMessage::Error(format!(
                "Background task '{}' crashed unexpectedly: {}",
                task_name, detail
            )));
        }
    });
}
