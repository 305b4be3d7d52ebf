use std::cmp::min;
use std::fmt::Write;
use std::time::{Duration, Instant};

use breeze_core::prelude::DelegatedShutdownListener;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// Displays a progress bar while a time bounded run is in progress to show the user how long is
/// left.
pub(crate) fn start_progress(planned_runtime: Duration, shutdown_listener: DelegatedShutdownListener) {
    let style = match ProgressStyle::with_template(
        "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
    ) {
        Ok(style) => style,
        Err(e) => {
            log::warn!("Not showing progress: {e}");
            return;
        }
    };

    let planned = format_hms(planned_runtime);
    let style = style
        .with_key(
            "planned_runtime",
            move |_state: &ProgressState, w: &mut dyn Write| {
                let _ = w.write_str(&planned);
            },
        )
        .progress_chars("#>-");

    let spawned = std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_runtime.as_secs());
            pb.set_style(style);

            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                let new = min(start_time.elapsed().as_secs(), planned_runtime.as_secs());
                pb.set_position(new);
                std::thread::sleep(Duration::from_millis(250));
            }
        });

    if let Err(e) = spawned {
        log::warn!("Failed to start progress thread: {e}");
    }
}

fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
