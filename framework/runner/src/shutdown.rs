use breeze_core::prelude::ShutdownHandle;
use tokio::signal;

/// Send the shutdown signal on Ctrl-C so that virtual users finish their current iteration and
/// the final report is still produced.
pub(crate) fn start_shutdown_listener(runtime: &tokio::runtime::Runtime, handle: ShutdownHandle) {
    let mut listener = handle.new_listener();
    runtime.spawn(async move {
        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        println!("Received shutdown signal, finishing current iterations...");
                        handle.shutdown();
                    }
                    Err(e) => log::warn!("Failed to listen for Ctrl-C: {e:?}"),
                }
            }
            _ = listener.wait_for_shutdown() => {}
        }
    });
}
