use breeze_core::prelude::DelegatedShutdownListener;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// CPU share of the whole machine above which the load generator itself may be skewing latency.
const HIGH_CPU_USAGE_PERCENT: f32 = 80.0;

/// Monitor the resource usage of the load generator process and report high usage.
///
/// Note that this won't stop the run, it will just log a warning to let the user know that
/// latencies may be inflated because the generator is saturating the machine rather than the
/// target being slow.
///
/// The CPU usage for the process is collected every [sysinfo::MINIMUM_CPU_UPDATE_INTERVAL] and
/// checked against [HIGH_CPU_USAGE_PERCENT] with respect to the number of cores.
pub(crate) fn start_monitor(shutdown_listener: DelegatedShutdownListener) {
    let spawned = std::thread::Builder::new()
        .name("monitor".to_string())
        .spawn(move || {
            let this_process_pid = Pid::from_u32(std::process::id());
            let mut sys = System::new();

            sys.refresh_cpu_all();
            let cpu_count = sys.cpus().len().max(1);

            loop {
                if shutdown_listener.should_shutdown() {
                    break;
                }

                sys.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[this_process_pid]),
                    true,
                    ProcessRefreshKind::nothing().with_cpu(),
                );

                if let Some(process) = sys.process(this_process_pid) {
                    let usage = machine_share(process.cpu_usage(), cpu_count);
                    if usage > HIGH_CPU_USAGE_PERCENT {
                        log::warn!(
                            "High CPU usage detected. The load generator is using {:.2}% of the CPU, with {} available cores",
                            usage,
                            cpu_count
                        );
                    }
                }

                std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            }
        });

    if let Err(e) = spawned {
        log::warn!("Failed to start monitor thread: {e}");
    }
}

/// sysinfo reports process usage as a percentage of one core.
fn machine_share(process_usage: f32, cpu_count: usize) -> f32 {
    process_usage / cpu_count as f32
}
