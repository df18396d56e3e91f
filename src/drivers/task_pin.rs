//! Core-pinned thread spawning.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a CPU core with explicit priority and stack
//! size.  The configuration applies to the *next* `pthread_create()` from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation.  On non-ESP targets, falls back to a plain
//! thread.

use std::io;
use std::thread::JoinHandle;

use crate::config::TaskConfig;

#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    task: TaskConfig,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: `cfg` outlives the call; `name` is 'static and NUL-terminated.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_pthread_get_default_config();
        cfg.pin_to_core = task.core as _;
        cfg.prio = task.priority as _;
        cfg.stack_size = (task.stack_kb * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on core {} (pri={}, stack={}KB)",
        display_name,
        task.core,
        task.priority,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(task.stack_kb * 1024)
        .spawn(f)
}

/// Host threads need more headroom than FreeRTOS tasks.
#[cfg(not(target_os = "espidf"))]
const HOST_MIN_STACK: usize = 256 * 1024;

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    task: TaskConfig,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        task.stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size((task.stack_kb * 1024).max(HOST_MIN_STACK))
        .spawn(f)
}
