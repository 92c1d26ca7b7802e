// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The two execution contexts used by every task in the pipeline.

use std::future::Future;
use std::io;
use std::thread::JoinHandle;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

/// Configuration of the [`TaskSystem`].
#[derive(Debug, Clone)]
pub struct TaskSystemConfig {
    /// Number of pool workers. `None` uses one per available core.
    pub worker_threads: Option<usize>,
    /// Prefix of every thread name.
    pub thread_name: String,
}

impl Default for TaskSystemConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "prism".to_string(),
        }
    }
}

/// Owns a multi-threaded worker pool for CPU/disk work and a single dedicated
/// thread for work with device or window affinity.
///
/// Both contexts are driven by tokio; callers spawn onto them through the
/// [`Handle`]s returned by [`thread_pool_exec`](Self::thread_pool_exec) and
/// [`thread_exec`](Self::thread_exec). Must be dropped outside of any async context.
pub struct TaskSystem {
    pool: Runtime,
    dedicated: DedicatedContext,
}

impl TaskSystem {
    /// Starts the worker pool and the dedicated thread.
    ///
    /// # Errors
    /// Returns the OS error if a runtime or thread cannot be created. Nothing in
    /// the pipeline can run without them, so callers treat this as fatal.
    pub fn new(config: &TaskSystemConfig) -> io::Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder
            .thread_name(format!("{}-pool", config.thread_name))
            .enable_time();
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers.max(1));
        }
        let pool = builder.build()?;
        let dedicated = DedicatedContext::spawn(&config.thread_name)?;
        log::info!(
            "TaskSystem: started pool ({} workers) and dedicated context",
            config
                .worker_threads
                .map_or_else(|| "auto".to_string(), |n| n.max(1).to_string())
        );
        Ok(Self { pool, dedicated })
    }

    /// The single dedicated context, for anything with device/window affinity.
    pub fn thread_exec(&self) -> &Handle {
        &self.dedicated.handle
    }

    /// The worker pool, for general CPU and disk work.
    pub fn thread_pool_exec(&self) -> &Handle {
        self.pool.handle()
    }

    /// Drives `future` to completion from the calling (non-async) thread, with
    /// the pool available to anything it spawns.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.pool.block_on(future)
    }
}

struct DedicatedContext {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DedicatedContext {
    fn spawn(name: &str) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        let handle = runtime.handle().clone();
        let (shutdown, signal) = oneshot::channel::<()>();
        let thread = std::thread::Builder::new()
            .name(format!("{name}-dedicated"))
            .spawn(move || {
                runtime.block_on(async {
                    let _ = signal.await;
                });
            })?;
        Ok(Self {
            handle,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }
}

impl Drop for DedicatedContext {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("TaskSystem: dedicated thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> TaskSystem {
        TaskSystem::new(&TaskSystemConfig {
            worker_threads: Some(2),
            thread_name: "test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn dedicated_context_runs_on_one_named_thread() {
        let tasks = system();
        let names = tasks.block_on(async {
            let mut names = Vec::new();
            for _ in 0..4 {
                let name = tasks
                    .thread_exec()
                    .spawn(async { std::thread::current().name().map(str::to_string) })
                    .await
                    .unwrap();
                names.push(name);
            }
            names
        });
        assert!(names
            .iter()
            .all(|n| n.as_deref() == Some("test-dedicated")));
    }

    #[test]
    fn pool_runs_work_off_the_dedicated_thread() {
        let tasks = system();
        let name = tasks.block_on(async {
            tasks
                .thread_pool_exec()
                .spawn(async { std::thread::current().name().map(str::to_string) })
                .await
                .unwrap()
        });
        assert_eq!(name.as_deref(), Some("test-pool"));
    }

    #[test]
    fn contexts_can_hand_results_to_each_other() {
        let tasks = system();
        let dedicated = tasks.thread_exec().clone();
        let sum = tasks.block_on(async move {
            let on_pool = tokio::spawn(async move {
                let partial = dedicated.spawn(async { 20 }).await.unwrap();
                partial + 22
            });
            on_pool.await.unwrap()
        });
        assert_eq!(sum, 42);
    }
}
