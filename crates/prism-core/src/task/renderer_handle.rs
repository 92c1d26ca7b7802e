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

//! The shared renderer handle.
//!
//! Loading work starts long before the device exists. [`renderer_promise`]
//! returns a producer/consumer pair: the single [`RendererPromise`] is resolved
//! once device creation finishes, and every clone of the
//! [`SharedRendererHandle`] then observes the same `Arc` without copying the
//! renderer.

use crate::error::SceneError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Why waiting on the renderer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererWaitError {
    /// The promise was dropped without being resolved.
    Unavailable,
    /// The renderer did not arrive within the given deadline.
    DeadlineElapsed(Duration),
}

impl fmt::Display for RendererWaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererWaitError::Unavailable => write!(f, "renderer promise dropped unresolved"),
            RendererWaitError::DeadlineElapsed(deadline) => {
                write!(f, "renderer not ready after {deadline:?}")
            }
        }
    }
}

impl std::error::Error for RendererWaitError {}

impl From<RendererWaitError> for SceneError {
    fn from(err: RendererWaitError) -> Self {
        match err {
            RendererWaitError::Unavailable => SceneError::RendererUnavailable,
            RendererWaitError::DeadlineElapsed(deadline) => SceneError::StartupDeadline { deadline },
        }
    }
}

/// The producing half. Consumed by [`resolve`](Self::resolve), so a renderer is
/// published at most once.
pub struct RendererPromise<R: ?Sized> {
    sender: watch::Sender<Option<Arc<R>>>,
}

/// The consuming half. Cheap to clone; every clone sees the same renderer.
pub struct SharedRendererHandle<R: ?Sized> {
    receiver: watch::Receiver<Option<Arc<R>>>,
}

/// Creates a linked promise/handle pair.
pub fn renderer_promise<R: ?Sized>() -> (RendererPromise<R>, SharedRendererHandle<R>) {
    let (sender, receiver) = watch::channel(None);
    (RendererPromise { sender }, SharedRendererHandle { receiver })
}

impl<R: ?Sized> RendererPromise<R> {
    /// Publishes the renderer to every current and future waiter.
    pub fn resolve(self, renderer: Arc<R>) {
        self.sender.send_replace(Some(renderer));
    }
}

impl<R: ?Sized> Clone for SharedRendererHandle<R> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for SharedRendererHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRendererHandle")
            .field("resolved", &self.receiver.borrow().is_some())
            .finish()
    }
}

impl<R: ?Sized> SharedRendererHandle<R> {
    /// Returns the renderer if it has already been published.
    pub fn try_get(&self) -> Option<Arc<R>> {
        self.receiver.borrow().clone()
    }

    /// Suspends until the renderer is published.
    ///
    /// # Errors
    /// [`RendererWaitError::Unavailable`] if the promise is dropped unresolved.
    pub async fn get(&self) -> Result<Arc<R>, RendererWaitError> {
        let mut receiver = self.receiver.clone();
        let published = receiver
            .wait_for(Option::is_some)
            .await
            .map_err(|_| RendererWaitError::Unavailable)?;
        let renderer = Option::clone(&published);
        drop(published);
        renderer.ok_or(RendererWaitError::Unavailable)
    }

    /// Like [`get`](Self::get), but gives up after `deadline`.
    pub async fn get_within(&self, deadline: Duration) -> Result<Arc<R>, RendererWaitError> {
        tokio::time::timeout(deadline, self.get())
            .await
            .map_err(|_| RendererWaitError::DeadlineElapsed(deadline))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Device(u32);

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn all_waiters_receive_the_same_renderer() {
        let (promise, handle) = renderer_promise::<Device>();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.get().await })
            })
            .collect();

        assert!(handle.try_get().is_none());
        let device = Arc::new(Device(7));
        promise.resolve(Arc::clone(&device));

        for waiter in waiters {
            let received = waiter.await.unwrap().unwrap();
            assert!(Arc::ptr_eq(&received, &device));
            assert_eq!(received.0, 7);
        }
        // Late consumers still see it after the promise is gone.
        assert!(Arc::ptr_eq(&handle.get().await.unwrap(), &device));
    }

    #[tokio::test]
    async fn dropped_promise_reports_unavailable() {
        let (promise, handle) = renderer_promise::<Device>();
        drop(promise);
        assert_eq!(handle.get().await.unwrap_err(), RendererWaitError::Unavailable);
    }

    #[tokio::test]
    async fn deadline_elapses_when_never_resolved() {
        let (_promise, handle) = renderer_promise::<Device>();
        let deadline = Duration::from_millis(20);
        let err = handle.get_within(deadline).await.unwrap_err();
        assert_eq!(err, RendererWaitError::DeadlineElapsed(deadline));
        assert!(matches!(
            SceneError::from(err),
            SceneError::StartupDeadline { .. }
        ));
    }

    #[tokio::test]
    async fn works_with_trait_objects() {
        trait Named: Send + Sync {
            fn name(&self) -> &str;
        }
        struct Headless;
        impl Named for Headless {
            fn name(&self) -> &str {
                "headless"
            }
        }

        let (promise, handle) = renderer_promise::<dyn Named>();
        promise.resolve(Arc::new(Headless));
        assert_eq!(handle.get().await.unwrap().name(), "headless");
    }
}
