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

//! Getting staged bytes onto the device.
//!
//! [`TransferSubmitter`] is the thin job/submit wrapper for one queue kind.
//! [`UploadBatch`] sits on top of it: a build task sizes everything it has to
//! upload, reserves a single staging range for it, packs its payloads in and
//! submits one job.

mod batch;
mod submitter;

pub use self::batch::{staged_buffer_size, staged_texture_size, UploadBatch};
pub use self::submitter::TransferSubmitter;
