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

//! Per-zone counters, readable from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time copy of a zone's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneStatsSnapshot {
    /// Snapshots promoted to the committed slot.
    pub commits: u64,
    /// Snapshots discarded because they failed validation or upload.
    pub rejections: u64,
    /// Device buffers created by commits.
    pub buffer_uploads: u64,
    /// Draw calls recorded by `draw`.
    pub draw_calls: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ZoneStats {
    commits: AtomicU64,
    rejections: AtomicU64,
    buffer_uploads: AtomicU64,
    draw_calls: AtomicU64,
}

impl ZoneStats {
    pub fn record_commit(&self, buffers: usize) {
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.buffer_uploads
            .fetch_add(buffers as u64, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_draw_calls(&self, calls: u32) {
        self.draw_calls.fetch_add(u64::from(calls), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ZoneStatsSnapshot {
        ZoneStatsSnapshot {
            commits: self.commits.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            buffer_uploads: self.buffer_uploads.load(Ordering::Relaxed),
            draw_calls: self.draw_calls.load(Ordering::Relaxed),
        }
    }
}
