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

//! The per-zone orchestrator tying staging, commit and draw together.

use super::commit::{self, CommitSummary};
use super::draw::{self, ZoneDrawConfig};
use super::geometry::{CommittedGeometry, StagedGeometry, ZoneData};
use super::stats::{ZoneStats, ZoneStatsSnapshot};
use crate::error::CommitError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use strata_core::culling::FrustumTest;
use strata_core::math::{Aabb, Vec3};
use strata_core::renderer::{GraphicsDevice, RenderPass};

/// The lifecycle state of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneState {
    /// Nothing has been staged or committed.
    Empty,
    /// A snapshot is staged and waiting for the next commit.
    Staged,
    /// The last commit was rejected and no earlier commit exists.
    CommittedInvalid,
    /// Device geometry is committed. It may still wait on its textures.
    CommittedValid,
    /// `clean` has run. The zone accepts no further data.
    Destroyed,
}

/// The result of [`ZoneRenderer::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// No snapshot was staged. Nothing was done.
    NothingStaged,
    /// The staged snapshot is now the committed one.
    Committed {
        /// The generation that was committed.
        generation: u64,
    },
    /// The staged snapshot was discarded. The previous commit, if any, is
    /// still the drawable one.
    Rejected(CommitError),
}

/// The result of [`ZoneRenderer::draw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// The zone is not ready. No draw call was recorded.
    NotReady,
    /// The zone's bounds are outside the frustum.
    Culled,
    /// Draw calls were recorded.
    Drawn {
        /// How many.
        draw_calls: u32,
    },
}

#[derive(Debug, Default)]
struct CommittedSlot {
    geometry: Option<CommittedGeometry>,
    last_rejected: bool,
}

/// The render state of one streamable terrain zone.
///
/// A producer thread calls [`set_data`](Self::set_data) whenever it has new
/// geometry. The render thread calls [`draw`](Self::draw) every frame, which
/// commits the latest staged snapshot at most once and only records draw
/// calls against fully committed geometry whose textures are ready.
///
/// The staging lock is only held for field reassignment and reference
/// bookkeeping. Validation and device uploads run under the committed-slot
/// lock, so a slow upload never blocks a producer.
#[derive(Debug)]
pub struct ZoneRenderer {
    zone_id: u64,
    world_position: Vec3,
    staged: Mutex<Option<StagedGeometry>>,
    committed: Mutex<CommittedSlot>,
    next_generation: AtomicU64,
    committing: AtomicBool,
    destroyed: AtomicBool,
    stats: ZoneStats,
}

impl ZoneRenderer {
    /// Creates an empty zone. Vertex positions are relative to `world_position`.
    pub fn new(zone_id: u64, world_position: Vec3) -> Self {
        Self {
            zone_id,
            world_position,
            staged: Mutex::new(None),
            committed: Mutex::new(CommittedSlot::default()),
            next_generation: AtomicU64::new(1),
            committing: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            stats: ZoneStats::default(),
        }
    }

    /// The zone's identifier.
    pub fn zone_id(&self) -> u64 {
        self.zone_id
    }

    /// The world-space origin of the zone's vertices.
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Stages new data for the next commit and returns its generation.
    ///
    /// Safe to call from any thread at any time, including while the render
    /// thread is drawing or committing. Fields left as `None` in `data` keep
    /// their staged value. Staged snapshots that are superseded before a
    /// commit never reach the device; their resource references are released
    /// here.
    ///
    /// After [`clean`](Self::clean) the data is dropped and `None` is returned.
    pub fn set_data(&self, data: ZoneData) -> Option<u64> {
        let mut staged = self.lock_staged();
        if self.destroyed.load(Ordering::Acquire) {
            log::warn!("Zone {}: set_data after clean, data dropped", self.zone_id);
            return None;
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        staged
            .get_or_insert_with(StagedGeometry::default)
            .apply(data, generation);
        log::trace!("Zone {}: staged generation {generation}", self.zone_id);
        Some(generation)
    }

    /// Commits the staged snapshot, if there is one.
    ///
    /// A rejected snapshot is discarded in full and the previously committed
    /// geometry stays drawable. Calling this again without a new
    /// [`set_data`](Self::set_data) does nothing.
    ///
    /// # Panics
    ///
    /// Panics if a commit is already in progress on this zone.
    pub fn update(&self, device: &dyn GraphicsDevice) -> CommitOutcome {
        let _commit = CommitGuard::enter(&self.committing, self.zone_id);

        let Some(staged) = self.lock_staged().take() else {
            return CommitOutcome::NothingStaged;
        };
        let generation = staged.generation;

        let mut slot = self.lock_committed();
        if self.destroyed.load(Ordering::Acquire) {
            return CommitOutcome::NothingStaged;
        }

        match commit::commit(&mut slot.geometry, staged, device) {
            Ok(CommitSummary {
                generation,
                buffers_uploaded,
                buffers_destroyed,
            }) => {
                slot.last_rejected = false;
                self.stats.record_commit(buffers_uploaded);
                log::debug!(
                    "Zone {}: committed generation {generation} ({buffers_uploaded} buffers uploaded, {buffers_destroyed} freed)",
                    self.zone_id
                );
                CommitOutcome::Committed { generation }
            }
            Err(e) => {
                slot.last_rejected = true;
                self.stats.record_rejection();
                match &e {
                    CommitError::Device(_) => log::error!(
                        "Zone {}: device failure committing generation {generation}: {e}",
                        self.zone_id
                    ),
                    _ => log::warn!(
                        "Zone {}: rejected generation {generation}: {e}",
                        self.zone_id
                    ),
                }
                CommitOutcome::Rejected(e)
            }
        }
    }

    /// Commits pending data, then records this zone's draw calls into `pass`.
    ///
    /// Nothing is recorded unless the zone [`is_ready`](Self::is_ready) and,
    /// with frustum culling enabled, its world bounds pass `frustum`.
    pub fn draw(
        &self,
        device: &dyn GraphicsDevice,
        pass: &mut dyn RenderPass,
        frustum: &dyn FrustumTest,
        config: &ZoneDrawConfig,
    ) -> DrawOutcome {
        self.update(device);

        let slot = self.lock_committed();
        let Some(geometry) = slot.geometry.as_ref() else {
            log::trace!("Zone {}: nothing committed", self.zone_id);
            return DrawOutcome::NotReady;
        };

        // Maps generated after the commit are uploaded on first use.
        for map in [&geometry.colormap, &geometry.lightmap].into_iter().flatten() {
            if let Err(e) = map.upload_to_device(device) {
                log::error!("Zone {}: failed to upload {:?}: {e}", self.zone_id, map.key());
                return DrawOutcome::NotReady;
            }
        }
        if !geometry.textures_ready() {
            log::trace!("Zone {}: waiting on textures", self.zone_id);
            return DrawOutcome::NotReady;
        }

        let bounds = geometry.local_bounds.translated(self.world_position);
        if config.settings.frustum_culling && !frustum.test_box(&bounds).is_visible() {
            log::trace!("Zone {}: culled", self.zone_id);
            return DrawOutcome::Culled;
        }

        let fade_blends = config
            .settings
            .blend_fade_distance
            .zip(frustum.eye_position())
            .is_some_and(|(distance, eye)| eye.distance(bounds.center()) > distance);

        let draw_calls = draw::record(geometry, pass, config, fade_blends);
        self.stats.record_draw_calls(draw_calls);
        DrawOutcome::Drawn { draw_calls }
    }

    /// Releases every resource reference and frees the committed device
    /// buffers. Further calls do nothing.
    pub fn clean(&self, device: &dyn GraphicsDevice) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let staged = self.lock_staged().take();
        let committed = self.lock_committed().geometry.take();

        drop(staged);
        if let Some(geometry) = committed {
            let freed = geometry.destroy_buffers(device);
            log::debug!(
                "Zone {}: cleaned generation {} ({freed} buffers freed)",
                self.zone_id,
                geometry.generation
            );
        }
    }

    /// Whether the zone has committed geometry and both its colormap and
    /// lightmap are generated.
    pub fn is_ready(&self) -> bool {
        self.lock_committed()
            .geometry
            .as_ref()
            .is_some_and(CommittedGeometry::textures_ready)
    }

    /// Always `true`. Visibility policy belongs to the caller.
    pub fn is_visible(&self) -> bool {
        true
    }

    /// Whether a staged snapshot is waiting for a commit.
    pub fn needs_commit(&self) -> bool {
        self.lock_staged().is_some()
    }

    /// The zone's current lifecycle state.
    pub fn state(&self) -> ZoneState {
        if self.destroyed.load(Ordering::Acquire) {
            return ZoneState::Destroyed;
        }
        if self.needs_commit() {
            return ZoneState::Staged;
        }
        let slot = self.lock_committed();
        match (&slot.geometry, slot.last_rejected) {
            (Some(_), _) => ZoneState::CommittedValid,
            (None, true) => ZoneState::CommittedInvalid,
            (None, false) => ZoneState::Empty,
        }
    }

    /// The generation of the drawable geometry, if any.
    pub fn committed_generation(&self) -> Option<u64> {
        self.lock_committed().geometry.as_ref().map(|g| g.generation)
    }

    /// The world-space bounds of the committed geometry.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.lock_committed()
            .geometry
            .as_ref()
            .map(|g| g.local_bounds.translated(self.world_position))
    }

    /// A copy of this zone's counters.
    pub fn stats(&self) -> ZoneStatsSnapshot {
        self.stats.snapshot()
    }

    fn lock_staged(&self) -> MutexGuard<'_, Option<StagedGeometry>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_committed(&self) -> MutexGuard<'_, CommittedSlot> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ZoneRenderer {
    fn drop(&mut self) {
        let slot = self
            .committed
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.geometry.is_some() {
            log::warn!(
                "Zone {} dropped without clean(); its device buffers were not freed",
                self.zone_id
            );
        }
    }
}

/// Marks a commit in progress for as long as it lives.
struct CommitGuard<'a>(&'a AtomicBool);

impl<'a> CommitGuard<'a> {
    fn enter(flag: &'a AtomicBool, zone_id: u64) -> Self {
        if flag.swap(true, Ordering::AcqRel) {
            panic!("zone {zone_id}: commit re-entered while another commit is in progress");
        }
        Self(flag)
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
