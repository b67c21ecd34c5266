mod common;

use common::*;
use strata_core::culling::Visibility;
use strata_core::math::{Aabb, Vec3};
use strata_core::renderer::{PolygonMode, PrimitiveTopology, TextureId};
use strata_terrain::zone::bindings;
use strata_terrain::{
    DrawOutcome, RenderingPart, SharedResource, TextureData, ZoneRenderer, ZoneState,
};

fn texture_of(resource: &dyn SharedResource) -> TextureId {
    resource.device_texture().expect("resource was uploaded")
}

#[test]
fn stream_commit_and_draw_a_zone() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let config = draw_config();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = pending_maps();
    zone.set_data(full_zone(100, &m, &colormap, &lightmap));

    // --- ACT & ASSERT: committed but waiting on textures ---
    zone.update(&device);
    assert_eq!(zone.state(), ZoneState::CommittedValid);
    assert_eq!(m.ref_count(), 1);
    assert!(!zone.is_ready());

    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &config);
    assert_eq!(outcome, DrawOutcome::NotReady);
    assert_eq!(pass.draw_calls(), 0);

    // --- ACT & ASSERT: textures arrive, but the zone is off screen ---
    colormap.mark_generated(TextureData::solid_rgba([0, 128, 0, 255]));
    lightmap.mark_generated(TextureData::solid_rgba([255, 255, 255, 255]));
    assert!(zone.is_ready());

    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::outside(), &config);
    assert_eq!(outcome, DrawOutcome::Culled);
    assert_eq!(pass.draw_calls(), 0);

    // --- ACT & ASSERT: on screen, one shaded call for the one part ---
    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &config);
    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 1 });
    assert_eq!(pass.draw_calls(), 1);
    assert_eq!(pass.indexed_ranges(), vec![0..300]);
    assert_eq!(pass.programs(), vec![SINGLE]);
    assert_eq!(zone.stats().draw_calls, 1);
}

#[test]
fn zone_that_is_not_ready_never_draws() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let config = draw_config();
    let empty = ZoneRenderer::new(1, Vec3::ZERO);
    let waiting = ZoneRenderer::new(2, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = pending_maps();
    colormap.mark_generated(TextureData::solid_rgba([0; 4]));
    waiting.set_data(full_zone(2, &m, &colormap, &lightmap));

    // --- ACT ---
    let mut pass = RecordingPass::new();
    for _ in 0..3 {
        assert_eq!(
            empty.draw(&device, &mut pass, &FixedFrustum::inside(), &config),
            DrawOutcome::NotReady
        );
        assert_eq!(
            waiting.draw(&device, &mut pass, &FixedFrustum::inside(), &config),
            DrawOutcome::NotReady
        );
    }

    // --- ASSERT ---
    assert!(pass.commands.is_empty());
    assert_eq!(waiting.state(), ZoneState::CommittedValid);
    assert_eq!(waiting.stats().draw_calls, 0);
}

#[test]
fn draw_commits_staged_data_first() {
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = generated_maps();
    zone.set_data(full_zone(1, &m, &colormap, &lightmap));

    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &draw_config());

    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 1 });
    assert_eq!(zone.committed_generation(), Some(1));
    assert!(!zone.needs_commit());
}

#[test]
fn parts_bind_their_materials_in_order() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let (grass, dirt, rock) = (material(1), material(2), material(3));
    let (colormap, lightmap) = generated_maps();
    zone.set_data(
        triangle_soup(2)
            .with_parts(vec![
                RenderingPart::single(0..3, grass.clone()),
                RenderingPart::blend(3..6, dirt.clone(), rock.clone()),
            ])
            .with_colormap(colormap.clone())
            .with_lightmap(lightmap.clone()),
    );

    // --- ACT ---
    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &draw_config());

    // --- ASSERT ---
    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 2 });
    assert_eq!(pass.programs(), vec![SINGLE, BLENDED]);
    assert_eq!(pass.indexed_ranges(), vec![0..3, 3..6]);

    let expected = [
        PassCommand::SetTexture(bindings::MATERIAL_TEXTURE_SLOTS[0], texture_of(&*grass)),
        PassCommand::SetUniformU32(bindings::MATERIAL_ID_UNIFORMS[0], grass.unique_id()),
        PassCommand::SetTexture(bindings::MATERIAL_TEXTURE_SLOTS[0], texture_of(&*dirt)),
        PassCommand::SetUniformU32(bindings::MATERIAL_ID_UNIFORMS[0], dirt.unique_id()),
        PassCommand::SetTexture(bindings::MATERIAL_TEXTURE_SLOTS[1], texture_of(&*rock)),
        PassCommand::SetUniformU32(bindings::MATERIAL_ID_UNIFORMS[1], rock.unique_id()),
        PassCommand::SetTexture(bindings::COLORMAP_TEXTURE_SLOT, texture_of(&*colormap)),
        PassCommand::SetTexture(bindings::LIGHTMAP_TEXTURE_SLOT, texture_of(&*lightmap)),
    ];
    for command in &expected {
        assert!(pass.contains(command), "missing {command:?}");
    }
    // The single-material part never touches the second slot.
    assert!(!pass.contains(&PassCommand::SetUniformU32(
        bindings::MATERIAL_ID_UNIFORMS[1],
        grass.unique_id()
    )));
}

#[test]
fn distant_blends_fall_back_to_their_primary_material() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let (dirt, rock) = (material(2), material(3));
    let (colormap, lightmap) = generated_maps();
    zone.set_data(
        triangle_soup(1)
            .with_parts(vec![RenderingPart::blend(0..3, dirt.clone(), rock.clone())])
            .with_colormap(colormap.clone())
            .with_lightmap(lightmap.clone()),
    );
    let mut config = draw_config();
    config.settings.blend_fade_distance = Some(10.0);

    // --- ACT ---
    let mut near = RecordingPass::new();
    zone.draw(
        &device,
        &mut near,
        &FixedFrustum::inside_at(Vec3::new(1.0, 1.0, 0.0)),
        &config,
    );
    let mut far = RecordingPass::new();
    zone.draw(
        &device,
        &mut far,
        &FixedFrustum::inside_at(Vec3::new(1000.0, 0.0, 0.0)),
        &config,
    );

    // --- ASSERT ---
    assert_eq!(near.programs(), vec![BLENDED]);
    assert_eq!(far.programs(), vec![SINGLE]);
    assert!(far.contains(&PassCommand::SetUniformU32(
        bindings::MATERIAL_ID_UNIFORMS[0],
        dirt.unique_id()
    )));
    assert!(!far.contains(&PassCommand::SetUniformU32(
        bindings::MATERIAL_ID_UNIFORMS[1],
        rock.unique_id()
    )));
    assert_eq!(far.indexed_ranges(), vec![0..3]);
}

#[test]
fn wireframe_draws_every_index_and_restores_fill() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = generated_maps();
    zone.set_data(full_zone(2, &m, &colormap, &lightmap));
    let mut config = draw_config();
    config.settings.show_wireframe = true;
    config.settings.wireframe_color = [0.0, 1.0, 0.0, 1.0];

    // --- ACT ---
    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &config);

    // --- ASSERT ---
    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 1 });
    assert_eq!(pass.programs(), vec![WIREFRAME]);
    assert_eq!(pass.indexed_ranges(), vec![0..6]);
    assert!(pass.contains(&PassCommand::SetPolygonMode(PolygonMode::Line)));
    assert!(pass.contains(&PassCommand::SetUniformColor(
        bindings::COLOR_UNIFORM,
        [0.0, 1.0, 0.0, 1.0]
    )));
    let last_mode = pass.commands.iter().rev().find_map(|c| match c {
        PassCommand::SetPolygonMode(mode) => Some(*mode),
        _ => None,
    });
    assert_eq!(last_mode, Some(PolygonMode::Fill));
}

#[test]
fn bounding_box_overlay_adds_a_line_draw() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = generated_maps();
    zone.set_data(full_zone(2, &m, &colormap, &lightmap));
    let mut config = draw_config();
    config.settings.show_bounding_boxes = true;

    // --- ACT ---
    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &config);

    // --- ASSERT ---
    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 2 });
    assert_eq!(pass.programs(), vec![SINGLE, BOUNDING_BOX]);
    assert!(pass.contains(&PassCommand::SetTopology(PrimitiveTopology::LineList)));
    assert!(pass.contains(&PassCommand::Draw(0..24)));
    assert_eq!(
        pass.commands.last(),
        Some(&PassCommand::SetTopology(PrimitiveTopology::TriangleList))
    );
}

#[test]
fn culling_can_be_disabled() {
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = generated_maps();
    zone.set_data(full_zone(1, &m, &colormap, &lightmap));
    let mut config = draw_config();
    config.settings.frustum_culling = false;
    let never_visible = |_: &Aabb| Visibility::Outside;

    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &never_visible, &config);

    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 1 });
}

#[test]
fn frustum_sees_world_space_bounds() {
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::new(500.0, 0.0, 0.0));
    let m = material(1);
    let (colormap, lightmap) = generated_maps();
    zone.set_data(full_zone(1, &m, &colormap, &lightmap));
    let near_origin = Aabb::from_min_max(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
    let frustum = move |aabb: &Aabb| {
        if near_origin.intersects_aabb(aabb) {
            Visibility::Intersecting
        } else {
            Visibility::Outside
        }
    };

    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &frustum, &draw_config());

    assert_eq!(outcome, DrawOutcome::Culled);
}

#[test]
fn maps_generated_after_the_commit_upload_on_first_draw() {
    // --- ARRANGE ---
    let device = MockGraphicsDevice::new();
    let zone = ZoneRenderer::new(1, Vec3::ZERO);
    let m = material(1);
    let (colormap, lightmap) = pending_maps();
    zone.set_data(full_zone(1, &m, &colormap, &lightmap));
    zone.update(&device);
    assert_eq!(device.textures_created(), 1);

    // --- ACT ---
    colormap.mark_generated(TextureData::solid_rgba([1, 2, 3, 4]));
    lightmap.mark_generated(TextureData::solid_rgba([5, 6, 7, 8]));
    let mut pass = RecordingPass::new();
    let outcome = zone.draw(&device, &mut pass, &FixedFrustum::inside(), &draw_config());

    // --- ASSERT ---
    assert_eq!(outcome, DrawOutcome::Drawn { draw_calls: 1 });
    assert_eq!(device.textures_created(), 3);
    assert!(pass.contains(&PassCommand::SetTexture(
        bindings::COLORMAP_TEXTURE_SLOT,
        texture_of(&*colormap)
    )));
}
