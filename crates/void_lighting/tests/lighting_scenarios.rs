//! End-to-end lighting scenarios
//!
//! Attenuation math, group partitioning, culling and uniform sync exercised
//! through the public API only.

use approx::assert_abs_diff_eq;
use void_lighting::prelude::*;
use void_lighting::{LightRecord, LightGraph, UniformValue};

fn facing(position: Vec3, toward: Vec3) -> FragmentData {
    FragmentData::new(position, (toward - position).normalize(), toward)
}

#[test]
fn scenario_point_attenuation_inside_range() {
    let light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 10.0, 2.0);
    let contribution = light.calculate_contribution(&facing(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO));

    let expected = (1.0 / 51.0) * (-1.0f32).exp();
    assert_abs_diff_eq!(contribution.attenuation, expected, epsilon = 1e-5);
    assert_abs_diff_eq!(contribution.attenuation, 0.0072, epsilon = 1e-4);
    assert!(contribution.diffuse.x > 0.0);
}

#[test]
fn scenario_point_beyond_range_is_dark() {
    let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 5.0, 10.0, 0.5);
    light.set_attenuation_coefficients(0.0, 0.0, 0.0).unwrap();

    let contribution = light.calculate_contribution(&facing(Vec3::new(0.0, 0.0, 11.0), Vec3::ZERO));
    assert_eq!(contribution.attenuation, 0.0);
    assert_eq!(contribution.total(), Vec3::ZERO);
}

#[test]
fn scenario_spot_cone_falloff() {
    let angle = std::f32::consts::FRAC_PI_6;
    let light = Light::spot(Vec3::ZERO, Vec3::NEG_Y, angle, 0.5);
    let spot = light.as_spot().unwrap();

    assert_eq!(spot.angle_attenuation(0.0), 1.0);
    assert_eq!(spot.angle_attenuation(spot.inner_angle()), 1.0);
    assert_abs_diff_eq!(spot.angle_attenuation(22.5f32.to_radians()), 0.5, epsilon = 1e-4);
    assert_eq!(spot.angle_attenuation(31.0f32.to_radians()), 0.0);
}

#[test]
fn scenario_group_queries_follow_moves() {
    let mut graph = LightGraph::new();
    let root = graph.root();
    let group_a = graph.create_group("a", Some(root)).unwrap();
    let group_b = graph.create_group("b", Some(root)).unwrap();
    let light = graph
        .insert_light(Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 5.0, 2.0), Some(group_a))
        .unwrap();

    assert_eq!(graph.point_lights(root).unwrap(), &[light]);
    assert_eq!(graph.point_lights(group_a).unwrap(), &[light]);

    graph.reparent_light(light, Some(group_b)).unwrap();

    assert!(graph.point_lights(group_a).unwrap().is_empty());
    assert_eq!(graph.point_lights(group_b).unwrap(), &[light]);
    assert_eq!(graph.point_lights(root).unwrap(), &[light]);
}

#[test]
fn scenario_culled_light_stays_registered() {
    let config = LightManagerConfig::default().with_culling_distance(Some(50.0));
    let mut manager = LightManager::new(config);
    let options = LightOptions {
        position: Some(Vec3::new(200.0, 0.0, 0.0)),
        distance: Some(10.0),
        ..Default::default()
    };
    let far = manager.create_light(LightType::Point, &options).unwrap();
    let near = manager
        .create_light(
            LightType::Point,
            &LightOptions {
                position: Some(Vec3::new(5.0, 0.0, 0.0)),
                ..Default::default()
            },
        )
        .unwrap();

    let stats = manager.update(0.016, &CameraView::at(Vec3::ZERO)).clone();

    assert!(!manager.is_active(far));
    assert!(manager.is_active(near));
    assert!(manager.light(far).is_some());
    assert_eq!(manager.light_count(), 2);
    assert_eq!(stats.culled_lights, 1);
    assert_eq!(stats.active_lights, 1);
}

#[test]
fn light_has_at_most_one_parent() {
    let mut graph = LightGraph::new();
    let root = graph.root();
    let a = graph.create_group("a", Some(root)).unwrap();
    let b = graph.create_group("b", Some(root)).unwrap();
    let light = graph.insert_light(Light::ambient(Vec3::ONE, 0.1), Some(a)).unwrap();

    graph.add_light(b, light).unwrap();

    assert!(!graph.group(a).unwrap().lights().contains(&light));
    assert!(graph.group(b).unwrap().lights().contains(&light));
    assert_eq!(graph.light(light).unwrap().parent(), Some(b));
    assert_eq!(graph.ambient_lights(root).unwrap().len(), 1);
}

#[test]
fn light_changes_invalidate_every_ancestor() {
    let mut graph = LightGraph::new();
    let root = graph.root();
    let outer = graph.create_group("outer", Some(root)).unwrap();
    let inner = graph.create_group("inner", Some(outer)).unwrap();
    let light = graph
        .insert_light(Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 5.0, 2.0), Some(inner))
        .unwrap();
    graph.point_lights(root).unwrap();

    let before: Vec<u64> = [root, outer, inner]
        .iter()
        .map(|g| graph.group(*g).unwrap().generation())
        .collect();

    graph.light_mut(light).unwrap().set_visible(false).unwrap();

    for (group, generation) in [root, outer, inner].iter().zip(before) {
        let node = graph.group(*group).unwrap();
        assert!(node.generation() > generation);
        assert!(!node.is_cache_valid());
    }
    assert!(graph.point_lights(root).unwrap().is_empty());
}

#[test]
fn repeated_queries_reuse_the_cache() {
    let mut graph = LightGraph::new();
    let root = graph.root();
    graph
        .insert_light(Light::spot(Vec3::Y, Vec3::NEG_Y, 0.5, 0.2), Some(root))
        .unwrap();

    let first = graph.spot_lights(root).unwrap().to_vec();
    let rebuilds = graph.group(root).unwrap().rebuild_count();
    let second = graph.spot_lights(root).unwrap().to_vec();

    assert_eq!(first, second);
    assert_eq!(graph.group(root).unwrap().rebuild_count(), rebuilds);
}

#[test]
fn disposal_releases_shadow_maps_once() {
    let mut light = Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0).with_shadows(true);
    light.attach_shadow_map(ShadowMapHandle(7)).unwrap();
    assert_eq!(light.dispose(), Some(ShadowMapHandle(7)));
    assert_eq!(light.dispose(), None);

    let mut manager = LightManager::default();
    let group = manager.create_group("props").unwrap();
    let mut lamp = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 5.0, 2.0).with_shadows(true);
    lamp.attach_shadow_map(ShadowMapHandle(2)).unwrap();
    manager.add_light_to(lamp, group).unwrap();

    assert_eq!(manager.dispose_group(group).unwrap(), vec![ShadowMapHandle(2)]);
    assert!(manager.dispose_group(group).unwrap().is_empty());
    assert!(manager.dispose().is_empty());
    assert!(manager.dispose().is_empty());
}

#[test]
fn record_survives_json() {
    let light = Light::spot(Vec3::new(1.0, 4.0, 0.0), Vec3::NEG_Y, 0.7, 0.3)
        .with_name("stage")
        .with_color(Vec3::new(1.0, 0.8, 0.6))
        .with_intensity(3.0)
        .with_shadows(true);

    let json = serde_json::to_string(&light.to_record()).unwrap();
    let record: LightRecord = serde_json::from_str(&json).unwrap();
    let restored = Light::from_record(record);

    assert_ne!(restored.id(), light.id());
    assert_eq!(restored.to_record(), light.to_record());
}

#[test]
fn sync_uniforms_mirrors_the_active_set() {
    let config = LightManagerConfig::default().with_max_lights(2);
    let mut manager = LightManager::new(config);
    manager.add_light(Light::ambient(Vec3::ONE, 0.1)).unwrap();
    manager
        .add_light(Light::point(Vec3::new(1.0, 0.0, 0.0), Vec3::X, 1.0, 0.0, 2.0))
        .unwrap();
    manager
        .add_light(Light::point(Vec3::new(40.0, 0.0, 0.0), Vec3::Y, 1.0, 0.0, 2.0))
        .unwrap();

    manager.update(0.016, &CameraView::at(Vec3::ZERO));
    assert_eq!(manager.active_lights().len(), 2);

    let mut uniforms = LightUniforms::new(8);
    manager.sync_uniforms(&mut uniforms);

    let counts = uniforms.counts();
    assert_eq!(counts.ambient, 1);
    assert_eq!(counts.point, 1);
    assert_eq!(uniforms.slot("point_color[0]"), Some(&UniformValue::Vec3([1.0, 0.0, 0.0])));
    assert_eq!(uniforms.slot("num_point_lights"), Some(&UniformValue::Int(1)));
}
