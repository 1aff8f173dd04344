use cgmath::InnerSpace;
use maze_ngin::{
    input::InputState,
    lights::{LightsUniform, UniformValue},
    render::FramePlan,
};
use winit::keyboard::KeyCode;

use crate::common::test_utils::{RecordingTarget, headless_scene};

mod common;

#[test]
fn transparent_objects_are_sorted_back_to_front_every_frame() {
    let mut scene = headless_scene(21);
    let mut input = InputState::default();
    input.press(KeyCode::KeyD);
    for _ in 0..90 {
        scene.update(1.0 / 30.0, &mut input);
        let eye = scene.camera.eye();
        let plan = FramePlan::build(&scene.registry, eye);
        let distances: Vec<f32> = plan
            .transparent
            .iter()
            .map(|call| (scene.registry.get(call.id).unwrap().instance.position - eye).magnitude())
            .collect();
        assert!(distances.windows(2).all(|w| w[0] >= w[1]), "{distances:?}");
        assert!(plan.opaque.iter().all(|c| !scene.registry.get(c.id).unwrap().transparent));
    }
}

#[test]
fn lights_write_every_documented_uniform() {
    let scene = headless_scene(4);
    let mut target = RecordingTarget::default();
    scene.lights.write_uniforms(&mut target);
    let names = target.names();
    for name in ["sun.direction", "num_lights", "spot.inner_cutoff", "spot.enabled", "lights[0].quadratic"] {
        assert!(names.contains(&name), "{name} missing");
    }
    assert_eq!(
        target.last("num_lights"),
        Some(UniformValue::Int(scene.lights.point_count() as i32))
    );
}

#[test]
fn rejected_uniforms_do_not_stop_the_rest() {
    let scene = headless_scene(4);
    let mut target = RecordingTarget::default();
    target.unknown.insert("sun.direction".to_string());
    scene.lights.write_uniforms(&mut target);
    assert!(target.last("sun.direction").is_none());
    assert!(target.last("spot.position").is_some());
}

#[test]
fn flashlight_gate_reaches_the_uniform_block() {
    let mut scene = headless_scene(8);
    let mut block = LightsUniform::default();
    scene.lights.write_uniforms(&mut block);
    assert!(block.spot_enabled());

    let mut input = InputState::default();
    input.press(KeyCode::KeyF);
    let rest = scene.apply_actions(input.take_actions());
    assert!(rest.is_empty());
    scene.update(0.016, &mut input);
    scene.lights.write_uniforms(&mut block);
    assert!(!block.spot_enabled());
    assert_eq!(block.spot.position[..3], [scene.camera.eye().x, scene.camera.eye().y, scene.camera.eye().z]);
}

#[test]
fn fountain_never_exceeds_its_pool() {
    let mut scene = headless_scene(30);
    let mut input = InputState::default();
    let capacity = scene.fountain.capacity();
    for _ in 0..1200 {
        scene.update(1.0 / 60.0, &mut input);
        assert!(scene.fountain.active_count() <= capacity);
        assert!(scene.fountain.draw_list().len() <= scene.fountain.max_draws());
    }
}
