use bevy::prelude::*;
use tower_core::{GameCamera, GameLogicPlugin, PresentationPlugin};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(GameLogicPlugin)
        .add_plugins(PresentationPlugin)
        // Dusk background
        .insert_resource(ClearColor(Color::srgb(0.10, 0.10, 0.16)))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    // Camera looking at the base platform; the follow system eases it upward
    // as the tower grows and replay snaps it back here.
    let camera_position = Vec3::new(0.0, 4.0, 9.0);
    commands.spawn((
        Camera3d::default(),
        GameCamera::new(camera_position),
        Transform::from_translation(camera_position).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.6, 0.4, 0.0)),
    ));
}
