use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

/// Meters per second for keyboard movement
const MOVE_SPEED: f32 = 1.5;
/// Radians per second for Q/E yaw
const YAW_SPEED: f32 = 1.2;
/// Radians per pixel of right-drag look
const LOOK_SENSITIVITY: f32 = 0.003;
const MAX_PITCH: f32 = 1.45;

/// The camera standing in for the handheld device
#[derive(Component)]
pub struct DeviceCamera;

/// Accumulated look angles so pitch can be clamped
#[derive(Component, Default)]
pub struct DeviceOrientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl DeviceOrientation {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn look(&mut self, delta: Vec2) {
        self.yaw -= delta.x;
        self.pitch = (self.pitch - delta.y).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

pub fn spawn_device_camera(mut commands: Commands) {
    let orientation = DeviceOrientation {
        yaw: 0.0,
        pitch: -0.35,
    };

    commands.spawn((
        Camera3d::default(),
        DeviceCamera,
        Transform::from_xyz(0.0, 1.5, 2.5).with_rotation(orientation.rotation()),
        orientation,
        Name::new("device_camera"),
    ));
}

/// WASD to walk, Q/E to turn, right-drag to look around
pub fn move_device_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    time: Res<Time>,
    mut camera_query: Query<(&mut Transform, &mut DeviceOrientation), With<DeviceCamera>>,
) {
    let Ok((mut transform, mut orientation)) = camera_query.single_mut() else {
        return;
    };

    if mouse_button.pressed(MouseButton::Right) {
        for event in mouse_motion.read() {
            orientation.look(event.delta * LOOK_SENSITIVITY);
        }
    } else {
        mouse_motion.clear();
    }

    let delta = time.delta_secs();
    if keyboard.pressed(KeyCode::KeyQ) {
        orientation.yaw += YAW_SPEED * delta;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        orientation.yaw -= YAW_SPEED * delta;
    }

    let rotation = orientation.rotation();
    // Walk on the floor plane regardless of pitch
    let forward = (rotation * Vec3::NEG_Z).with_y(0.0).normalize_or_zero();
    let right = (rotation * Vec3::X).with_y(0.0).normalize_or_zero();

    let mut direction = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        direction += forward;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        direction -= forward;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        direction += right;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        direction -= right;
    }

    if direction != Vec3::ZERO {
        transform.translation += direction.normalize_or_zero() * MOVE_SPEED * delta;
    }
    if transform.rotation != rotation {
        transform.rotation = rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_is_clamped() {
        let mut orientation = DeviceOrientation::default();
        orientation.look(Vec2::new(0.0, -10.0));
        assert_eq!(orientation.pitch, MAX_PITCH);

        orientation.look(Vec2::new(0.0, 20.0));
        assert_eq!(orientation.pitch, -MAX_PITCH);
    }

    #[test]
    fn test_default_orientation_looks_down_negative_z() {
        let forward = DeviceOrientation::default().rotation() * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }
}
