use std::f32::consts::FRAC_PI_4;

use glam::{Mat4, Vec3, Vec4};

use lockstep_shared::{
    BitReader, BitWrite, DirtyLayout, DirtyMask, DirtyTracker, ObjectBase, Serde, SerdeErr,
    Serializable, OBJECT_LAYOUT,
};

use crate::event::{Event, KeyCode, PointerButtons};

pub const VIEW_DATA_LAYOUT: DirtyLayout = OBJECT_LAYOUT.extend("ViewData", 3);
pub const DIRTY_MODEL_MATRIX: DirtyMask = VIEW_DATA_LAYOUT.bit(0);
pub const DIRTY_STATISTICS: DirtyMask = VIEW_DATA_LAYOUT.bit(1);
pub const DIRTY_ORTHO: DirtyMask = VIEW_DATA_LAYOUT.bit(2);

const MAGELLAN_SPIN_WEIGHT: f32 = 0.0001;
const MOUSE_SPIN_WEIGHT: f32 = 0.005;

/// Camera and display state of one view, driven by input events on the
/// application node and replicated to every render node.
///
/// Only the model matrix and the two display toggles are replicated; spin
/// and advance are animation state of the master.
pub struct ViewData {
    base: ObjectBase,
    dirty: DirtyTracker,
    model_matrix: Mat4,
    pivot_point: Vec3,
    model_radius: f32,
    spin_x: f32,
    spin_y: f32,
    advance: f32,
    statistics: bool,
    ortho: bool,
}

impl Default for ViewData {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewData {
    pub fn new() -> Self {
        let mut view = Self {
            base: ObjectBase::default(),
            dirty: DirtyTracker::new(),
            model_matrix: Mat4::IDENTITY,
            pivot_point: Vec3::ZERO,
            model_radius: 1.0,
            spin_x: 5.0,
            spin_y: 5.0,
            advance: 0.0,
            statistics: false,
            ortho: false,
        };
        view.reset_model_position();
        view
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn set_name(&mut self, name: &str) {
        self.base.set_name(name, &self.dirty);
    }

    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    pub fn pivot_point(&self) -> Vec3 {
        self.pivot_point
    }

    pub fn model_radius(&self) -> f32 {
        self.model_radius
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    pub fn ortho(&self) -> bool {
        self.ortho
    }

    /// Whether the model keeps moving without further input
    pub fn is_animating(&self) -> bool {
        self.spin_x != 0.0 || self.spin_y != 0.0 || self.advance != 0.0
    }

    /// Applies one input event. Returns whether the event was consumed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let magellan_weight = 0.0001 * self.model_radius;
        let mouse_pan_weight = 0.0005 * self.model_radius;
        let mouse_zoom_weight = 0.005 * self.model_radius;

        match event {
            Event::ChannelPointerButtonRelease(release) => {
                if !release.buttons.is_empty() {
                    return false;
                }
                if release.button == PointerButtons::BUTTON1 {
                    self.spin_x = release.dy;
                    self.spin_y = release.dx;
                    return true;
                }
                if release.button == PointerButtons::BUTTON2 {
                    self.advance = -release.dy;
                    return true;
                }
                false
            }
            Event::ChannelPointerMotion(motion) => {
                if motion.buttons == PointerButtons::BUTTON1 {
                    self.spin_x = 0.0;
                    self.spin_y = 0.0;
                    self.spin_model(
                        -MOUSE_SPIN_WEIGHT * motion.dy,
                        -MOUSE_SPIN_WEIGHT * motion.dx,
                        0.0,
                    );
                    true
                } else if motion.buttons == PointerButtons::BUTTON2 {
                    self.advance = -motion.dy;
                    self.move_model_scaled(0.0, 0.0, mouse_zoom_weight * self.advance);
                    true
                } else if motion.buttons == PointerButtons::BUTTON3 {
                    self.move_model_scaled(
                        mouse_pan_weight * motion.dx,
                        -mouse_pan_weight * motion.dy,
                        0.0,
                    );
                    true
                } else {
                    false
                }
            }
            Event::ChannelPointerWheel(wheel) => {
                self.move_model_scaled(
                    -mouse_zoom_weight * wheel.y_axis,
                    0.0,
                    mouse_zoom_weight * wheel.x_axis,
                );
                true
            }
            Event::MagellanAxis(magellan) => {
                self.spin_x = 0.0;
                self.spin_y = 0.0;
                self.advance = 0.0;
                self.spin_model(
                    MAGELLAN_SPIN_WEIGHT * magellan.z_rotation,
                    -MAGELLAN_SPIN_WEIGHT * magellan.x_rotation,
                    -MAGELLAN_SPIN_WEIGHT * magellan.y_rotation,
                );
                self.move_model_scaled(
                    magellan_weight * magellan.x_axis,
                    -magellan_weight * magellan.z_axis,
                    magellan_weight * magellan.y_axis,
                );
                true
            }
            Event::KeyPress { key } if *key == KeyCode::from_char('s') => {
                self.show_statistics(!self.statistics);
                true
            }
            Event::KeyPress { key } if *key == KeyCode::from_char('o') => {
                self.set_ortho(!self.ortho);
                true
            }
            _ => false,
        }
    }

    /// Rotates the model around its pivot point, in radians
    pub fn spin_model(&mut self, x: f32, y: f32, z: f32) {
        if x == 0.0 && y == 0.0 && z == 0.0 {
            return;
        }

        // translation without the rotation around the pivot
        let rotation = self.rotation_only();
        let translation = self.translation() - self.pivot_point
            - rotation.transform_vector3(-self.pivot_point);

        let rotation =
            Mat4::from_rotation_z(z) * Mat4::from_rotation_y(y) * Mat4::from_rotation_x(x) * rotation;
        self.model_matrix = rotation;
        self.set_translation(
            rotation.transform_vector3(-self.pivot_point) + translation + self.pivot_point,
        );
        self.dirty.set(DIRTY_MODEL_MATRIX);
    }

    pub fn move_model(&mut self, x: f32, y: f32, z: f32) {
        if x == 0.0 && y == 0.0 && z == 0.0 {
            return;
        }
        self.set_translation(self.translation() + Vec3::new(x, y, z));
        self.dirty.set(DIRTY_MODEL_MATRIX);
    }

    /// Sets the bounding sphere the model spins around and zooms relative to
    pub fn set_model_bounding(&mut self, center: Vec3, radius: f32) {
        self.pivot_point = center;
        self.model_radius = radius;
    }

    /// Places the model in front of the camera so its bounding sphere fills
    /// a 45 degree field of view
    pub fn reset_model_position(&mut self) {
        let distance = self.model_radius * 1.5 / FRAC_PI_4.sin();
        self.set_translation(Vec3::new(
            -self.pivot_point.x,
            -self.pivot_point.y,
            -distance,
        ));
        self.dirty.set(DIRTY_MODEL_MATRIX);
    }

    pub fn show_statistics(&mut self, on: bool) {
        if self.statistics == on {
            return;
        }
        self.statistics = on;
        self.dirty.set(DIRTY_STATISTICS);
    }

    pub fn set_ortho(&mut self, on: bool) {
        if self.ortho == on {
            return;
        }
        self.ortho = on;
        self.dirty.set(DIRTY_ORTHO);
    }

    /// Advances the spin and zoom animation by one frame. Returns false when
    /// nothing moves.
    pub fn update(&mut self) -> bool {
        if !self.is_animating() {
            return false;
        }
        self.spin_model(-0.001 * self.spin_x, -0.001 * self.spin_y, 0.0);
        self.move_model_scaled(0.0, 0.0, 0.001 * self.advance);
        true
    }

    /// Moves the model by an amount proportional to its distance from the
    /// camera, in units of the model radius
    fn move_model_scaled(&mut self, x: f32, y: f32, z: f32) {
        if x == 0.0 && y == 0.0 && z == 0.0 {
            return;
        }
        let mut translation = self.translation() + self.pivot_point;

        // distance along z without the rotation around the pivot
        let distance = translation.z - self.pivot_point.z
            + self.model_matrix.row(2).dot(Vec4::from((self.pivot_point, 1.0)));
        let scaling = distance.abs() / self.model_radius;
        translation += Vec3::new(x, y, z) * scaling;

        self.set_translation(translation - self.pivot_point);
        self.dirty.set(DIRTY_MODEL_MATRIX);
    }

    fn translation(&self) -> Vec3 {
        self.model_matrix.w_axis.truncate()
    }

    fn set_translation(&mut self, translation: Vec3) {
        self.model_matrix.w_axis = translation.extend(1.0);
    }

    fn rotation_only(&self) -> Mat4 {
        let mut rotation = self.model_matrix;
        rotation.w_axis = Vec4::W;
        rotation
    }
}

impl Serializable for ViewData {
    const LAYOUT: DirtyLayout = VIEW_DATA_LAYOUT;

    fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    fn serialize(&self, writer: &mut dyn BitWrite, dirty: DirtyMask) {
        self.base.serialize(writer, dirty);
        if dirty.contains(DIRTY_MODEL_MATRIX) {
            self.model_matrix.to_cols_array().ser(writer);
        }
        if dirty.contains(DIRTY_STATISTICS) {
            self.statistics.ser(writer);
        }
        if dirty.contains(DIRTY_ORTHO) {
            self.ortho.ser(writer);
        }
    }

    fn deserialize(&mut self, reader: &mut BitReader, dirty: DirtyMask) -> Result<(), SerdeErr> {
        self.base.deserialize(reader, dirty)?;
        if dirty.contains(DIRTY_MODEL_MATRIX) {
            self.model_matrix = Mat4::from_cols_array(&<[f32; 16]>::de(reader)?);
        }
        if dirty.contains(DIRTY_STATISTICS) {
            self.statistics = bool::de(reader)?;
        }
        if dirty.contains(DIRTY_ORTHO) {
            self.ortho = bool::de(reader)?;
        }
        Ok(())
    }
}
