//! `Controller`: an opaque tagged union over the ways a panel turns input
//! into a model/view/projection matrix set. One variant per interaction
//! mode; no trait objects or function pointers (each mode's behavior is a
//! match arm, not a virtual call), so the whole state machine is plain data
//! a panel can serialize, clone for undo, or inspect without a vtable.

use crate::foundation::math::{Mat4, Mat4Ext, Quat, Vec2, Vec3};

/// A mouse button as reported by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// The subset of keys `Fly`/`Fps` respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Up,
    Down,
}

/// Events a controller consumes. Produced by the runner's input mapping
/// layer (an external collaborator to this crate) from whatever native
/// windowing events it receives.
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    /// A mouse button went down at `pos` (panel-local pixel coordinates).
    MouseDown { button: MouseButton, pos: (f32, f32) },
    /// A mouse button was released.
    MouseUp { button: MouseButton, pos: (f32, f32) },
    /// The cursor moved to `pos` while `button` was held, having moved by `delta` since the last event.
    Drag {
        button: MouseButton,
        pos: (f32, f32),
        delta: (f32, f32),
    },
    /// The scroll wheel moved by `delta` (positive = away from the user) at `pos`.
    Wheel { delta: f32, pos: (f32, f32) },
    /// A button was double-clicked at `pos`; every interactive controller resets on this.
    DoubleClick { button: MouseButton, pos: (f32, f32) },
    /// A tracked key changed pressed state.
    Key { code: KeyCode, pressed: bool },
}

/// The resolved matrix set a controller contributes to its panel's MVP
/// uniform for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct MvpMatrices {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl MvpMatrices {
    fn identity() -> Self {
        Self {
            model: Mat4::identity(),
            view: Mat4::identity(),
            proj: Mat4::identity(),
        }
    }
}

const ZOOM_MIN: f32 = 1e-5;
const ZOOM_MAX: f32 = 1e5;
const WHEEL_ZOOM_SENSITIVITY: f32 = 0.1;

/// Pan/zoom state shared by `PanZoom` and `PanZoomFixedAspect`.
#[derive(Debug, Clone, Copy)]
pub struct PanZoomState {
    pub camera_pos: Vec2,
    pub zoom: Vec2,
    /// Panel viewport size in pixels, used to turn pixel drag deltas into
    /// NDC-space camera motion.
    pub viewport_size: (f32, f32),
    pub fixed_aspect: bool,
}

impl PanZoomState {
    pub fn new(viewport_size: (f32, f32), fixed_aspect: bool) -> Self {
        Self {
            camera_pos: Vec2::zeros(),
            zoom: Vec2::new(1.0, 1.0),
            viewport_size,
            fixed_aspect,
        }
    }

    fn handle(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Drag { button: MouseButton::Left, delta, .. } => {
                let (w, h) = self.viewport_size;
                let delta_ndc = Vec2::new(delta.0 / w * 2.0, delta.1 / h * 2.0);
                self.camera_pos -= Vec2::new(delta_ndc.x / self.zoom.x, delta_ndc.y / self.zoom.y);
                true
            }
            InputEvent::Wheel { delta, .. } => {
                let factor = (delta * WHEEL_ZOOM_SENSITIVITY).exp();
                if self.fixed_aspect {
                    self.zoom *= factor;
                } else {
                    self.zoom.x *= factor;
                    self.zoom.y *= factor;
                }
                self.zoom.x = self.zoom.x.clamp(ZOOM_MIN, ZOOM_MAX);
                self.zoom.y = self.zoom.y.clamp(ZOOM_MIN, ZOOM_MAX);
                true
            }
            InputEvent::DoubleClick { .. } => {
                self.camera_pos = Vec2::zeros();
                self.zoom = Vec2::new(1.0, 1.0);
                true
            }
            _ => false,
        }
    }

    fn mvp(&self) -> MvpMatrices {
        let view = Mat4::new_nonuniform_scaling(&Vec3::new(self.zoom.x, self.zoom.y, 1.0))
            * Mat4::new_translation(&Vec3::new(-self.camera_pos.x, -self.camera_pos.y, 0.0));
        MvpMatrices {
            model: Mat4::identity(),
            view,
            proj: Mat4::identity(),
        }
    }
}

/// Project a panel-local pixel position onto the arcball's unit
/// hemisphere, falling back to the sphere's equator (`z == 0`) once the
/// point lands outside its radius (the classic Shoemake arcball).
fn project_to_sphere(pos: (f32, f32), center: (f32, f32), radius: f32) -> Vec3 {
    let nx = (pos.0 - center.0) / radius;
    let ny = (pos.1 - center.1) / radius;
    let mag2 = nx * nx + ny * ny;
    if mag2 <= 1.0 {
        Vec3::new(nx, ny, (1.0 - mag2).sqrt())
    } else {
        let inv = 1.0 / mag2.sqrt();
        Vec3::new(nx * inv, ny * inv, 0.0)
    }
}

fn quat_between(v0: Vec3, v1: Vec3) -> Quat {
    let cross = v0.cross(&v1);
    let dot = v0.dot(&v1).clamp(-1.0, 1.0);
    if cross.norm() < 1e-6 {
        if dot > 0.0 {
            Quat::identity()
        } else {
            // Antiparallel: spin 180 degrees about any axis perpendicular to v0.
            let axis = if v0.x.abs() < 0.9 { Vec3::x_axis() } else { Vec3::y_axis() };
            let perp = nalgebra::Unit::new_normalize(v0.cross(&axis));
            Quat::from_axis_angle(&perp, std::f32::consts::PI)
        }
    } else {
        let axis = nalgebra::Unit::new_normalize(cross);
        Quat::from_axis_angle(&axis, dot.acos())
    }
}

const ARCBALL_DISTANCE_MIN: f32 = 0.1;
const ARCBALL_DISTANCE_MAX: f32 = 100.0;
const ARCBALL_WHEEL_SENSITIVITY: f32 = 0.1;

/// Orientation/distance state shared by `Arcball` and `Turntable`.
#[derive(Debug, Clone, Copy)]
pub struct ArcballState {
    pub rotation: Quat,
    pub distance: f32,
    /// Panel-local pixel coordinates of the arcball's projection center.
    pub center: (f32, f32),
    /// Sphere radius in pixels.
    pub radius: f32,
    drag_anchor: Option<((f32, f32), Quat)>,
}

impl ArcballState {
    pub fn new(center: (f32, f32), radius: f32, distance: f32) -> Self {
        Self {
            rotation: Quat::identity(),
            distance,
            center,
            radius,
            drag_anchor: None,
        }
    }

    fn handle(&mut self, event: &InputEvent, turntable: bool) -> bool {
        match *event {
            InputEvent::MouseDown { button: MouseButton::Left, pos } => {
                self.drag_anchor = Some((pos, self.rotation));
                false
            }
            InputEvent::Drag { button: MouseButton::Left, pos, .. } => {
                let Some((anchor_pos, anchor_rotation)) = self.drag_anchor else {
                    return false;
                };
                let v0 = project_to_sphere(anchor_pos, self.center, self.radius);
                let v1 = project_to_sphere(pos, self.center, self.radius);
                let delta = if turntable {
                    // Constrain to the world Y axis: only the horizontal
                    // component of the drag contributes to orbit yaw.
                    let yaw = (pos.0 - anchor_pos.0) / self.radius;
                    Quat::from_axis_angle(&Vec3::y_axis(), -yaw)
                } else {
                    quat_between(v0, v1)
                };
                self.rotation = delta * anchor_rotation;
                true
            }
            InputEvent::MouseUp { button: MouseButton::Left, .. } => {
                self.drag_anchor = None;
                false
            }
            InputEvent::Wheel { delta, .. } => {
                self.distance = (self.distance * (-delta * ARCBALL_WHEEL_SENSITIVITY).exp())
                    .clamp(ARCBALL_DISTANCE_MIN, ARCBALL_DISTANCE_MAX);
                true
            }
            InputEvent::DoubleClick { .. } => {
                self.rotation = Quat::identity();
                true
            }
            _ => false,
        }
    }

    fn mvp(&self) -> MvpMatrices {
        let view = Mat4::new_translation(&Vec3::new(0.0, 0.0, -self.distance)) * self.rotation.to_homogeneous();
        MvpMatrices {
            model: Mat4::identity(),
            view,
            proj: Mat4Ext::perspective(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0),
        }
    }
}

const FLY_DEFAULT_MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 * 0.98;
const FLY_DEFAULT_SPEED: f32 = 2.0;
const FLY_DEFAULT_SMOOTHING: f32 = 8.0;
const FLY_MOUSE_SENSITIVITY: f32 = 0.005;
const FLY_WHEEL_LIFT: f32 = 0.2;

/// First-person orientation/position state shared by `Fly` (free 6DOF) and
/// `Fps` (yaw/pitch look, movement pinned to the `y = 0` plane).
#[derive(Debug, Clone, Copy)]
pub struct FlyState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub velocity: Vec3,
    pub max_pitch: f32,
    pub move_speed: f32,
    /// Exponential approach rate (`1/s`) used to smooth velocity toward its target.
    pub smoothing: f32,
    dragging: bool,
    forward_held: bool,
    back_held: bool,
    strafe_left_held: bool,
    strafe_right_held: bool,
    up_held: bool,
    down_held: bool,
}

impl FlyState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::zeros(),
            max_pitch: FLY_DEFAULT_MAX_PITCH,
            move_speed: FLY_DEFAULT_SPEED,
            smoothing: FLY_DEFAULT_SMOOTHING,
            dragging: false,
            forward_held: false,
            back_held: false,
            strafe_left_held: false,
            strafe_right_held: false,
            up_held: false,
            down_held: false,
        }
    }

    fn forward_vector(&self) -> Vec3 {
        Vec3::new(self.yaw.sin() * self.pitch.cos(), self.pitch.sin(), -self.yaw.cos() * self.pitch.cos())
    }

    fn handle(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::MouseDown { button: MouseButton::Right, .. } => {
                self.dragging = true;
                false
            }
            InputEvent::MouseUp { button: MouseButton::Right, .. } => {
                self.dragging = false;
                false
            }
            InputEvent::Drag { button: MouseButton::Right, delta, .. } => {
                self.yaw += delta.0 * FLY_MOUSE_SENSITIVITY;
                self.pitch = (self.pitch - delta.1 * FLY_MOUSE_SENSITIVITY).clamp(-self.max_pitch, self.max_pitch);
                true
            }
            InputEvent::Wheel { delta, .. } => {
                self.position.y += delta * FLY_WHEEL_LIFT;
                true
            }
            InputEvent::Key { code, pressed } => {
                match code {
                    KeyCode::Forward => self.forward_held = pressed,
                    KeyCode::Back => self.back_held = pressed,
                    KeyCode::StrafeLeft => self.strafe_left_held = pressed,
                    KeyCode::StrafeRight => self.strafe_right_held = pressed,
                    KeyCode::Up => self.up_held = pressed,
                    KeyCode::Down => self.down_held = pressed,
                }
                false
            }
            InputEvent::DoubleClick { .. } => {
                self.position = Vec3::zeros();
                self.yaw = 0.0;
                self.pitch = 0.0;
                self.velocity = Vec3::zeros();
                true
            }
            _ => false,
        }
    }

    /// Advance position by `dt` seconds, smoothing velocity toward the
    /// target implied by currently-held movement keys. `pin_y` pins
    /// vertical movement to zero (the `Fps` variant's ground constraint).
    fn update(&mut self, dt: f32, pin_y: bool) {
        let forward = self.forward_vector();
        let forward_move = if pin_y { Vec3::new(forward.x, 0.0, forward.z).normalize() } else { forward };
        let right = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());

        let mut target = Vec3::zeros();
        if self.forward_held {
            target += forward_move;
        }
        if self.back_held {
            target -= forward_move;
        }
        if self.strafe_right_held {
            target += right;
        }
        if self.strafe_left_held {
            target -= right;
        }
        if !pin_y {
            if self.up_held {
                target += Vec3::y();
            }
            if self.down_held {
                target -= Vec3::y();
            }
        }
        if target.norm() > 1e-6 {
            target = target.normalize() * self.move_speed;
        }

        let alpha = 1.0 - (-self.smoothing * dt).exp();
        self.velocity += (target - self.velocity) * alpha;
        self.position += self.velocity * dt;
        if pin_y {
            self.position.y = 0.0;
        }
    }

    fn mvp(&self) -> MvpMatrices {
        let target = self.position + self.forward_vector();
        let view = Mat4Ext::look_at(self.position, target, Vec3::y());
        MvpMatrices {
            model: Mat4::identity(),
            view,
            proj: Mat4Ext::perspective(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 1000.0),
        }
    }
}

/// Auto-tick threshold (panel pixels between ticks below which the axes
/// visual collapses the next decade) shared by `Axes2D`/`Axes3D`. The
/// number comes from the upstream library's axes algorithm and is left as
/// a tunable rather than hardcoded further down the pipeline, since the
/// actual tick-placement algorithm is an external collaborator to this crate.
pub const DEFAULT_TICK_PX_THRESHOLD: f32 = 200.0;

/// `Axes2D`'s state: a `PanZoom` camera plus the tick density threshold.
#[derive(Debug, Clone, Copy)]
pub struct AxesState2D {
    pub base: PanZoomState,
    pub tick_px_threshold: f32,
}

impl AxesState2D {
    pub fn new(viewport_size: (f32, f32)) -> Self {
        Self {
            base: PanZoomState::new(viewport_size, true),
            tick_px_threshold: DEFAULT_TICK_PX_THRESHOLD,
        }
    }
}

/// `Axes3D`'s state: an `Arcball` camera plus the tick density threshold.
#[derive(Debug, Clone, Copy)]
pub struct AxesState3D {
    pub base: ArcballState,
    pub tick_px_threshold: f32,
}

impl AxesState3D {
    pub fn new(center: (f32, f32), radius: f32, distance: f32) -> Self {
        Self {
            base: ArcballState::new(center, radius, distance),
            tick_px_threshold: DEFAULT_TICK_PX_THRESHOLD,
        }
    }
}

/// One panel's interaction mode and the state it carries. Every variant
/// knows how to consume an [`InputEvent`], advance with time (`Fly`/`Fps`
/// only — the others are purely event-driven), and produce this frame's
/// [`MvpMatrices`].
#[derive(Debug, Clone, Copy)]
pub enum Controller {
    /// No camera: visuals are drawn in clip space directly.
    None,
    PanZoom(PanZoomState),
    PanZoomFixedAspect(PanZoomState),
    Arcball(ArcballState),
    Turntable(ArcballState),
    Fly(FlyState),
    Fps(FlyState),
    Axes2D(AxesState2D),
    Axes3D(AxesState3D),
}

impl Controller {
    /// Feed one input event in; returns whether it changed the camera
    /// (the panel uses this to decide whether to re-upload its MVP dat).
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match self {
            Controller::None => false,
            Controller::PanZoom(s) | Controller::PanZoomFixedAspect(s) => s.handle(event),
            Controller::Arcball(s) => s.handle(event, false),
            Controller::Turntable(s) => s.handle(event, true),
            Controller::Fly(s) | Controller::Fps(s) => s.handle(event),
            Controller::Axes2D(s) => s.base.handle(event),
            Controller::Axes3D(s) => s.base.handle(event, false),
        }
    }

    /// Advance time-driven controllers (`Fly`/`Fps`'s velocity smoothing);
    /// a no-op for purely event-driven ones.
    pub fn update(&mut self, dt: f32) {
        match self {
            Controller::Fly(s) => s.update(dt, false),
            Controller::Fps(s) => s.update(dt, true),
            _ => {}
        }
    }

    /// This frame's model/view/projection matrices.
    pub fn mvp(&self) -> MvpMatrices {
        match self {
            Controller::None => MvpMatrices::identity(),
            Controller::PanZoom(s) | Controller::PanZoomFixedAspect(s) => s.mvp(),
            Controller::Arcball(s) | Controller::Turntable(s) => s.mvp(),
            Controller::Fly(s) | Controller::Fps(s) => s.mvp(),
            Controller::Axes2D(s) => s.base.mvp(),
            Controller::Axes3D(s) => s.base.mvp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// An 800x600-viewport PanZoom panel, dragged from (10,10) to (100,20)
    /// with the left button, ends up with its camera translated left and
    /// slightly up — never past the edge of a unit zoom's visible range.
    #[test]
    fn panzoom_drag_moves_camera_within_bounds() {
        let mut state = PanZoomState::new((800.0, 600.0), false);
        let drag = InputEvent::Drag {
            button: MouseButton::Left,
            pos: (100.0, 20.0),
            delta: (90.0, 10.0),
        };
        assert!(state.handle(&drag));
        assert!(state.camera_pos.x > -0.9 && state.camera_pos.x < -0.1, "x = {}", state.camera_pos.x);
        assert_ne!(state.camera_pos.y, 0.0);
    }

    #[test]
    fn panzoom_double_click_resets_camera_and_zoom() {
        let mut state = PanZoomState::new((800.0, 600.0), false);
        state.handle(&InputEvent::Drag {
            button: MouseButton::Left,
            pos: (100.0, 20.0),
            delta: (90.0, 10.0),
        });
        state.handle(&InputEvent::Wheel { delta: 3.0, pos: (400.0, 300.0) });
        assert!(state.handle(&InputEvent::DoubleClick { button: MouseButton::Left, pos: (0.0, 0.0) }));
        assert_eq!(state.camera_pos, Vec2::zeros());
        assert_eq!(state.zoom, Vec2::new(1.0, 1.0));
    }

    /// A left-drag from (10,10) to (100,20) on an arcball centered at
    /// (0,14) with radius 10 (both points beyond the sphere's edge, so the
    /// rotation is a clean small-angle turn about the screen's Z axis)
    /// produces a near-identity rotation tilted by ~25 degrees.
    #[test]
    fn arcball_drag_produces_small_rotation_within_bounds() {
        let mut state = ArcballState::new((0.0, 14.0), 10.0, 5.0);
        state.handle(&InputEvent::MouseDown { button: MouseButton::Left, pos: (10.0, 10.0) }, false);
        assert!(state.handle(&InputEvent::Drag {
            button: MouseButton::Left,
            pos: (100.0, 20.0),
            delta: (90.0, 10.0),
        }, false));

        let m = state.rotation.to_homogeneous();
        assert!(m.m11 > 0.9 && m.m11 < 1.0, "m00 = {}", m.m11);
        assert!(m.m22 > 0.9 && m.m22 < 1.0, "m11 = {}", m.m22);
        assert!(m.m21 > 0.1 && m.m21 < 0.5, "m10 = {}", m.m21);
        assert!(m.m12 > -0.5 && m.m12 < -0.1, "m01 = {}", m.m12);
    }

    #[test]
    fn arcball_double_click_resets_to_identity() {
        let mut state = ArcballState::new((400.0, 300.0), 300.0, 5.0);
        state.handle(&InputEvent::MouseDown { button: MouseButton::Left, pos: (10.0, 10.0) }, false);
        state.handle(&InputEvent::Drag { button: MouseButton::Left, pos: (300.0, 300.0), delta: (290.0, 290.0) }, false);
        assert!(state.handle(&InputEvent::DoubleClick { button: MouseButton::Left, pos: (0.0, 0.0) }, false));
        let m = state.rotation.to_homogeneous();
        assert_relative_eq!(m.trace(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn fly_pitch_clamps_to_max() {
        let mut state = FlyState::new(Vec3::zeros());
        state.handle(&InputEvent::MouseDown { button: MouseButton::Right, pos: (0.0, 0.0) });
        state.handle(&InputEvent::Drag {
            button: MouseButton::Right,
            pos: (0.0, -100_000.0),
            delta: (0.0, -100_000.0),
        });
        assert!(state.pitch <= state.max_pitch);
        assert!(state.pitch >= -state.max_pitch);
    }

    #[test]
    fn fps_update_pins_y_to_zero() {
        let mut state = FlyState::new(Vec3::new(0.0, 5.0, 0.0));
        state.handle(&InputEvent::Key { code: KeyCode::Up, pressed: true });
        state.update(1.0, true);
        assert_eq!(state.position.y, 0.0);
    }
}
