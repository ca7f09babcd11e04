/// Gains shared by the four wheel velocity loops. The output of a loop is a
/// signed duty fraction, so `kp` is "duty per rad/s of error".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TuningParams {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}
