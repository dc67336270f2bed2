//! 3x3 transform matrix with the documented short-string format.
//!
//! Row-major, so the affine translation lives in the right-hand column.
//! `pre_*` multiplies on the right (applied first to points), `post_*`
//! on the left (applied last).

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

const IDENTITY: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// 3x3 transform matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    values: [f32; 9],
}

impl Matrix {
    /// The identity matrix
    pub fn new() -> Self {
        Self { values: IDENTITY }
    }

    pub fn from_values(values: [f32; 9]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> [f32; 9] {
        self.values
    }

    pub fn is_identity(&self) -> bool {
        self.values == IDENTITY
    }

    /// Restore the identity exactly
    pub fn reset(&mut self) {
        self.values = IDENTITY;
    }

    pub fn set_scale(&mut self, sx: f32, sy: f32) {
        self.values = [sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0];
    }

    /// Scale around a pivot point
    pub fn set_scale_about(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        self.values = [sx, 0.0, px - sx * px, 0.0, sy, py - sy * py, 0.0, 0.0, 1.0];
    }

    pub fn set_translate(&mut self, dx: f32, dy: f32) {
        self.values = [1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0];
    }

    pub fn set_sin_cos(&mut self, sin: f32, cos: f32) {
        self.values = [cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0];
    }

    /// Rotation from precomputed sin/cos around a pivot point
    pub fn set_sin_cos_about(&mut self, sin: f32, cos: f32, px: f32, py: f32) {
        self.values = [
            cos,
            -sin,
            px - (cos * px - sin * py),
            sin,
            cos,
            py - (sin * px + cos * py),
            0.0,
            0.0,
            1.0,
        ];
    }

    pub fn set_rotate(&mut self, degrees: f32) {
        let (sin, cos) = sin_cos_of(degrees);
        self.set_sin_cos(sin, cos);
    }

    pub fn set_rotate_about(&mut self, degrees: f32, px: f32, py: f32) {
        let (sin, cos) = sin_cos_of(degrees);
        self.set_sin_cos_about(sin, cos, px, py);
    }

    /// self = a * b
    pub fn set_concat(&mut self, a: &Matrix, b: &Matrix) {
        self.values = multiply(&a.values, &b.values);
    }

    /// self = self * other (other applied first to points)
    pub fn pre_concat(&mut self, other: &Matrix) {
        self.values = multiply(&self.values, &other.values);
    }

    /// self = other * self (other applied last to points)
    pub fn post_concat(&mut self, other: &Matrix) {
        self.values = multiply(&other.values, &self.values);
    }

    pub fn pre_translate(&mut self, dx: f32, dy: f32) {
        let mut m = Matrix::new();
        m.set_translate(dx, dy);
        self.pre_concat(&m);
    }

    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        let mut m = Matrix::new();
        m.set_translate(dx, dy);
        self.post_concat(&m);
    }

    pub fn pre_scale(&mut self, sx: f32, sy: f32) {
        let mut m = Matrix::new();
        m.set_scale(sx, sy);
        self.pre_concat(&m);
    }

    pub fn post_scale(&mut self, sx: f32, sy: f32) {
        let mut m = Matrix::new();
        m.set_scale(sx, sy);
        self.post_concat(&m);
    }

    pub fn pre_rotate(&mut self, degrees: f32) {
        let mut m = Matrix::new();
        m.set_rotate(degrees);
        self.pre_concat(&m);
    }

    pub fn post_rotate(&mut self, degrees: f32) {
        let mut m = Matrix::new();
        m.set_rotate(degrees);
        self.post_concat(&m);
    }

    /// The inverse, or `None` when the matrix is singular
    pub fn invert(&self) -> Option<Matrix> {
        let m = &self.values;
        let det = m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6]);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            values: [
                (m[4] * m[8] - m[5] * m[7]) * inv_det,
                (m[2] * m[7] - m[1] * m[8]) * inv_det,
                (m[1] * m[5] - m[2] * m[4]) * inv_det,
                (m[5] * m[6] - m[3] * m[8]) * inv_det,
                (m[0] * m[8] - m[2] * m[6]) * inv_det,
                (m[2] * m[3] - m[0] * m[5]) * inv_det,
                (m[3] * m[7] - m[4] * m[6]) * inv_det,
                (m[1] * m[6] - m[0] * m[7]) * inv_det,
                (m[0] * m[4] - m[1] * m[3]) * inv_det,
            ],
        })
    }

    /// Transform points in place
    pub fn map_points(&self, points: &mut [Point]) {
        for point in points {
            *point = self.map_point(*point);
        }
    }

    pub fn map_point(&self, point: Point) -> Point {
        let m = &self.values;
        let x = m[0] * point.x + m[1] * point.y + m[2];
        let y = m[3] * point.x + m[4] * point.y + m[5];
        let w = m[6] * point.x + m[7] * point.y + m[8];
        if w != 0.0 && w != 1.0 {
            Point::new(x / w, y / w)
        } else {
            Point::new(x, y)
        }
    }

    /// Rows rendered as `[m00, m01, m02][m10, m11, m12][m20, m21, m22]`
    pub fn to_short_string(&self) -> String {
        let m = &self.values;
        format!(
            "[{:?}, {:?}, {:?}][{:?}, {:?}, {:?}][{:?}, {:?}, {:?}]",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8]
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

fn sin_cos_of(degrees: f32) -> (f32, f32) {
    let radians = (degrees as f64).to_radians();
    (radians.sin() as f32, radians.cos() as f32)
}

fn multiply(a: &[f32; 9], b: &[f32; 9]) -> [f32; 9] {
    let mut out = [0.0f32; 9];
    for row in 0..3 {
        for col in 0..3 {
            let mut sum = 0.0;
            for k in 0..3 {
                sum += a[row * 3 + k] * b[k * 3 + col];
            }
            out[row * 3 + col] = sum;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_STRING: &str = "[1.0, 0.0, 0.0][0.0, 1.0, 0.0][0.0, 0.0, 1.0]";

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn new_matrix_is_identity() {
        let matrix = Matrix::new();
        assert!(matrix.is_identity());
        assert_eq!(matrix.to_short_string(), IDENTITY_STRING);
    }

    #[test]
    fn scale_is_not_identity() {
        let mut matrix = Matrix::new();
        matrix.set_scale(0.0, 0.0);
        assert!(!matrix.is_identity());
    }

    #[test]
    fn set_scale_writes_the_diagonal() {
        let mut matrix = Matrix::new();
        matrix.set_scale(1.0, 2.0);
        assert_eq!(
            matrix.to_short_string(),
            "[1.0, 0.0, 0.0][0.0, 2.0, 0.0][0.0, 0.0, 1.0]"
        );
    }

    #[test]
    fn set_scale_about_offsets_the_pivot() {
        let mut matrix = Matrix::new();
        matrix.set_scale_about(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            matrix.to_short_string(),
            "[1.0, 0.0, 0.0][0.0, 2.0, -4.0][0.0, 0.0, 1.0]"
        );
    }

    #[test]
    fn reset_restores_identity_exactly() {
        let mut matrix = Matrix::new();
        matrix.set_scale_about(1.0, 2.0, 3.0, 4.0);
        assert_ne!(matrix.to_short_string(), IDENTITY_STRING);
        matrix.reset();
        assert_eq!(matrix.to_short_string(), IDENTITY_STRING);
    }

    #[test]
    fn set_rotate_uses_degree_trig() {
        let mut matrix = Matrix::new();
        matrix.set_rotate(1.0);
        let values = matrix.values();
        assert_close(values[0], 0.9998477);
        assert_close(values[1], -0.017452406);
        assert_close(values[3], 0.017452406);
        assert_close(values[4], 0.9998477);
    }

    #[test]
    fn set_rotate_about_translates_the_pivot() {
        let mut matrix = Matrix::new();
        matrix.set_rotate_about(1.0, 2.0, 3.0);
        let values = matrix.values();
        assert_close(values[2], 0.0526618);
        assert_close(values[5], -0.034447942);
    }

    #[test]
    fn set_sin_cos_places_entries() {
        let mut matrix = Matrix::new();
        matrix.set_sin_cos(1.0, 0.0);
        assert_eq!(
            matrix.to_short_string(),
            "[0.0, -1.0, 0.0][1.0, 0.0, 0.0][0.0, 0.0, 1.0]"
        );
    }

    #[test]
    fn pre_translate_lands_in_the_last_column() {
        let mut matrix = Matrix::new();
        matrix.pre_translate(1.0, 2.0);
        assert_eq!(
            matrix.to_short_string(),
            "[1.0, 0.0, 1.0][0.0, 1.0, 2.0][0.0, 0.0, 1.0]"
        );
    }

    #[test]
    fn pre_and_post_scale_differ_on_translation() {
        let mut pre = Matrix::new();
        pre.set_translate(1.0, 1.0);
        pre.pre_scale(2.0, 2.0);
        // translation applied after scale, so it is unscaled
        assert_eq!(
            pre.to_short_string(),
            "[2.0, 0.0, 1.0][0.0, 2.0, 1.0][0.0, 0.0, 1.0]"
        );

        let mut post = Matrix::new();
        post.set_translate(1.0, 1.0);
        post.post_scale(2.0, 2.0);
        assert_eq!(
            post.to_short_string(),
            "[2.0, 0.0, 2.0][0.0, 2.0, 2.0][0.0, 0.0, 1.0]"
        );
    }

    #[test]
    fn concat_composes_in_argument_order() {
        let mut translate = Matrix::new();
        translate.set_translate(5.0, 0.0);
        let mut scale = Matrix::new();
        scale.set_scale(2.0, 2.0);

        let mut matrix = Matrix::new();
        matrix.set_concat(&translate, &scale);
        // scale applied first, then translate
        assert_eq!(matrix.map_point(Point::new(1.0, 1.0)), Point::new(7.0, 2.0));
    }

    #[test]
    fn invert_round_trips_a_point() {
        let mut matrix = Matrix::new();
        matrix.set_translate(2.0, 3.0);
        let inverse = matrix.invert().unwrap();
        assert_eq!(
            inverse.to_short_string(),
            "[1.0, 0.0, -2.0][0.0, 1.0, -3.0][0.0, 0.0, 1.0]"
        );

        let there = matrix.map_point(Point::new(1.0, 1.0));
        let back = inverse.map_point(there);
        assert_eq!(back, Point::new(1.0, 1.0));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let mut matrix = Matrix::new();
        matrix.set_scale(0.0, 0.0);
        assert!(matrix.invert().is_none());
    }

    #[test]
    fn map_points_transforms_in_place() {
        let mut matrix = Matrix::new();
        matrix.set_scale(2.0, 3.0);
        let mut points = [Point::new(1.0, 1.0), Point::new(-2.0, 0.5)];
        matrix.map_points(&mut points);
        assert_eq!(points[0], Point::new(2.0, 3.0));
        assert_eq!(points[1], Point::new(-4.0, 1.5));
    }
}
