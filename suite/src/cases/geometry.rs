//! Matrix algebra: identity, pivot scale, reset, inversion, composition.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use async_trait::async_trait;
use runtime::{Matrix, Point};

const IDENTITY: &str = "[1.0, 0.0, 0.0][0.0, 1.0, 0.0][0.0, 0.0, 1.0]";

pub struct MatrixAlgebraCase;

#[async_trait]
impl Case for MatrixAlgebraCase {
    fn name(&self) -> &str {
        "matrix-algebra"
    }

    fn description(&self) -> &str {
        "a new matrix is the identity and reset restores it exactly after a pivot scale"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let mut matrix = Matrix::new();
        check(matrix.is_identity(), "new matrix must be the identity")?;
        check_eq(
            matrix.to_short_string(),
            IDENTITY.to_string(),
            "identity short string",
        )?;

        matrix.set_scale_about(1.0, 2.0, 3.0, 4.0);
        check(!matrix.is_identity(), "pivot scale must leave the identity")?;
        check_eq(
            matrix.to_short_string(),
            "[1.0, 0.0, 0.0][0.0, 2.0, -4.0][0.0, 0.0, 1.0]".to_string(),
            "pivot scale short string",
        )?;

        matrix.reset();
        check(matrix.is_identity(), "reset must restore the identity")?;
        check_eq(
            matrix.to_short_string(),
            IDENTITY.to_string(),
            "short string after reset",
        )?;

        // translation inverts exactly
        matrix.set_translate(2.0, 3.0);
        let inverse = match matrix.invert() {
            Some(inverse) => inverse,
            None => return check(false, "translation must be invertible"),
        };
        check_eq(
            inverse.to_short_string(),
            "[1.0, 0.0, -2.0][0.0, 1.0, -3.0][0.0, 0.0, 1.0]".to_string(),
            "inverse of a translation",
        )?;
        check_eq(
            inverse.map_point(matrix.map_point(Point::new(1.0, 1.0))),
            Point::new(1.0, 1.0),
            "point through matrix and inverse",
        )?;

        // a singular matrix has no inverse
        let mut squash = Matrix::new();
        squash.set_scale(0.0, 0.0);
        check(squash.invert().is_none(), "zero scale must not invert")?;

        // concat applies the right-hand matrix first
        let mut scale = Matrix::new();
        scale.set_scale(2.0, 2.0);
        let mut translate = Matrix::new();
        translate.set_translate(5.0, 0.0);
        let mut composed = Matrix::new();
        composed.set_concat(&translate, &scale);
        check_eq(
            composed.map_point(Point::new(1.0, 1.0)),
            Point::new(7.0, 2.0),
            "composed transform of (1,1)",
        )?;

        Ok(())
    }
}
