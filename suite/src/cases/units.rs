//! Packed dimension decoding and pixel conversion rules.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use async_trait::async_trait;
use runtime::units::{
    apply_dimension, complex_to_dimension_pixel_offset, complex_to_dimension_pixel_size,
    complex_to_float, pack_integer,
};
use runtime::{ComplexUnit, DisplayMetrics};

pub struct DimensionUnitsCase;

#[async_trait]
impl Case for DimensionUnitsCase {
    fn name(&self) -> &str {
        "dimension-units"
    }

    fn description(&self) -> &str {
        "packed dimensions decode per unit and nonzero sizes never round to zero pixels"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let metrics = DisplayMetrics::default();

        check_eq(
            apply_dimension(ComplexUnit::Px, 10.0, &metrics),
            10.0,
            "pixels are untouched",
        )?;
        check_eq(
            apply_dimension(ComplexUnit::In, 10.0, &metrics),
            1600.0,
            "inches scale by xdpi",
        )?;

        let dense = DisplayMetrics {
            density: 2.0,
            scaled_density: 3.0,
            ..DisplayMetrics::default()
        };
        check_eq(
            apply_dimension(ComplexUnit::Dip, 10.0, &dense),
            20.0,
            "dip scales by density",
        )?;
        check_eq(
            apply_dimension(ComplexUnit::Sp, 10.0, &dense),
            30.0,
            "sp scales by scaled density",
        )?;

        // integer mantissas survive the packed encoding
        let packed = pack_integer(ComplexUnit::Dip, 42);
        check_eq(complex_to_float(packed), 42.0, "decoded mantissa")?;
        check_eq(
            ComplexUnit::from_complex(packed),
            Some(ComplexUnit::Dip),
            "decoded unit",
        )?;

        // offset truncates, size rounds
        let sparse = DisplayMetrics {
            density: 0.15,
            ..DisplayMetrics::default()
        };
        let ten_dip = pack_integer(ComplexUnit::Dip, 10);
        check_eq(
            complex_to_dimension_pixel_offset(ten_dip, &sparse),
            1,
            "pixel offset of 1.5px",
        )?;
        check_eq(
            complex_to_dimension_pixel_size(ten_dip, &sparse),
            2,
            "pixel size of 1.5px",
        )?;

        // a nonzero dimension never rounds to zero pixels
        let hairline = DisplayMetrics {
            density: 0.001,
            ..DisplayMetrics::default()
        };
        let one_dip = pack_integer(ComplexUnit::Dip, 1);
        check_eq(
            complex_to_dimension_pixel_size(one_dip, &hairline),
            1,
            "hairline clamps to one pixel",
        )?;
        check_eq(
            complex_to_dimension_pixel_size(pack_integer(ComplexUnit::Dip, -1), &hairline),
            -1,
            "negative hairline clamps to minus one",
        )?;
        check_eq(
            complex_to_dimension_pixel_size(pack_integer(ComplexUnit::Px, 0), &metrics),
            0,
            "zero stays zero",
        )?;
        check(
            complex_to_dimension_pixel_offset(one_dip, &hairline) == 0,
            "offset still truncates the hairline to zero",
        )?;

        Ok(())
    }
}
