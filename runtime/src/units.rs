//! Packed dimension values and display-metric conversion.
//!
//! A complex value packs a unit nibble, a 2-bit radix and a signed 24-bit
//! mantissa into one `u32`. Decoding and pixel conversion follow the
//! documented rules, including the one subtle case: rounding a nonzero
//! dimension never collapses it to zero pixels.

use serde::{Deserialize, Serialize};

pub const COMPLEX_UNIT_SHIFT: u32 = 0;
pub const COMPLEX_UNIT_MASK: u32 = 0xf;
pub const COMPLEX_RADIX_SHIFT: u32 = 4;
pub const COMPLEX_RADIX_MASK: u32 = 0x3;
pub const COMPLEX_MANTISSA_SHIFT: u32 = 8;
pub const COMPLEX_MANTISSA_MASK: u32 = 0xffffff;

const MANTISSA_MULT: f32 = 1.0 / (1 << COMPLEX_MANTISSA_SHIFT) as f32;
const RADIX_MULTS: [f32; 4] = [
    MANTISSA_MULT,
    1.0 / (1 << 7) as f32 * MANTISSA_MULT,
    1.0 / (1 << 15) as f32 * MANTISSA_MULT,
    1.0 / (1 << 23) as f32 * MANTISSA_MULT,
];

/// Dimension units a complex value can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexUnit {
    /// Raw pixels
    Px,
    /// Density-independent pixels
    Dip,
    /// Scaled pixels (font preference applied)
    Sp,
    /// Points (1/72 of an inch)
    Pt,
    /// Inches
    In,
    /// Millimeters
    Mm,
}

impl ComplexUnit {
    /// Decode the unit nibble of a complex value
    pub fn from_complex(complex: u32) -> Option<Self> {
        match (complex >> COMPLEX_UNIT_SHIFT) & COMPLEX_UNIT_MASK {
            0 => Some(ComplexUnit::Px),
            1 => Some(ComplexUnit::Dip),
            2 => Some(ComplexUnit::Sp),
            3 => Some(ComplexUnit::Pt),
            4 => Some(ComplexUnit::In),
            5 => Some(ComplexUnit::Mm),
            _ => None,
        }
    }
}

/// Display geometry used to resolve density-dependent units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    /// Logical density (1.0 at the 160 dpi baseline)
    pub density: f32,
    /// Density with the user font scale applied
    pub scaled_density: f32,
    pub xdpi: f32,
    pub ydpi: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            density: 1.0,
            scaled_density: 1.0,
            xdpi: 160.0,
            ydpi: 160.0,
        }
    }
}

/// Decode the fixed-point payload of a complex value
pub fn complex_to_float(complex: u32) -> f32 {
    let mantissa = (complex & (COMPLEX_MANTISSA_MASK << COMPLEX_MANTISSA_SHIFT)) as i32;
    let radix = ((complex >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize;
    mantissa as f32 * RADIX_MULTS[radix]
}

/// Convert `value` in `unit` to pixels
pub fn apply_dimension(unit: ComplexUnit, value: f32, metrics: &DisplayMetrics) -> f32 {
    match unit {
        ComplexUnit::Px => value,
        ComplexUnit::Dip => value * metrics.density,
        ComplexUnit::Sp => value * metrics.scaled_density,
        ComplexUnit::Pt => value * metrics.xdpi * (1.0 / 72.0),
        ComplexUnit::In => value * metrics.xdpi,
        ComplexUnit::Mm => value * metrics.xdpi * (1.0 / 25.4),
    }
}

/// Decode a complex value straight to pixels. An unknown unit nibble
/// yields 0.
pub fn complex_to_dimension(complex: u32, metrics: &DisplayMetrics) -> f32 {
    match ComplexUnit::from_complex(complex) {
        Some(unit) => apply_dimension(unit, complex_to_float(complex), metrics),
        None => 0.0,
    }
}

/// Pixel offset: the dimension truncated toward zero
pub fn complex_to_dimension_pixel_offset(complex: u32, metrics: &DisplayMetrics) -> i32 {
    complex_to_dimension(complex, metrics) as i32
}

/// Pixel size: the dimension rounded, but a nonzero dimension never
/// becomes zero pixels.
pub fn complex_to_dimension_pixel_size(complex: u32, metrics: &DisplayMetrics) -> i32 {
    let value = complex_to_float(complex);
    let dimension = complex_to_dimension(complex, metrics);
    let rounded = (dimension + 0.5) as i32;
    if rounded != 0 {
        return rounded;
    }
    if value == 0.0 {
        0
    } else if value > 0.0 {
        1
    } else {
        -1
    }
}

/// Encode an integer mantissa with unit `unit` (radix 23.0). Handy for
/// building test fixtures.
pub fn pack_integer(unit: ComplexUnit, mantissa: i32) -> u32 {
    let unit_bits = match unit {
        ComplexUnit::Px => 0,
        ComplexUnit::Dip => 1,
        ComplexUnit::Sp => 2,
        ComplexUnit::Pt => 3,
        ComplexUnit::In => 4,
        ComplexUnit::Mm => 5,
    };
    (((mantissa as u32) & COMPLEX_MANTISSA_MASK) << COMPLEX_MANTISSA_SHIFT)
        | (unit_bits << COMPLEX_UNIT_SHIFT)
}
