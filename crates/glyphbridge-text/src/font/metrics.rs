/// Face-wide vertical metrics in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Ascent above baseline (positive).
    pub ascent: f32,
    /// Descent below baseline (positive).
    pub descent: f32,
    pub line_gap: f32,
    pub units_per_em: u16,
}

impl FontMetrics {
    /// Font units to points at `point_size`; an unset em square maps 1:1.
    pub fn units_to_points(&self, point_size: f32) -> f32 {
        if self.units_per_em != 0 {
            point_size / self.units_per_em as f32
        } else {
            1.0
        }
    }

    /// Metrics at `point_size`.
    pub fn at_size(&self, point_size: f32) -> ScaledFontMetrics {
        let scale = self.units_to_points(point_size);
        ScaledFontMetrics {
            ascent: self.ascent * scale,
            descent: self.descent * scale,
            line_gap: self.line_gap * scale,
            point_size,
        }
    }
}

/// Vertical metrics in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub point_size: f32,
}

impl ScaledFontMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_em_square() {
        let metrics = FontMetrics {
            ascent: 800.0,
            descent: 200.0,
            line_gap: 100.0,
            units_per_em: 1000,
        };
        let scaled = metrics.at_size(10.0);
        assert_eq!(scaled.ascent, 8.0);
        assert_eq!(scaled.descent, 2.0);
        assert_eq!(scaled.line_height(), 11.0);
    }

    #[test]
    fn zero_em_square_does_not_divide_by_zero() {
        let metrics = FontMetrics {
            ascent: 5.0,
            descent: 1.0,
            line_gap: 0.0,
            units_per_em: 0,
        };
        assert_eq!(metrics.at_size(12.0).ascent, 5.0);
    }
}
