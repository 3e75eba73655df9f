/*
 * Rich edit zoom as numerator/denominator. Steps are applied to the
 * numerator after flooring it to a multiple of the step, and the result is
 * clamped to the configured bounds.
 */
use crate::config::{ZOOM_MAX_NUMERATOR, ZOOM_MIN_NUMERATOR, ZOOM_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom {
    pub numerator: i32,
    pub denominator: i32,
}

impl Zoom {
    /// Reads a raw control value; 0/0 means "no zoom" (100%).
    pub fn from_raw(numerator: i32, denominator: i32) -> Self {
        if numerator == 0 || denominator == 0 {
            Zoom {
                numerator: 100,
                denominator: 100,
            }
        } else {
            Zoom {
                numerator,
                denominator,
            }
        }
    }

    pub fn percent(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator) * 100.0
    }

    pub fn can_zoom_in(&self) -> bool {
        self.numerator < ZOOM_MAX_NUMERATOR
    }

    pub fn can_zoom_out(&self) -> bool {
        self.numerator > ZOOM_MIN_NUMERATOR
    }

    fn floored(&self) -> i32 {
        self.numerator - self.numerator % ZOOM_STEP
    }

    pub fn zoomed_in(&self) -> Zoom {
        let mut numerator = self.floored();
        if numerator < ZOOM_MAX_NUMERATOR {
            numerator += ZOOM_STEP;
        }
        Zoom {
            numerator: numerator.clamp(ZOOM_MIN_NUMERATOR, ZOOM_MAX_NUMERATOR),
            denominator: self.denominator,
        }
    }

    pub fn zoomed_out(&self) -> Zoom {
        let mut numerator = self.floored();
        if numerator > ZOOM_MIN_NUMERATOR {
            numerator -= ZOOM_STEP;
        }
        Zoom {
            numerator: numerator.clamp(ZOOM_MIN_NUMERATOR, ZOOM_MAX_NUMERATOR),
            denominator: self.denominator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_zoom_reads_as_hundred_percent() {
        let zoom = Zoom::from_raw(0, 0);
        assert_eq!(zoom, Zoom::from_raw(100, 100));
        assert_eq!(zoom.percent(), 100.0);
    }

    #[test]
    fn zoom_in_from_97_floors_then_steps_to_100() {
        // Arrange
        let zoom = Zoom::from_raw(97, 100);

        // Act
        let zoomed = zoom.zoomed_in();

        // Assert
        assert_eq!(zoomed.numerator, 100);
        assert_eq!(zoomed.percent(), 100.0);
    }

    #[test]
    fn repeated_zoom_out_stops_at_minimum() {
        // Arrange
        let mut zoom = Zoom::from_raw(45, 100);

        // Act
        for _ in 0..20 {
            zoom = zoom.zoomed_out();
        }

        // Assert
        assert_eq!(zoom.numerator, ZOOM_MIN_NUMERATOR);
        assert!(!zoom.can_zoom_out());
    }

    #[test]
    fn zoom_in_stops_at_maximum() {
        // Arrange
        let zoom = Zoom::from_raw(ZOOM_MAX_NUMERATOR, 100);

        // Act
        let zoomed = zoom.zoomed_in();

        // Assert
        assert_eq!(zoomed.numerator, ZOOM_MAX_NUMERATOR);
        assert!(!zoomed.can_zoom_in());
        assert!(zoomed.can_zoom_out());
    }

    #[test]
    fn zoom_out_from_below_minimum_clamps_to_minimum() {
        // Arrange
        let zoom = Zoom::from_raw(5, 100);

        // Act
        let zoomed = zoom.zoomed_out();

        // Assert
        assert_eq!(zoomed, Zoom::from_raw(ZOOM_MIN_NUMERATOR, 100));
    }

    #[test]
    fn zoom_in_from_above_maximum_clamps_to_maximum() {
        // Arrange
        let zoom = Zoom::from_raw(700, 100);

        // Act
        let zoomed = zoom.zoomed_in();

        // Assert
        assert_eq!(zoomed, Zoom::from_raw(ZOOM_MAX_NUMERATOR, 100));
        assert!(!zoomed.can_zoom_in());
    }
}
