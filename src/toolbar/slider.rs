//! Randomness slider shown in the overflow menu.

/// Lowest value.
pub const MIN: u8 = 0;
/// Highest value.
pub const MAX: u8 = 100;
/// Value when the item has no temperature.
pub const DEFAULT: u8 = 50;
/// Change per key press.
pub const STEP: u8 = 5;

/// A 0 to 100 slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    value: u8,
    /// Cells used by the track.
    pub width: usize,
}

impl Default for Slider {
    fn default() -> Self {
        Self {
            value: DEFAULT,
            width: 10,
        }
    }
}

impl Slider {
    /// Positions the slider for a temperature in `[0, 1]`.
    pub fn from_temperature(temperature: Option<f32>) -> Self {
        let mut slider = Self::default();
        slider.set_temperature(temperature);
        slider
    }

    /// Moves to `temperature * 100`, or the default when unset.
    pub fn set_temperature(&mut self, temperature: Option<f32>) {
        self.value = match temperature {
            Some(t) if t.is_finite() => (t * 100.0).round().clamp(MIN as f32, MAX as f32) as u8,
            _ => DEFAULT,
        };
    }

    /// Current value.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Steps up; returns the new value if it changed.
    pub fn increase(&mut self) -> Option<u8> {
        self.set(self.value.saturating_add(STEP).min(MAX))
    }

    /// Steps down; returns the new value if it changed.
    pub fn decrease(&mut self) -> Option<u8> {
        self.set(self.value.saturating_sub(STEP).max(MIN))
    }

    fn set(&mut self, value: u8) -> Option<u8> {
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(value)
    }

    /// Renders `Randomness: ━━━━━●───── 50`.
    pub fn view(&self) -> String {
        let width = self.width.max(2);
        let knob = usize::from(self.value) * (width - 1) / usize::from(MAX);
        let track: String = (0..width)
            .map(|i| match i.cmp(&knob) {
                std::cmp::Ordering::Less => '━',
                std::cmp::Ordering::Equal => '●',
                std::cmp::Ordering::Greater => '─',
            })
            .collect();
        format!("Randomness: {} {}", track, self.value)
    }
}
