//! Hex colors and the id-keyed palette.

use std::fmt;

/// 24-bit `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    /// `0xff0000`.
    pub const RED: Self = Self(0xff_0000);
    /// `0x00ff00`.
    pub const GREEN: Self = Self(0x00_ff00);
    /// `0x0000ff`.
    pub const BLUE: Self = Self(0x00_00ff);
    /// `0xffff00`.
    pub const YELLOW: Self = Self(0xff_ff00);
    /// `0xff00ff`.
    pub const MAGENTA: Self = Self(0xff_00ff);
    /// `0x00ffff`.
    pub const CYAN: Self = Self(0x00_ffff);
    /// `0xffffff`.
    pub const WHITE: Self = Self(0xff_ffff);

    /// Red, green and blue channels.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        let [_, r, g, b] = self.0.to_be_bytes();
        [r, g, b]
    }

    /// Builds a color from channels.
    #[must_use]
    pub const fn from_channels([r, g, b]: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, r, g, b]))
    }

    /// Linear interpolation per channel; `t` is clamped to `[0, 1]`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "interpolated channels stay within 0..=255"
    )]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let a = self.channels();
        let b = other.channels();
        let mix = |from: u8, to: u8| {
            (f32::from(from) + (f32::from(to) - f32::from(from)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::from_channels([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
    }

    /// Channels as `[0, 1]` floats.
    #[must_use]
    pub fn to_unit(self) -> [f32; 3] {
        self.channels().map(|c| f32::from(c) / 255.0)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

const PALETTE: [Rgb; 6] = [
    Rgb::RED,
    Rgb::GREEN,
    Rgb::BLUE,
    Rgb::YELLOW,
    Rgb::MAGENTA,
    Rgb::CYAN,
];

/// Palette entry for an id that parses as a small non-negative integer.
#[must_use]
pub fn palette_color(id: &str) -> Option<Rgb> {
    let index: usize = id.trim().parse().ok()?;
    PALETTE.get(index).copied()
}

/// Palette color for `id`, white when the id has no entry.
///
/// # Examples
///
/// ```
/// use swarm_view::scene::{color_for_id, Rgb};
///
/// assert_eq!(color_for_id("2"), Rgb::BLUE);
/// assert_eq!(color_for_id("alpha"), Rgb::WHITE);
/// ```
#[must_use]
pub fn color_for_id(id: &str) -> Rgb {
    palette_color(id).unwrap_or(Rgb::WHITE)
}
