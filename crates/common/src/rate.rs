//! Frame rate and playback speed.
//!
//! Speed is kept as a reduced fraction so that tick periods derived from it
//! scale exactly (2x is precisely half of 1x).

use std::fmt;
use std::str::FromStr;

use crate::error::PlaybackError;

/// Frames per second of the source stream. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Rate assumed until the stream summary reports the real one.
    pub const DEFAULT: FrameRate = FrameRate(30);

    /// Highest rate accepted from a stream summary.
    pub const MAX_FPS: u32 = 1000;

    pub fn new(fps: u32) -> Result<Self, PlaybackError> {
        if fps == 0 {
            return Err(PlaybackError::ZeroFrameRate);
        }
        if fps > Self::MAX_FPS {
            return Err(PlaybackError::FrameRateTooHigh(fps));
        }
        Ok(Self(fps))
    }

    pub fn fps(self) -> u32 {
        self.0
    }

    /// Number of frames covering `seconds` of playback.
    pub fn frames_in(self, seconds: u32) -> usize {
        self.0 as usize * seconds as usize
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Playback speed multiplier as a reduced positive fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Speed {
    num: u32,
    den: u32,
}

impl Speed {
    pub const NORMAL: Speed = Speed { num: 1, den: 1 };

    /// Upper bound on the multiplier.
    pub const MAX_MULTIPLIER: u32 = 16;

    /// Most decimal places accepted when parsing.
    const MAX_DECIMALS: usize = 6;

    pub fn new(num: u32, den: u32) -> Result<Self, PlaybackError> {
        if num == 0 || den == 0 || num as u64 > Self::MAX_MULTIPLIER as u64 * den as u64 {
            return Err(PlaybackError::InvalidSpeed(format!("{num}/{den}")));
        }
        let g = gcd(num, den);
        Ok(Self {
            num: num / g,
            den: den / g,
        })
    }

    pub fn numerator(self) -> u32 {
        self.num
    }

    pub fn denominator(self) -> u32 {
        self.den
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}x", self.num)
        } else {
            write!(f, "{}x", self.as_f64())
        }
    }
}

impl FromStr for Speed {
    type Err = PlaybackError;

    /// Parses decimal multipliers such as `2`, `0.5`, `.25` or `1.5x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlaybackError::InvalidSpeed(s.to_string());

        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.len() > Self::MAX_DECIMALS
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = 10u64.pow(frac_part.len() as u32);
        let int_value: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };
        let frac_value: u64 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| invalid())?
        };

        let num = int_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_value))
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(invalid)?;

        Speed::new(num, scale as u32).map_err(|_| invalid())
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_rejects_zero() {
        assert_eq!(FrameRate::new(0), Err(PlaybackError::ZeroFrameRate));
        assert_eq!(FrameRate::new(25).map(FrameRate::fps), Ok(25));
        assert_eq!(FrameRate::DEFAULT.frames_in(2), 60);
    }

    #[test]
    fn frame_rate_is_bounded_above() {
        assert!(FrameRate::new(FrameRate::MAX_FPS).is_ok());
        assert_eq!(FrameRate::new(1001), Err(PlaybackError::FrameRateTooHigh(1001)));
        assert_eq!(FrameRate::new(u32::MAX), Err(PlaybackError::FrameRateTooHigh(u32::MAX)));
    }

    #[test]
    fn speed_parses_the_menu_values() {
        assert_eq!("2".parse::<Speed>().unwrap(), Speed::new(2, 1).unwrap());
        assert_eq!("1".parse::<Speed>().unwrap(), Speed::NORMAL);
        assert_eq!("0.5".parse::<Speed>().unwrap(), Speed::new(1, 2).unwrap());
        assert_eq!("0.25".parse::<Speed>().unwrap(), Speed::new(1, 4).unwrap());
        assert_eq!(".25x".parse::<Speed>().unwrap(), Speed::new(1, 4).unwrap());
        assert_eq!("1.5X".parse::<Speed>().unwrap(), Speed::new(3, 2).unwrap());
    }

    #[test]
    fn speed_is_kept_reduced() {
        let speed = Speed::new(50, 100).unwrap();
        assert_eq!(speed.numerator(), 1);
        assert_eq!(speed.denominator(), 2);
        assert_eq!(speed.to_string(), "0.5x");
        assert_eq!(Speed::new(4, 2).unwrap().to_string(), "2x");
    }

    #[test]
    fn speed_rejects_garbage_and_out_of_range() {
        for bad in ["", "x", "0", "0.0", "-1", "abc", "1.2.3", "17", "0.0000001"] {
            assert!(bad.parse::<Speed>().is_err(), "{bad:?} should not parse");
        }
        assert!(Speed::new(1, 0).is_err());
        assert!(Speed::new(16, 1).is_ok());
    }
}
