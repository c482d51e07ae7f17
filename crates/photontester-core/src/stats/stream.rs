//! Measurement streams
//!
//! Every mode/edge combination keeps its own statistics. Streams are never
//! merged: wired and USB aperture runs measure different input paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Independent measurement stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    /// Plain automatic mode, dark to light
    Auto,
    /// Wired aperture, black to white
    AutoApertureRise,
    /// Wired aperture, white to black
    AutoApertureFall,
    /// USB aperture, black to white
    DirectApertureRise,
    /// USB aperture, white to black
    DirectApertureFall,
}

impl Stream {
    /// Number of streams
    pub const COUNT: usize = 5;

    /// All streams in storage order
    pub const ALL: [Stream; Stream::COUNT] = [
        Stream::Auto,
        Stream::AutoApertureRise,
        Stream::AutoApertureFall,
        Stream::DirectApertureRise,
        Stream::DirectApertureFall,
    ];

    /// Storage slot
    pub fn index(self) -> usize {
        match self {
            Stream::Auto => 0,
            Stream::AutoApertureRise => 1,
            Stream::AutoApertureFall => 2,
            Stream::DirectApertureRise => 3,
            Stream::DirectApertureFall => 4,
        }
    }

    /// Short identifier used in log file names
    pub fn slug(self) -> &'static str {
        match self {
            Stream::Auto => "auto",
            Stream::AutoApertureRise => "auto_aperture_b2w",
            Stream::AutoApertureFall => "auto_aperture_w2b",
            Stream::DirectApertureRise => "direct_aperture_b2w",
            Stream::DirectApertureFall => "direct_aperture_w2b",
        }
    }

    /// Screen label
    pub fn label(self) -> &'static str {
        match self {
            Stream::Auto => "Auto",
            Stream::AutoApertureRise | Stream::DirectApertureRise => "B>W",
            Stream::AutoApertureFall | Stream::DirectApertureFall => "W>B",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_storage_order() {
        for (i, stream) in Stream::ALL.iter().enumerate() {
            assert_eq!(stream.index(), i);
        }
    }

    #[test]
    fn test_slugs_are_unique() {
        let mut slugs: Vec<_> = Stream::ALL.iter().map(|s| s.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), Stream::COUNT);
    }
}
