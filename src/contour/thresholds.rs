//! Zoom-dependent contour intervals.

use crate::{Result, ViewerError};
use std::collections::BTreeMap;

/// Maps a zoom breakpoint to its `(minor, major)` contour intervals in meters.
///
/// Built from the two user-tunable base intervals. A breakpoint applies from
/// its zoom up to the next breakpoint; below the first one no contours are
/// drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourThresholdTable {
    levels: BTreeMap<u8, (f64, f64)>,
}

impl ContourThresholdTable {
    /// Derives the table from the base minor/major intervals:
    ///
    /// | zoom | minor    | major    |
    /// |------|----------|----------|
    /// | 11   | major    | major*5  |
    /// | 12   | minor    | major    |
    /// | 14   | minor/2  | major    |
    /// | 15   | minor/5  | minor    |
    pub fn from_intervals(minor: f64, major: f64) -> Result<Self> {
        for (name, value) in [("minor", minor), ("major", major)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ViewerError::InvalidThresholds(format!(
                    "{} interval must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let levels = BTreeMap::from([
            (11, (major, major * 5.0)),
            (12, (minor, major)),
            (14, (minor / 2.0, major)),
            (15, (minor / 5.0, minor)),
        ]);
        Ok(Self { levels })
    }

    /// Intervals at exactly `zoom`, if it is a breakpoint
    pub fn get(&self, zoom: u8) -> Option<(f64, f64)> {
        self.levels.get(&zoom).copied()
    }

    /// Intervals in effect at `zoom`: the breakpoint with the greatest key not above it
    pub fn levels_for_zoom(&self, zoom: u8) -> Option<(f64, f64)> {
        self.levels.range(..=zoom).next_back().map(|(_, levels)| *levels)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, (f64, f64))> + '_ {
        self.levels.iter().map(|(zoom, levels)| (*zoom, *levels))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Compact form used in protocol URLs: `11*200*1000~12*50*200~...`
    pub fn encode(&self) -> String {
        self.levels
            .iter()
            .map(|(zoom, (minor, major))| format!("{}*{}*{}", zoom, minor, major))
            .collect::<Vec<_>>()
            .join("~")
    }

    /// Parses the form produced by [`encode`](Self::encode)
    pub fn decode(encoded: &str) -> Result<Self> {
        let invalid = || ViewerError::InvalidThresholds(format!("cannot parse '{}'", encoded));

        let mut levels = BTreeMap::new();
        for entry in encoded.split('~').filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split('*').collect();
            let [zoom, minor, major] = parts.as_slice() else {
                return Err(invalid());
            };
            let zoom: u8 = zoom.parse().map_err(|_| invalid())?;
            let minor: f64 = minor.parse().map_err(|_| invalid())?;
            let major: f64 = major.parse().map_err(|_| invalid())?;
            levels.insert(zoom, (minor, major));
        }
        Ok(Self { levels })
    }
}
