// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis-ordering conventions for spatial tensors.

/// Which axis of a rank-3 spatial tensor holds the channels.
///
/// Both layouts describe the same logical data; a channel-last tensor is
/// typically a zero-copy [`permute`](crate::TensorView::permute) of a
/// channel-first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `[channels, height, width]`.
    #[default]
    ChannelFirst,
    /// `[height, width, channels]`.
    ChannelLast,
}

impl Layout {
    /// Positions of the `(channel, height, width)` axes within the shape.
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            Layout::ChannelFirst => (0, 1, 2),
            Layout::ChannelLast => (2, 0, 1),
        }
    }

    /// Builds a shape in this layout from logical extents.
    pub fn shape(self, channels: usize, height: usize, width: usize) -> crate::Shape {
        match self {
            Layout::ChannelFirst => crate::Shape::cube(channels, height, width),
            Layout::ChannelLast => crate::Shape::cube(height, width, channels),
        }
    }

    /// Orders a logical `(c, y, x)` coordinate as a multi-index in this layout.
    #[inline]
    pub fn index(self, c: usize, y: usize, x: usize) -> [usize; 3] {
        match self {
            Layout::ChannelFirst => [c, y, x],
            Layout::ChannelLast => [y, x, c],
        }
    }

    /// Numeric tag used by the model format.
    pub fn code(self) -> u8 {
        match self {
            Layout::ChannelFirst => 0,
            Layout::ChannelLast => 1,
        }
    }

    /// Parses a numeric tag from the model format.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Layout::ChannelFirst),
            1 => Some(Layout::ChannelLast),
            _ => None,
        }
    }

    /// Returns a human-readable label for this layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::ChannelFirst => "channel_first",
            Layout::ChannelLast => "channel_last",
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_and_index_agree() {
        for layout in [Layout::ChannelFirst, Layout::ChannelLast] {
            let (c, h, w) = layout.axes();
            let idx = layout.index(7, 8, 9);
            assert_eq!((idx[c], idx[h], idx[w]), (7, 8, 9));
            let shape = layout.shape(3, 4, 5);
            assert_eq!(
                (shape.dims()[c], shape.dims()[h], shape.dims()[w]),
                (3, 4, 5)
            );
        }
    }

    #[test]
    fn test_code_roundtrip() {
        assert_eq!(Layout::from_code(Layout::ChannelLast.code()), Some(Layout::ChannelLast));
        assert_eq!(Layout::from_code(0), Some(Layout::ChannelFirst));
        assert_eq!(Layout::from_code(2), None);
    }

    #[test]
    fn test_default_is_channel_first() {
        assert_eq!(Layout::default(), Layout::ChannelFirst);
    }
}
