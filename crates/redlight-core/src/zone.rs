use crate::frame::Frame;

/// A player's vertical slice of the frame. Derived from frame size and player
/// count on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub index: usize,
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

impl Zone {
    /// Split a frame into `player_count` equal, contiguous zones. Columns left
    /// over on the right by the integer division belong to nobody.
    pub fn layout(frame_width: u32, frame_height: u32, player_count: usize) -> Vec<Zone> {
        (0..player_count)
            .filter_map(|i| Self::for_player(i, frame_width, frame_height, player_count))
            .collect()
    }

    pub fn for_player(
        index: usize,
        frame_width: u32,
        frame_height: u32,
        player_count: usize,
    ) -> Option<Zone> {
        if index >= player_count {
            return None;
        }
        let count = u32::try_from(player_count).ok()?;
        let width = frame_width / count;
        let x = u32::try_from(index).ok()?.checked_mul(width)?;
        Some(Zone {
            index,
            x,
            width,
            height: frame_height,
        })
    }

    /// One past the last column of the zone.
    #[cfg(test)]
    fn x_end(&self) -> u32 {
        self.x + self.width
    }

    /// Copy this zone's pixels out of a full frame.
    pub fn capture(&self, frame: &Frame) -> Frame {
        frame.region(self.x, 0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zones_are_equal_and_contiguous() {
        let zones = Zone::layout(640, 480, 4);
        assert_eq!(zones.len(), 4);
        for (i, z) in zones.iter().enumerate() {
            assert_eq!(z.index, i);
            assert_eq!(z.width, 160);
            assert_eq!(z.height, 480);
        }
        for pair in zones.windows(2) {
            assert_eq!(pair[0].x_end(), pair[1].x);
        }
    }

    #[test]
    fn remainder_columns_are_unassigned() {
        let zones = Zone::layout(100, 10, 3);
        assert_eq!(zones.iter().map(|z| z.width).collect::<Vec<_>>(), [33, 33, 33]);
        assert_eq!(zones[2].x_end(), 99);
    }

    #[test]
    fn out_of_range_index_has_no_zone() {
        assert_eq!(Zone::for_player(2, 100, 10, 2), None);
        assert!(Zone::layout(100, 10, 0).is_empty());
    }

    #[test]
    fn more_players_than_columns_gives_empty_zones() {
        let zones = Zone::layout(2, 2, 3);
        assert!(zones.iter().all(|z| z.width == 0));
    }

    #[test]
    fn capture_matches_zone_size() {
        let frame = Frame::filled(90, 20, [1, 2, 3, 255]);
        let zone = Zone::for_player(1, 90, 20, 3).unwrap();
        let shot = zone.capture(&frame);
        assert_eq!((shot.width(), shot.height()), (30, 20));
    }
}
