//! Input-track to output-channel routing.

/// Boolean matrix deciding which output channels each input track feeds.
///
/// The matrix is allocated for `max_channels` columns; `num_channels` of
/// them are active. The default connects track `i` to channel `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMap {
    map: Vec<Vec<bool>>,
    num_channels: usize,
    max_channels: usize,
}

impl RouteMap {
    pub fn new(num_tracks: usize, max_channels: usize) -> Self {
        assert!(max_channels > 0);
        let map = (0..num_tracks)
            .map(|i| (0..max_channels).map(|j| i == j).collect())
            .collect();
        Self {
            map,
            num_channels: max_channels,
            max_channels,
        }
    }

    pub fn num_tracks(&self) -> usize {
        self.map.len()
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn max_channels(&self) -> usize {
        self.max_channels
    }

    pub fn get(&self, track: usize, channel: usize) -> bool {
        self.map[track][channel]
    }

    pub fn set(&mut self, track: usize, channel: usize, connect: bool) {
        assert!(channel < self.num_channels);
        self.map[track][channel] = connect;
    }

    /// Change the active channel count.
    ///
    /// Assignments in surviving columns are preserved; columns dropped from
    /// the active range are cleared, so growing again finds them
    /// disconnected. Returns false when `num_channels` exceeds the allocated
    /// width.
    pub fn set_num_channels(&mut self, num_channels: usize) -> bool {
        if num_channels > self.max_channels {
            return false;
        }
        if num_channels < self.num_channels {
            for row in self.map.iter_mut() {
                for cell in row[num_channels..self.num_channels].iter_mut() {
                    *cell = false;
                }
            }
        }
        self.num_channels = num_channels;
        true
    }

    /// The active columns of one track's row.
    pub(crate) fn row(&self, track: usize) -> &[bool] {
        &self.map[track][..self.num_channels]
    }
}

#[cfg(test)]
mod tests {
    use crate::routing::RouteMap;

    #[test]
    fn default_is_the_identity() {
        let map = RouteMap::new(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(map.get(i, j), i == j);
            }
        }
    }

    #[test]
    fn shrinking_clears_dropped_columns() {
        let mut map = RouteMap::new(2, 4);
        map.set(0, 3, true);
        assert!(map.set_num_channels(2));
        assert_eq!(map.num_channels(), 2);
        assert!(map.set_num_channels(4));
        assert!(!map.get(0, 3));
        // surviving columns kept their assignments
        assert!(map.get(0, 0));
        assert!(map.get(1, 1));
    }

    #[test]
    fn rejects_growth_past_the_allocation() {
        let mut map = RouteMap::new(2, 2);
        assert!(!map.set_num_channels(3));
        assert_eq!(map.num_channels(), 2);
    }

    #[test]
    fn deep_copy_is_independent() {
        let map = RouteMap::new(2, 2);
        let mut copy = map.clone();
        copy.set(0, 1, true);
        assert!(!map.get(0, 1));
        assert!(copy.get(0, 1));
    }
}
