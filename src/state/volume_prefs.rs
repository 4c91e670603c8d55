/// Spotify stops producing output during an ad below this volume.
pub const AD_VOLUME_FLOOR: u8 = 15;
pub const MAX_VOLUME: u8 = 100;

pub const DEFAULT_AD_VOLUME: u8 = 50;
pub const DEFAULT_CONTENT_VOLUME: u8 = 100;

/// The two remembered volume levels.
///
/// The ad floor is enforced when a value is written, not when it is loaded:
/// a persisted value below the floor is kept until the next write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumePreferences {
    ad_volume: u8,
    content_volume: u8,
}

impl Default for VolumePreferences {
    fn default() -> Self {
        Self {
            ad_volume: DEFAULT_AD_VOLUME,
            content_volume: DEFAULT_CONTENT_VOLUME,
        }
    }
}

impl VolumePreferences {
    /// Accept loaded values as-is apart from the 0..=100 range.
    pub fn from_loaded(ad_volume: u8, content_volume: u8) -> Self {
        Self {
            ad_volume: ad_volume.min(MAX_VOLUME),
            content_volume: content_volume.min(MAX_VOLUME),
        }
    }

    pub fn ad_volume(&self) -> u8 {
        self.ad_volume
    }

    pub fn content_volume(&self) -> u8 {
        self.content_volume
    }

    /// Store a new ad volume, clamped to `[AD_VOLUME_FLOOR, 100]`. Returns the
    /// stored value so the caller can write it back to its control.
    pub fn set_ad_volume(&mut self, value: u8) -> u8 {
        self.ad_volume = value.clamp(AD_VOLUME_FLOOR, MAX_VOLUME);
        self.ad_volume
    }

    pub fn set_content_volume(&mut self, value: u8) -> u8 {
        self.content_volume = value.min(MAX_VOLUME);
        self.content_volume
    }
}
