//! Cluster glyph sizing.
//!
//! Grouping markers into clusters is the rendering surface's job; it calls
//! [`size_tier`] once per cluster it forms.

use civic_watch_analysis_models::{ClusterConfig, ClusterSize, ClusterTier};

/// Maps a cluster's point count to its tier and pixel dimensions.
#[must_use]
pub const fn size_tier(count: u64, config: &ClusterConfig) -> ClusterSize {
    let (tier, preset) = if count > config.large_above {
        (ClusterTier::Large, config.large)
    } else if count > config.medium_above {
        (ClusterTier::Medium, config.medium)
    } else {
        (ClusterTier::Small, config.small)
    };

    ClusterSize {
        tier,
        width_px: preset.size_px,
        height_px: preset.size_px,
        font_px: preset.font_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        let config = ClusterConfig::default();
        let tier = |n| size_tier(n, &config).tier;

        assert_eq!(tier(0), ClusterTier::Small);
        assert_eq!(tier(10), ClusterTier::Small);
        assert_eq!(tier(11), ClusterTier::Medium);
        assert_eq!(tier(50), ClusterTier::Medium);
        assert_eq!(tier(51), ClusterTier::Large);
    }

    #[test]
    fn pixel_presets() {
        let config = ClusterConfig::default();
        let small = size_tier(3, &config);
        let medium = size_tier(30, &config);
        let large = size_tier(300, &config);

        assert_eq!((small.width_px, small.height_px), (32, 32));
        assert_eq!((medium.width_px, medium.height_px), (40, 40));
        assert_eq!((large.width_px, large.height_px), (50, 50));
        assert!(small.font_px < medium.font_px && medium.font_px < large.font_px);
    }
}
