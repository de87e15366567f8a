/// Rejected session configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoPlayers,
    SensitivityOutOfRange(u8),
    InvalidSpeed(f32),
    EmptyPhrase,
    NoRounds,
    DetectionWindowInverted { min_ms: u64, max_ms: u64 },
    ZeroSampleStride,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPlayers => write!(f, "player_count must be at least 1"),
            Self::SensitivityOutOfRange(s) => {
                write!(f, "sensitivity must be within 1..=100, got {s}")
            },
            Self::InvalidSpeed(s) => write!(f, "speed must be a finite number > 0, got {s}"),
            Self::EmptyPhrase => write!(f, "narration phrase must not be empty"),
            Self::NoRounds => write!(f, "total_rounds must be at least 1"),
            Self::DetectionWindowInverted { min_ms, max_ms } => write!(
                f,
                "detect_min_ms ({min_ms}) must not exceed detect_max_ms ({max_ms})"
            ),
            Self::ZeroSampleStride => write!(f, "sample_stride must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Rejected frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    BufferSize { expected: usize, actual: usize },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferSize { expected, actual } => write!(
                f,
                "RGBA buffer has {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for FrameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages_name_the_field() {
        assert!(ConfigError::NoPlayers.to_string().contains("player_count"));
        assert!(
            ConfigError::SensitivityOutOfRange(0)
                .to_string()
                .contains("got 0")
        );
        let inverted = ConfigError::DetectionWindowInverted {
            min_ms: 5000,
            max_ms: 2000,
        };
        assert!(inverted.to_string().contains("5000"));
    }

    #[test]
    fn frame_error_reports_sizes() {
        let e = FrameError::BufferSize {
            expected: 16,
            actual: 12,
        };
        assert_eq!(e.to_string(), "RGBA buffer has 12 bytes, expected 16");
    }
}
