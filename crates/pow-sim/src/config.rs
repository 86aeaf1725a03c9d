//! Describing the simulated network

/// Numeric type used for probabilities and node-class ratios.
pub type Ratio = f64;

/// Immutable description of a simulated network.
///
/// Nodes are split into two pooled classes. The first
/// [`malicious_node_count`](Self::malicious_node_count) node slots belong to
/// the adversary, the rest are honest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkConfig {
    node_count: usize,
    malicious_ratio: Ratio,
    malicious_node_count: usize,
    success_rate: Ratio,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot create a network with zero nodes")]
    ZeroNodes,
    #[error("malicious ratio {0} is not in the range 0.0..=1.0")]
    BadMaliciousRatio(Ratio),
    #[error("success rate {0} is not in the range 0.0..=1.0")]
    BadSuccessRate(Ratio),
}

#[inline]
fn is_probability(value: Ratio) -> bool {
    !value.is_nan() && (0.0..=1.0).contains(&value)
}

impl NetworkConfig {
    /// Creates a new [`NetworkConfig`]. The number of malicious nodes is
    /// `floor(node_count * malicious_ratio)`.
    pub fn new(
        node_count: usize,
        malicious_ratio: Ratio,
        success_rate: Ratio,
    ) -> Result<Self, ConfigError> {
        use ConfigError::*;

        if node_count == 0 {
            return Err(ZeroNodes);
        }
        if !is_probability(malicious_ratio) {
            return Err(BadMaliciousRatio(malicious_ratio));
        }
        if !is_probability(success_rate) {
            return Err(BadSuccessRate(success_rate));
        }

        let malicious_node_count =
            (node_count as Ratio * malicious_ratio).floor() as usize;
        debug_assert!(malicious_node_count <= node_count);

        Ok(Self {
            node_count,
            malicious_ratio,
            malicious_node_count,
            success_rate,
        })
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Fraction of the network controlled by the adversary.
    #[inline]
    pub fn malicious_ratio(&self) -> Ratio {
        self.malicious_ratio
    }

    #[inline]
    pub fn malicious_node_count(&self) -> usize {
        self.malicious_node_count
    }

    #[inline]
    pub fn honest_node_count(&self) -> usize {
        self.node_count - self.malicious_node_count
    }

    /// Probability that a single node produces a block in a single round.
    #[inline]
    pub fn success_rate(&self) -> Ratio {
        self.success_rate
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, NetworkConfig};

    #[test]
    fn malicious_node_count_is_floored() {
        let config = NetworkConfig::new(100, 0.1, 0.001).unwrap();
        assert_eq!(config.malicious_node_count(), 10);
        assert_eq!(config.honest_node_count(), 90);

        let config = NetworkConfig::new(7, 0.5, 0.001).unwrap();
        assert_eq!(config.malicious_node_count(), 3);

        let config = NetworkConfig::new(3, 1.0, 0.5).unwrap();
        assert_eq!(config.malicious_node_count(), 3);
        assert_eq!(config.honest_node_count(), 0);
    }

    #[test]
    fn invalid_configs_rejected() {
        assert_eq!(
            NetworkConfig::new(0, 0.1, 0.1),
            Err(ConfigError::ZeroNodes)
        );
        assert_eq!(
            NetworkConfig::new(10, 1.5, 0.1),
            Err(ConfigError::BadMaliciousRatio(1.5))
        );
        assert_eq!(
            NetworkConfig::new(10, 0.1, -0.2),
            Err(ConfigError::BadSuccessRate(-0.2))
        );
        assert!(matches!(
            NetworkConfig::new(10, f64::NAN, 0.1),
            Err(ConfigError::BadMaliciousRatio(_))
        ));
    }
}
