use serde::Deserialize;

/// Tunable routing parameters. A design's own header line
/// (`width,height,bend_penalty,via_penalty`) always wins for the two
/// penalties it carries; this config supplies the search-level knobs the
/// input format has no room for (attempt budget, RNG seed) and serves as
/// the serde-loadable defaults for the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_bend_penalty")]
    pub bend_penalty: u32,
    #[serde(default = "default_via_penalty")]
    pub via_penalty: u32,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bend_penalty: default_bend_penalty(),
            via_penalty: default_via_penalty(),
            max_attempts: default_max_attempts(),
            seed: default_seed(),
            parallel: false,
        }
    }
}

fn default_bend_penalty() -> u32 {
    1
}

fn default_via_penalty() -> u32 {
    1
}

fn default_max_attempts() -> usize {
    20
}

fn default_seed() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_deterministic_by_default() {
        let cfg = RouterConfig::default();
        assert_eq!(cfg.seed, 0);
        assert!(!cfg.parallel);
        assert!(cfg.max_attempts > 0);
    }
}
