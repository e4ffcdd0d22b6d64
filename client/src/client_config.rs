use std::default::Default;

/// Contains Config properties which will be used by a render node
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Whether frame finish replies carry the statistics sampled on this
    /// node
    pub statistics: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { statistics: true }
    }
}
