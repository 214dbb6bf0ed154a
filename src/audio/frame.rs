use serde::{Deserialize, Serialize};

/// One spectral magnitude snapshot, one byte per frequency bin
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioFrame {
    bins: Vec<u8>,
}

impl AudioFrame {
    pub fn new(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// Frame with every bin set to `magnitude`
    pub fn uniform(bin_count: usize, magnitude: u8) -> Self {
        Self {
            bins: vec![magnitude; bin_count],
        }
    }

    pub fn silent(bin_count: usize) -> Self {
        Self::uniform(bin_count, 0)
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

impl From<Vec<u8>> for AudioFrame {
    fn from(bins: Vec<u8>) -> Self {
        Self::new(bins)
    }
}
