//! 印版模型

use serde::{Deserialize, Serialize};

/// 印版索引（0 起算）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlateIndex(pub usize);

impl PlateIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// 印版標籤：0 → "A"，25 → "Z"，26 → "AA"，依此類推
    pub fn label(self) -> String {
        let mut n = self.0 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }
}

impl std::fmt::Display for PlateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<usize> for PlateIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "A")]
    #[case(1, "B")]
    #[case(2, "C")]
    #[case(25, "Z")]
    #[case(26, "AA")]
    #[case(27, "AB")]
    #[case(51, "AZ")]
    #[case(52, "BA")]
    #[case(701, "ZZ")]
    #[case(702, "AAA")]
    fn test_plate_label(#[case] index: usize, #[case] expected: &str) {
        assert_eq!(PlateIndex::new(index).label(), expected);
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(PlateIndex::from(3).to_string(), "D");
    }
}
