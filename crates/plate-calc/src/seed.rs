//! 貪婪初始解（僅作為求解器的提示值）

use plate_core::{config::DEFAULT_SEED_QTY_DIVISOR, PlateIndex, Tag};

/// 單一吊牌的初始分配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedAssignment {
    /// 吊牌在輸入中的原始位置
    pub tag_index: usize,
    pub plate: PlateIndex,
    pub ups: u32,
}

/// 貪婪初始解生成器
///
/// 依 QTY 由大到小逐一放入第一張還有容量的印版；全部印版都滿時
/// 以輪轉方式指定印版並允許超出容量，因此結果不保證可行。
#[derive(Debug, Clone)]
pub struct SeedGenerator {
    ups_per_plate: u32,
    plate_count: u32,
    qty_divisor: u64,
}

impl SeedGenerator {
    pub fn new(ups_per_plate: u32, plate_count: u32) -> Self {
        Self {
            ups_per_plate,
            plate_count,
            qty_divisor: DEFAULT_SEED_QTY_DIVISOR,
        }
    }

    /// 設置 ups 猜測值的除數（QTY / 除數）
    pub fn with_qty_divisor(mut self, divisor: u64) -> Self {
        self.qty_divisor = divisor.max(1);
        self
    }

    /// 依 QTY 粗估 ups，限制在 [1, 容量]
    pub fn guess_ups(&self, qty: u64) -> u32 {
        let guess = (qty / self.qty_divisor).min(self.ups_per_plate as u64) as u32;
        guess.max(1)
    }

    /// 產生初始解，順序為放置順序（QTY 由大到小，相同 QTY 保持輸入順序）
    pub fn generate(&self, tags: &[Tag]) -> Vec<SeedAssignment> {
        let plate_count = self.plate_count as usize;
        if plate_count == 0 {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..tags.len()).collect();
        order.sort_by(|&a, &b| tags[b].qty.cmp(&tags[a].qty));

        let mut used = vec![0u64; plate_count];
        let mut overflow = 0usize;
        let capacity = self.ups_per_plate as u64;

        order
            .into_iter()
            .map(|tag_index| {
                let ups = self.guess_ups(tags[tag_index].qty);
                let plate = match used.iter().position(|&u| u + ups as u64 <= capacity) {
                    Some(p) => p,
                    None => {
                        let p = overflow % plate_count;
                        overflow += 1;
                        p
                    }
                };
                used[plate] += ups as u64;
                SeedAssignment {
                    tag_index,
                    plate: PlateIndex::new(plate),
                    ups,
                }
            })
            .collect()
    }
}

/// 各印版在初始解中的 ups 用量
pub fn plate_loads(seed: &[SeedAssignment], plate_count: u32) -> Vec<u64> {
    let mut loads = vec![0u64; plate_count as usize];
    for entry in seed {
        if let Some(load) = loads.get_mut(entry.plate.get()) {
            *load += entry.ups as u64;
        }
    }
    loads
}

/// 初始解是否滿足容量限制
pub fn is_within_capacity(seed: &[SeedAssignment], ups_per_plate: u32, plate_count: u32) -> bool {
    plate_loads(seed, plate_count)
        .into_iter()
        .all(|load| load <= ups_per_plate as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn tags(qtys: &[u64]) -> Vec<Tag> {
        qtys.iter()
            .enumerate()
            .map(|(i, &q)| Tag::new(format!("C{}", i), "M", q))
            .collect()
    }

    #[rstest]
    #[case(0, 1)]
    #[case(999, 1)]
    #[case(1000, 1)]
    #[case(2999, 2)]
    #[case(15_000, 15)]
    #[case(80_000, 20)]
    fn test_guess_ups(#[case] qty: u64, #[case] expected: u32) {
        let generator = SeedGenerator::new(20, 3);
        assert_eq!(generator.guess_ups(qty), expected);
    }

    #[test]
    fn test_sorted_by_qty_descending_with_input_index() {
        let input = tags(&[60, 1412, 96, 1412, 72]);
        let seed = SeedGenerator::new(20, 3).generate(&input);

        let order: Vec<usize> = seed.iter().map(|s| s.tag_index).collect();
        // 相同 QTY 保持輸入順序
        assert_eq!(order, vec![1, 3, 2, 4, 0]);
        assert_eq!(seed[0].ups, 1);
    }

    #[test]
    fn test_first_fit_fills_first_plate() {
        let input = tags(&[5000, 4000, 3000]);
        let seed = SeedGenerator::new(10, 2).generate(&input);

        // 5 + 4 <= 10 → A；3 放不下 → B
        let plates: Vec<usize> = seed.iter().map(|s| s.plate.get()).collect();
        assert_eq!(plates, vec![0, 0, 1]);
        assert!(is_within_capacity(&seed, 10, 2));
    }

    #[test]
    fn test_overflow_round_robin() {
        let input = tags(&[2000, 2000, 2000, 2000, 2000]);
        let seed = SeedGenerator::new(2, 2).generate(&input);

        let plates: Vec<usize> = seed.iter().map(|s| s.plate.get()).collect();
        // 兩張印版各放一個後，其餘輪轉放置
        assert_eq!(plates, vec![0, 1, 0, 1, 0]);
        assert_eq!(plate_loads(&seed, 2), vec![6, 4]);
        assert!(!is_within_capacity(&seed, 2, 2));
    }

    #[test]
    fn test_custom_divisor() {
        let generator = SeedGenerator::new(20, 1).with_qty_divisor(10);
        assert_eq!(generator.guess_ups(96), 9);
        assert_eq!(SeedGenerator::new(20, 1).with_qty_divisor(0).guess_ups(7), 7);
    }

    proptest! {
        #[test]
        fn prop_every_tag_seeded_once(
            qtys in prop::collection::vec(0u64..50_000, 1..40),
            ups in 1u32..30,
            plates in 1u32..6,
        ) {
            let input = tags(&qtys);
            let seed = SeedGenerator::new(ups, plates).generate(&input);

            prop_assert_eq!(seed.len(), input.len());
            let mut seen: Vec<usize> = seed.iter().map(|s| s.tag_index).collect();
            seen.sort_unstable();
            prop_assert_eq!(seen, (0..input.len()).collect::<Vec<_>>());

            for entry in &seed {
                prop_assert!(entry.ups >= 1 && entry.ups <= ups);
                prop_assert!(entry.plate.get() < plates as usize);
            }
            prop_assert!(seed.windows(2).all(|w| input[w[0].tag_index].qty >= input[w[1].tag_index].qty));
        }

        #[test]
        fn prop_within_capacity_when_slots_suffice(
            qtys in prop::collection::vec(0u64..999, 1..10),
            plates in 1u32..4,
        ) {
            // 每個吊牌 ups 猜測為 1，總數不超過容量時必定可行
            let ups = qtys.len() as u32;
            let input = tags(&qtys);
            let seed = SeedGenerator::new(ups, plates).generate(&input);
            prop_assert!(is_within_capacity(&seed, ups, plates));
        }
    }
}
