//! 印版分配整數線性模型建構
//!
//! 分配問題含兩種變數乘積，這裡線性化後交給求解器：
//! - `ups[i] × sheets[j] >= QTY[i]`（吊牌在印版上時）：將 `ups[i]` 展開成取值
//!   布林變數 `y[i][u]`，對每個 (i, j, u) 要求
//!   `sheets[j] >= ceil(QTY[i] / u) · (on[i][j] + y[i][u] - 1)`；
//! - `ups[i] × on[i][j]`（容量計算）：以 big-M 線性化為 `active[i][j]`。
//!
//! 另加入兩組由上述約束推得的有效不等式，只收緊線性鬆弛，不改變可行解。

use plate_core::{
    config::{DEFAULT_MAX_PRODUCT, DEFAULT_MAX_SHEETS},
    PlateIndex, Tag,
};
use plate_solver::{
    BoolVar, IntVar, LinearConstraint, LinearExpr, MipModel, MipSolution, ModelError, OneHot,
};

use crate::seed::SeedAssignment;

/// 建構完成的模型與各決策變數句柄
#[derive(Debug, Clone)]
pub struct PlateModel {
    model: MipModel,
    /// 吊牌 i 所屬印版
    tag_plate: Vec<IntVar>,
    /// 吊牌 i 的 ups
    ups: Vec<IntVar>,
    /// 印版 j 的張數
    sheets: Vec<IntVar>,
    /// `on_plate[i][j]` ⇔ 吊牌 i 在印版 j
    on_plate: Vec<Vec<BoolVar>>,
    /// `ups[i]` 的取值展開
    ups_levels: Vec<OneHot>,
    /// `active_ups[i][j] = ups[i] × on_plate[i][j]`
    active_ups: Vec<Vec<IntVar>>,
}

/// 從解讀出的分配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateAssignment {
    pub plates: Vec<PlateIndex>,
    pub ups: Vec<i64>,
    pub sheets: Vec<i64>,
}

impl PlateAssignment {
    /// 目標值：所有印版張數總和
    pub fn total_sheets(&self) -> i64 {
        self.sheets.iter().sum()
    }

    /// 指定印版上的吊牌索引（依輸入順序）
    pub fn tags_on(&self, plate: PlateIndex) -> impl Iterator<Item = usize> + '_ {
        self.plates
            .iter()
            .enumerate()
            .filter(move |&(_, p)| *p == plate)
            .map(|(i, _)| i)
    }
}

impl PlateModel {
    pub fn mip_model(&self) -> &MipModel {
        &self.model
    }

    pub fn tag_plate_vars(&self) -> &[IntVar] {
        &self.tag_plate
    }

    pub fn ups_vars(&self) -> &[IntVar] {
        &self.ups
    }

    pub fn sheet_vars(&self) -> &[IntVar] {
        &self.sheets
    }

    pub fn indicator(&self, tag: usize, plate: PlateIndex) -> Option<BoolVar> {
        self.on_plate.get(tag)?.get(plate.get()).copied()
    }

    pub fn num_tags(&self) -> usize {
        self.tag_plate.len()
    }

    pub fn num_plates(&self) -> usize {
        self.sheets.len()
    }

    /// 讀出解中的分配
    pub fn decode(&self, solution: &MipSolution) -> PlateAssignment {
        PlateAssignment {
            plates: self
                .tag_plate
                .iter()
                .map(|&v| PlateIndex::new(solution.value(v).max(0) as usize))
                .collect(),
            ups: self.ups.iter().map(|&v| solution.value(v)).collect(),
            sheets: self.sheets.iter().map(|&v| solution.value(v)).collect(),
        }
    }

    /// 由分配推出所有輔助變數的值，得到完整賦值（`decode` 的反向）
    ///
    /// 不檢查可行性；結果可交給 [`MipModel::check`] 驗證。
    pub fn lift(&self, assignment: &PlateAssignment) -> Vec<i64> {
        let mut values: Vec<i64> = self.model.vars().iter().map(|v| v.lo).collect();

        for (i, &var) in self.tag_plate.iter().enumerate() {
            let plate = assignment.plates.get(i).map_or(0, |p| p.get());
            let ups = assignment.ups.get(i).copied().unwrap_or(1);
            values[var.index()] = plate as i64;
            values[self.ups[i].index()] = ups;

            for (j, &on) in self.on_plate[i].iter().enumerate() {
                let here = j == plate;
                values[on.index()] = here as i64;
                values[self.active_ups[i][j].index()] = if here { ups } else { 0 };
            }
            for (u, literal) in self.ups_levels[i].iter() {
                values[literal.index()] = (u == ups) as i64;
            }
        }
        for (j, &var) in self.sheets.iter().enumerate() {
            values[var.index()] = assignment.sheets.get(j).copied().unwrap_or(1);
        }
        values
    }
}

/// 向上取整除法（除數為正）
fn ceil_div(a: i64, b: i64) -> i64 {
    a / b + i64::from(a % b != 0)
}

/// 模型建構器
pub struct PlateModelBuilder<'a> {
    tags: &'a [Tag],
    ups_per_plate: u32,
    plate_count: u32,
    max_sheets: u32,
    max_product: u64,
    seed: Option<&'a [SeedAssignment]>,
}

impl<'a> PlateModelBuilder<'a> {
    pub fn new(tags: &'a [Tag], ups_per_plate: u32, plate_count: u32) -> Self {
        Self {
            tags,
            ups_per_plate,
            plate_count,
            max_sheets: DEFAULT_MAX_SHEETS,
            max_product: DEFAULT_MAX_PRODUCT,
            seed: None,
        }
    }

    pub fn with_max_sheets(mut self, max_sheets: u32) -> Self {
        self.max_sheets = max_sheets;
        self
    }

    pub fn with_max_product(mut self, max_product: u64) -> Self {
        self.max_product = max_product;
        self
    }

    /// 以初始解作為提示值
    pub fn with_seed(mut self, seed: &'a [SeedAssignment]) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 建構模型
    ///
    /// 變數：吊牌所屬印版、吊牌 ups、印版張數；每個 (吊牌, 印版) 一個指示變數，
    /// 同時用於生產量約束與容量約束。目標為最小化總張數。
    pub fn build(&self) -> Result<PlateModel, ModelError> {
        let num_tags = self.tags.len();
        let num_plates = self.plate_count as usize;
        let capacity = self.ups_per_plate as i64;
        let max_sheets = self.max_sheets as i64;
        let max_product = i64::try_from(self.max_product).unwrap_or(i64::MAX);
        let qty: Vec<i64> = self
            .tags
            .iter()
            .map(|t| i64::try_from(t.qty).unwrap_or(i64::MAX))
            .collect();

        let mut model = MipModel::new();

        let tag_plate = (0..num_tags)
            .map(|i| model.new_int_var(0, num_plates as i64 - 1, format!("tag_{}_plate", i)))
            .collect::<Result<Vec<_>, _>>()?;
        let ups = (0..num_tags)
            .map(|i| model.new_int_var(1, capacity, format!("ups_{}", i)))
            .collect::<Result<Vec<_>, _>>()?;
        let sheets = (0..num_plates)
            .map(|j| model.new_int_var(1, max_sheets, format!("plate_sheet_{}", j)))
            .collect::<Result<Vec<_>, _>>()?;

        // 指示變數：恰在一張印版上，且 tag_plate = Σ j·on
        let mut on_plate = Vec::with_capacity(num_tags);
        for i in 0..num_tags {
            let row: Vec<BoolVar> = (0..num_plates)
                .map(|j| model.new_bool_var(format!("on_plate_{}_{}", i, j)))
                .collect();
            model.add_exactly_one(row.iter().copied())?;

            let mut link = LinearExpr::new().term(tag_plate[i], 1);
            for (j, &on) in row.iter().enumerate().skip(1) {
                link.add_term(on, -(j as i64));
            }
            model.add_linear(LinearConstraint::eq(link, 0))?;
            on_plate.push(row);
        }

        let ups_levels = ups
            .iter()
            .map(|&var| model.add_one_hot(var))
            .collect::<Result<Vec<_>, _>>()?;

        // 生產量：在印版 j 上且 ups = u 時 sheets[j] >= ceil(QTY / u)
        for i in 0..num_tags {
            for (u, level) in ups_levels[i].iter() {
                let need = ceil_div(qty[i], u);
                if need <= 1 {
                    continue;
                }
                for j in 0..num_plates {
                    model.add_linear(LinearConstraint::ge(
                        LinearExpr::new()
                            .term(sheets[j], 1)
                            .term(on_plate[i][j], -need)
                            .term(level, -need),
                        -need,
                    ))?;
                }
            }
        }

        // 乘積上限：ups × sheets <= max_product
        for level in &ups_levels {
            for (u, literal) in level.iter() {
                let limit = max_product / u;
                if limit >= max_sheets {
                    continue;
                }
                for &sheet in &sheets {
                    model.add_linear(LinearConstraint::le(
                        LinearExpr::new()
                            .term(sheet, 1)
                            .term(literal, max_sheets - limit),
                        max_sheets,
                    ))?;
                }
            }
        }

        // 容量：每張印版上的 ups 總和不超過容量
        let mut active_ups = Vec::with_capacity(num_tags);
        for i in 0..num_tags {
            let row = (0..num_plates)
                .map(|j| {
                    let term = model.new_int_var(0, capacity, format!("active_ups_{}_{}", i, j))?;
                    model.add_binary_product(term, ups[i], on_plate[i][j])?;
                    Ok(term)
                })
                .collect::<Result<Vec<_>, ModelError>>()?;
            active_ups.push(row);
        }
        for j in 0..num_plates {
            model.add_linear(LinearConstraint::le(
                LinearExpr::sum(active_ups.iter().map(|row| row[j])),
                capacity,
            ))?;
        }

        // 有效不等式：容量 × sheets[j] >= 印版上的 QTY 總和；sheets[j] >= ceil(QTY / 容量)
        for j in 0..num_plates {
            let mut load = LinearExpr::new().term(sheets[j], capacity);
            for i in 0..num_tags {
                load.add_term(on_plate[i][j], -qty[i]);
                let floor = ceil_div(qty[i], capacity);
                if floor > 1 {
                    model.add_linear(LinearConstraint::ge(
                        LinearExpr::new()
                            .term(sheets[j], 1)
                            .term(on_plate[i][j], -floor),
                        0,
                    ))?;
                }
            }
            model.add_linear(LinearConstraint::ge(load, 0))?;
        }

        model.minimize(LinearExpr::sum(sheets.iter().copied()))?;

        let mut built = PlateModel {
            model,
            tag_plate,
            ups,
            sheets,
            on_plate,
            ups_levels,
            active_ups,
        };
        if let Some(seed) = self.seed {
            self.add_seed_hints(&mut built, seed, &qty)?;
        }

        tracing::debug!(
            "模型建構完成：變數 {} 個，約束 {} 條，提示 {} 個",
            built.model.num_vars(),
            built.model.num_constraints(),
            built.model.hints().len()
        );
        Ok(built)
    }

    /// 初始解涵蓋所有吊牌時提示完整賦值（張數取各印版所需的最大值），
    /// 否則只提示吊牌的印版與 ups
    fn add_seed_hints(
        &self,
        built: &mut PlateModel,
        seed: &[SeedAssignment],
        qty: &[i64],
    ) -> Result<(), ModelError> {
        let num_tags = built.num_tags();
        let num_plates = built.num_plates();
        let mut plates = vec![None; num_tags];
        let mut ups = vec![1i64; num_tags];

        for entry in seed {
            if entry.tag_index >= num_tags || entry.plate.get() >= num_plates {
                tracing::warn!("忽略超出範圍的初始解: {:?}", entry);
                continue;
            }
            plates[entry.tag_index] = Some(entry.plate);
            ups[entry.tag_index] = (entry.ups as i64).clamp(1, self.ups_per_plate as i64);
        }

        let Some(plates) = plates.iter().copied().collect::<Option<Vec<PlateIndex>>>() else {
            for (i, plate) in plates.iter().enumerate() {
                if let Some(plate) = plate {
                    built.model.add_hint(built.tag_plate[i], plate.get() as i64)?;
                    built.model.add_hint(built.ups[i], ups[i])?;
                }
            }
            return Ok(());
        };

        let mut sheets = vec![1i64; num_plates];
        for (i, plate) in plates.iter().enumerate() {
            let need = ceil_div(qty[i], ups[i]);
            sheets[plate.get()] = sheets[plate.get()].max(need);
        }
        for s in &mut sheets {
            *s = (*s).min(self.max_sheets as i64);
        }

        let values = built.lift(&PlateAssignment {
            plates,
            ups,
            sheets,
        });
        built.model.add_complete_hint(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::SeedGenerator;
    use proptest::prelude::*;
    use std::time::Duration;

    fn sample_tags() -> Vec<Tag> {
        vec![
            Tag::new("812 GREY VIGO", "XXS", 60),
            Tag::new("800 BLACK", "XXS", 72),
            Tag::new("676 ROSA EMPO", "XXS", 96),
        ]
    }

    fn assignment(plates: &[usize], ups: &[i64], sheets: &[i64]) -> PlateAssignment {
        PlateAssignment {
            plates: plates.iter().map(|&p| PlateIndex::new(p)).collect(),
            ups: ups.to_vec(),
            sheets: sheets.to_vec(),
        }
    }

    #[test]
    fn test_variable_and_constraint_counts() {
        let tags = sample_tags();
        let built = PlateModelBuilder::new(&tags, 20, 2).build().unwrap();
        let model = built.mip_model();

        // 印版、ups、張數；每組 (i, j) 指示與容量項；每個吊牌 20 個 ups 取值
        assert_eq!(model.num_vars(), 3 + 3 + 2 + 3 * 2 * 2 + 3 * 20);
        // 指示 2×3、取值展開 2×3、生產量 3×20×2、容量 3×6 + 2、有效不等式 3×2 + 2
        assert_eq!(model.num_constraints(), 6 + 6 + 120 + 20 + 8);
        assert!(model.objective().is_some());
        assert!(model.hints().is_empty());
    }

    #[test]
    fn test_variable_domains() {
        let tags = sample_tags();
        let built = PlateModelBuilder::new(&tags, 20, 3)
            .with_max_sheets(500)
            .build()
            .unwrap();
        let model = built.mip_model();

        let plate = model.var(built.tag_plate_vars()[0]);
        assert_eq!((plate.lo, plate.hi), (0, 2));
        let ups = model.var(built.ups_vars()[2]);
        assert_eq!((ups.lo, ups.hi), (1, 20));
        let sheets = model.var(built.sheet_vars()[1]);
        assert_eq!((sheets.lo, sheets.hi), (1, 500));
        assert!(built.indicator(1, PlateIndex::new(2)).is_some());
        assert!(built.indicator(3, PlateIndex::new(0)).is_none());
    }

    #[test]
    fn test_lifted_assignment_respects_product_constraints() {
        let tags = sample_tags();
        let built = PlateModelBuilder::new(&tags, 20, 2).build().unwrap();
        let model = built.mip_model();

        // A: 800 BLACK 8×9；B: 812 GREY VIGO 6×12、676 ROSA EMPO 8×12
        let ok = assignment(&[1, 0, 1], &[6, 8, 8], &[9, 12]);
        let values = built.lift(&ok);
        assert!(model.check(&values).is_ok());
        assert_eq!(model.objective_value(&values), 21);
        let solution = MipSolution::new(values, 21, Duration::ZERO);
        assert_eq!(built.decode(&solution), ok);

        // 676 ROSA EMPO 產量不足：8 × 11 < 96
        let short = assignment(&[1, 0, 1], &[6, 8, 8], &[9, 11]);
        assert!(model.check(&built.lift(&short)).is_err());

        // 印版 B 容量超出：12 + 9 > 20
        let crowded = assignment(&[1, 0, 1], &[12, 8, 9], &[9, 11]);
        assert!(model.check(&built.lift(&crowded)).is_err());
    }

    #[test]
    fn test_max_product_is_enforced() {
        let tags = vec![Tag::new("800 BLACK", "M", 50)];
        let built = PlateModelBuilder::new(&tags, 10, 1)
            .with_max_product(60)
            .build()
            .unwrap();
        let model = built.mip_model();

        // 10 × 6 = 60 未超過上限
        assert!(model.check(&built.lift(&assignment(&[0], &[10], &[6]))).is_ok());
        // 10 × 7 = 70 超過上限
        assert!(model.check(&built.lift(&assignment(&[0], &[10], &[7]))).is_err());
        // 5 × 12 = 60 未超過上限
        assert!(model.check(&built.lift(&assignment(&[0], &[5], &[12]))).is_ok());
    }

    #[test]
    fn test_seed_hints_follow_input_tag_index() {
        let tags = vec![
            Tag::new("A", "S", 500),
            Tag::new("B", "S", 9000),
            Tag::new("C", "S", 3000),
        ];
        let seed = SeedGenerator::new(10, 2).generate(&tags);
        let built = PlateModelBuilder::new(&tags, 10, 2)
            .with_seed(&seed)
            .build()
            .unwrap();
        let model = built.mip_model();

        let hints = model.hints();
        // 放置順序為 B、C、A，提示仍對應各自的輸入位置
        assert!(hints.contains(&(built.ups_vars()[1], 9)));
        assert!(hints.contains(&(built.ups_vars()[2], 3)));
        assert!(hints.contains(&(built.ups_vars()[0], 1)));
        assert!(hints.contains(&(built.tag_plate_vars()[1], 0)));
        assert!(hints.contains(&(built.tag_plate_vars()[2], 1)));
        assert!(hints.contains(&(built.tag_plate_vars()[0], 0)));

        // 完整提示：印版 A 需 max(9000/9, 500/1) = 1000 張，印版 B 需 3000/3 = 1000 張
        let values = model.complete_hint().unwrap();
        assert!(model.check(&values).is_ok());
        assert_eq!(model.objective_value(&values), 2000);
    }

    #[test]
    fn test_partial_seed_hints_only_plate_and_ups() {
        let tags = sample_tags();
        let seed = vec![SeedAssignment {
            tag_index: 2,
            plate: PlateIndex::new(1),
            ups: 4,
        }];
        let built = PlateModelBuilder::new(&tags, 20, 2)
            .with_seed(&seed)
            .build()
            .unwrap();
        let model = built.mip_model();

        assert_eq!(
            model.hints(),
            &[(built.tag_plate_vars()[2], 1), (built.ups_vars()[2], 4)]
        );
        assert!(model.complete_hint().is_none());
    }

    #[test]
    fn test_empty_plate_count_is_rejected() {
        let tags = sample_tags();
        let err = PlateModelBuilder::new(&tags, 20, 0).build().unwrap_err();
        assert!(matches!(err, ModelError::EmptyDomain { .. }));
    }

    proptest! {
        /// 線性化後的模型恰好接受滿足原始乘積約束的分配
        #[test]
        fn prop_linearization_matches_product_constraints(
            qty in prop::collection::vec(1u64..60, 1..4),
            plates in prop::collection::vec(0usize..2, 3),
            ups in prop::collection::vec(1i64..=6, 3),
            sheets in prop::collection::vec(1i64..=20, 2),
        ) {
            let tags: Vec<Tag> = qty.iter().map(|&q| Tag::new("C", "S", q)).collect();
            let n = tags.len();
            let built = PlateModelBuilder::new(&tags, 6, 2)
                .with_max_sheets(20)
                .with_max_product(90)
                .build()
                .unwrap();

            let candidate = assignment(&plates[..n], &ups[..n], &sheets);
            let produced_ok = (0..n).all(|i| {
                let product = ups[i] * sheets[plates[i]];
                product >= qty[i] as i64
            });
            let product_ok = (0..n).all(|i| sheets.iter().all(|&s| ups[i] * s <= 90));
            let capacity_ok = (0..2).all(|j| {
                (0..n).filter(|&i| plates[i] == j).map(|i| ups[i]).sum::<i64>() <= 6
            });

            let accepted = built.mip_model().check(&built.lift(&candidate)).is_ok();
            prop_assert_eq!(accepted, produced_ok && product_ok && capacity_ok);
        }
    }
}
