//! 整數線性模型：變數、線性約束、目標與提示值
//!
//! 後端只接受線性約束，變數乘積以 [`MipModel::add_binary_product`]（big-M）
//! 與 [`MipModel::add_one_hot`]（取值展開）線性化。

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// 單一變數可展開的取值個數上限
pub const MAX_ONE_HOT_VALUES: i64 = 4096;

/// 整數變數句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// 布林變數句柄（定義域 [0, 1] 的整數變數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoolVar(pub(crate) IntVar);

impl BoolVar {
    pub fn as_int(self) -> IntVar {
        self.0
    }

    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl From<BoolVar> for IntVar {
    fn from(b: BoolVar) -> Self {
        b.0
    }
}

/// 變數資訊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarInfo {
    pub name: String,
    pub lo: i64,
    pub hi: i64,
}

/// 線性表達式 Σ coef·var + offset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(IntVar, i64)>,
    pub offset: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// 係數皆為 1 的加總
    pub fn sum<I, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<IntVar>,
    {
        Self {
            terms: vars.into_iter().map(|v| (v.into(), 1)).collect(),
            offset: 0,
        }
    }

    /// 建構器模式：加入一項
    pub fn term(mut self, var: impl Into<IntVar>, coef: i64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: impl Into<IntVar>, coef: i64) {
        self.terms.push((var.into(), coef));
    }

    /// 建構器模式：設置常數項
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// 以完整賦值計算表達式
    pub fn eval(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.index()])
            .sum::<i64>()
            + self.offset
    }

    pub fn vars(&self) -> impl Iterator<Item = IntVar> + '_ {
        self.terms.iter().map(|(v, _)| *v)
    }
}

/// 比較運算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// 小於等於
    Le,
    /// 大於等於
    Ge,
    /// 等於
    Eq,
}

/// 線性約束 `expr (<=|>=|==) rhs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn le(expr: LinearExpr, rhs: i64) -> Self {
        Self::new(expr, Comparison::Le, rhs)
    }

    pub fn ge(expr: LinearExpr, rhs: i64) -> Self {
        Self::new(expr, Comparison::Ge, rhs)
    }

    pub fn eq(expr: LinearExpr, rhs: i64) -> Self {
        Self::new(expr, Comparison::Eq, rhs)
    }

    fn new(expr: LinearExpr, cmp: Comparison, rhs: i64) -> Self {
        Self { expr, cmp, rhs }
    }

    /// 在完整賦值下是否成立
    pub fn is_satisfied(&self, values: &[i64]) -> bool {
        let lhs = self.expr.eval(values);
        match self.cmp {
            Comparison::Le => lhs <= self.rhs,
            Comparison::Ge => lhs >= self.rhs,
            Comparison::Eq => lhs == self.rhs,
        }
    }
}

/// 整數變數的取值展開：`var == v` ⇔ `literal(v)` 為真
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHot {
    lo: i64,
    literals: Vec<BoolVar>,
}

impl OneHot {
    /// 對應取值 `value` 的布林變數
    pub fn literal(&self, value: i64) -> Option<BoolVar> {
        let offset = usize::try_from(value.checked_sub(self.lo)?).ok()?;
        self.literals.get(offset).copied()
    }

    /// 依取值遞增列出 (值, 布林變數)
    pub fn iter(&self) -> impl Iterator<Item = (i64, BoolVar)> + '_ {
        self.literals
            .iter()
            .enumerate()
            .map(|(k, &b)| (self.lo + k as i64, b))
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// 整數線性模型
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MipModel {
    vars: Vec<VarInfo>,
    constraints: Vec<LinearConstraint>,
    objective: Option<LinearExpr>,
    hints: Vec<(IntVar, i64)>,
}

impl MipModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增整數變數，定義域 [lo, hi]
    pub fn new_int_var(
        &mut self,
        lo: i64,
        hi: i64,
        name: impl Into<String>,
    ) -> Result<IntVar, ModelError> {
        let name = name.into();
        if lo > hi {
            return Err(ModelError::EmptyDomain { name, lo, hi });
        }
        self.vars.push(VarInfo { name, lo, hi });
        Ok(IntVar(self.vars.len() - 1))
    }

    /// 新增布林變數
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.vars.push(VarInfo {
            name: name.into(),
            lo: 0,
            hi: 1,
        });
        BoolVar(IntVar(self.vars.len() - 1))
    }

    /// 新增線性約束
    pub fn add_linear(&mut self, constraint: LinearConstraint) -> Result<(), ModelError> {
        for var in constraint.expr.vars() {
            self.ensure_var(var)?;
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// 恰有一個布林變數為真
    pub fn add_exactly_one<I>(&mut self, literals: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = BoolVar>,
    {
        self.add_linear(LinearConstraint::eq(LinearExpr::sum(literals), 1))
    }

    /// `target == x × b`，`b` 為布林變數
    ///
    /// 以 `x` 的上界 M 線性化：
    /// `target <= M·b`、`target <= x`、`target >= x - M·(1 - b)`、`target >= 0`。
    pub fn add_binary_product(
        &mut self,
        target: IntVar,
        x: IntVar,
        b: BoolVar,
    ) -> Result<(), ModelError> {
        self.ensure_bool(b)?;
        for var in [target, x] {
            let info = self.ensure_var(var)?;
            if info.lo < 0 {
                return Err(ModelError::NegativeProductDomain(info.name.clone()));
            }
        }
        let big_m = self.vars[x.index()].hi;

        self.add_linear(LinearConstraint::le(
            LinearExpr::new().term(target, 1).term(b, -big_m),
            0,
        ))?;
        self.add_linear(LinearConstraint::le(
            LinearExpr::new().term(target, 1).term(x, -1),
            0,
        ))?;
        self.add_linear(LinearConstraint::ge(
            LinearExpr::new().term(target, 1).term(x, -1).term(b, -big_m),
            -big_m,
        ))
    }

    /// 將 `var` 的每個取值展開成布林變數：恰一為真，且 `var == Σ v·literal(v)`
    pub fn add_one_hot(&mut self, var: IntVar) -> Result<OneHot, ModelError> {
        let info = self.ensure_var(var)?.clone();
        let width = info.hi - info.lo + 1;
        if width > MAX_ONE_HOT_VALUES {
            return Err(ModelError::DomainTooWide {
                name: info.name,
                width,
            });
        }

        let literals: Vec<BoolVar> = (info.lo..=info.hi)
            .map(|v| self.new_bool_var(format!("{}_is_{}", info.name, v)))
            .collect();
        self.add_exactly_one(literals.iter().copied())?;

        let mut link = LinearExpr::new().term(var, 1);
        for (v, &b) in (info.lo..=info.hi).zip(&literals) {
            if v != 0 {
                link.add_term(b, -v);
            }
        }
        self.add_linear(LinearConstraint::eq(link, 0))?;

        Ok(OneHot {
            lo: info.lo,
            literals,
        })
    }

    /// 設置最小化目標
    pub fn minimize(&mut self, expr: LinearExpr) -> Result<(), ModelError> {
        for var in expr.vars() {
            self.ensure_var(var)?;
        }
        self.objective = Some(expr);
        Ok(())
    }

    /// 加入提示值（不要求可行，只作為暖啟動）；同一變數以最後一次為準
    pub fn add_hint(&mut self, var: impl Into<IntVar>, value: i64) -> Result<(), ModelError> {
        let var = var.into();
        self.ensure_var(var)?;
        self.hints.push((var, value));
        Ok(())
    }

    /// 以完整賦值為所有變數加入提示值
    pub fn add_complete_hint(&mut self, values: &[i64]) -> Result<(), ModelError> {
        if values.len() != self.vars.len() {
            return Err(ModelError::WrongArity {
                expected: self.vars.len(),
                actual: values.len(),
            });
        }
        self.hints
            .extend(values.iter().enumerate().map(|(i, &v)| (IntVar(i), v)));
        Ok(())
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn var(&self, var: impl Into<IntVar>) -> &VarInfo {
        &self.vars[var.into().index()]
    }

    pub fn vars(&self) -> &[VarInfo] {
        &self.vars
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    pub fn hints(&self) -> &[(IntVar, i64)] {
        &self.hints
    }

    /// 所有變數皆有提示值時回傳完整賦值
    pub fn complete_hint(&self) -> Option<Vec<i64>> {
        let mut values = vec![None; self.vars.len()];
        for &(var, value) in &self.hints {
            values[var.index()] = Some(value);
        }
        values.into_iter().collect()
    }

    /// 目標值（無目標時為 0）
    pub fn objective_value(&self, values: &[i64]) -> i64 {
        self.objective.as_ref().map_or(0, |obj| obj.eval(values))
    }

    /// 檢查完整賦值是否滿足所有定義域與約束
    pub fn check(&self, values: &[i64]) -> Result<(), ModelError> {
        if values.len() != self.vars.len() {
            return Err(ModelError::WrongArity {
                expected: self.vars.len(),
                actual: values.len(),
            });
        }
        for (info, &value) in self.vars.iter().zip(values) {
            if value < info.lo || value > info.hi {
                return Err(ModelError::ValueOutOfDomain {
                    name: info.name.clone(),
                    value,
                });
            }
        }
        match self
            .constraints
            .iter()
            .position(|c| !c.is_satisfied(values))
        {
            Some(index) => Err(ModelError::ConstraintViolated(index)),
            None => Ok(()),
        }
    }

    fn ensure_var(&self, var: IntVar) -> Result<&VarInfo, ModelError> {
        self.vars
            .get(var.index())
            .ok_or(ModelError::UnknownVariable(var.index()))
    }

    fn ensure_bool(&self, lit: BoolVar) -> Result<(), ModelError> {
        let info = self.ensure_var(lit.as_int())?;
        if info.lo < 0 || info.hi > 1 {
            return Err(ModelError::NotBoolean(info.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_new_vars() {
        let mut model = MipModel::new();
        let x = model.new_int_var(0, 5, "x").unwrap();
        let b = model.new_bool_var("b");

        assert_eq!(model.num_vars(), 2);
        assert_eq!(model.var(x).hi, 5);
        assert_eq!(model.var(b).name, "b");
        assert!(matches!(
            model.new_int_var(3, 2, "bad"),
            Err(ModelError::EmptyDomain { .. })
        ));
    }

    #[test]
    fn test_product_requires_non_negative_domains() {
        let mut model = MipModel::new();
        let z = model.new_int_var(0, 10, "z").unwrap();
        let x = model.new_int_var(-1, 3, "x").unwrap();
        let y = model.new_int_var(0, 3, "y").unwrap();
        let b = model.new_bool_var("b");

        assert!(matches!(
            model.add_binary_product(z, x, b),
            Err(ModelError::NegativeProductDomain(_))
        ));
        assert!(matches!(
            model.add_binary_product(z, y, BoolVar(x)),
            Err(ModelError::NotBoolean(_))
        ));
        assert!(model.add_binary_product(z, y, b).is_ok());
    }

    #[rstest]
    #[case(4, 1, 4)]
    #[case(4, 0, 0)]
    #[case(0, 1, 0)]
    #[case(7, 1, 7)]
    fn test_binary_product_truth_table(#[case] x: i64, #[case] b: i64, #[case] z: i64) {
        let mut model = MipModel::new();
        let xv = model.new_int_var(0, 7, "x").unwrap();
        let bv = model.new_bool_var("b");
        let zv = model.new_int_var(0, 7, "z").unwrap();
        model.add_binary_product(zv, xv, bv).unwrap();

        assert!(model.check(&[x, b, z]).is_ok());
        for wrong in (0..=7).filter(|&w| w != z) {
            assert!(model.check(&[x, b, wrong]).is_err(), "z={} 不應可行", wrong);
        }
    }

    #[test]
    fn test_one_hot_links_value() {
        let mut model = MipModel::new();
        let ups = model.new_int_var(1, 4, "ups").unwrap();
        let hot = model.add_one_hot(ups).unwrap();

        assert_eq!(hot.len(), 4);
        assert_eq!(hot.literal(0), None);
        assert_eq!(hot.literal(5), None);
        assert_eq!(model.var(hot.literal(3).unwrap()).name, "ups_is_3");

        // ups = 3，只有 ups_is_3 為真
        assert!(model.check(&[3, 0, 0, 1, 0]).is_ok());
        // 展開值與 ups 不一致
        assert!(model.check(&[2, 0, 0, 1, 0]).is_err());
        // 多於一個為真
        assert!(model.check(&[3, 1, 1, 0, 0]).is_err());
    }

    #[test]
    fn test_one_hot_rejects_wide_domain() {
        let mut model = MipModel::new();
        let sheets = model.new_int_var(1, 10_000, "sheets").unwrap();

        assert!(matches!(
            model.add_one_hot(sheets),
            Err(ModelError::DomainTooWide { width: 10_000, .. })
        ));
    }

    #[test]
    fn test_check_assignment() {
        let mut model = MipModel::new();
        let x = model.new_int_var(0, 5, "x").unwrap();
        let y = model.new_int_var(0, 5, "y").unwrap();
        model
            .add_linear(LinearConstraint::ge(LinearExpr::sum([x, y]), 6))
            .unwrap();

        assert!(model.check(&[2, 4]).is_ok());
        assert!(matches!(
            model.check(&[2, 3]),
            Err(ModelError::ConstraintViolated(0))
        ));
        assert!(matches!(
            model.check(&[6, 0]),
            Err(ModelError::ValueOutOfDomain { .. })
        ));
        assert!(matches!(
            model.check(&[1]),
            Err(ModelError::WrongArity { .. })
        ));
    }

    #[test]
    fn test_objective_value() {
        let mut model = MipModel::new();
        let x = model.new_int_var(0, 5, "x").unwrap();
        let y = model.new_int_var(0, 5, "y").unwrap();
        assert_eq!(model.objective_value(&[1, 2]), 0);

        model
            .minimize(LinearExpr::new().term(x, 2).term(y, 1).with_offset(1))
            .unwrap();
        assert_eq!(model.objective_value(&[1, 2]), 5);
    }

    #[test]
    fn test_complete_hint() {
        let mut model = MipModel::new();
        let x = model.new_int_var(0, 5, "x").unwrap();
        let y = model.new_int_var(0, 5, "y").unwrap();

        model.add_hint(x, 1).unwrap();
        assert_eq!(model.complete_hint(), None);

        model.add_hint(y, 2).unwrap();
        model.add_hint(x, 3).unwrap();
        assert_eq!(model.complete_hint(), Some(vec![3, 2]));

        assert!(matches!(
            model.add_complete_hint(&[1]),
            Err(ModelError::WrongArity { expected: 2, actual: 1 })
        ));
        model.add_complete_hint(&[4, 5]).unwrap();
        assert_eq!(model.complete_hint(), Some(vec![4, 5]));
    }

    #[test]
    fn test_unknown_variable_in_hint() {
        let mut model = MipModel::new();
        let mut other = MipModel::new();
        other.new_int_var(0, 1, "a").unwrap();
        let foreign = other.new_int_var(0, 1, "b").unwrap();

        assert!(matches!(
            model.add_hint(foreign, 1),
            Err(ModelError::UnknownVariable(1))
        ));
    }

    proptest! {
        /// big-M 線性化恰好接受乘積值
        #[test]
        fn prop_binary_product_is_exact(x in 0i64..30, b in 0i64..2, z in 0i64..30) {
            let mut model = MipModel::new();
            let xv = model.new_int_var(0, 29, "x").unwrap();
            let bv = model.new_bool_var("b");
            let zv = model.new_int_var(0, 29, "z").unwrap();
            model.add_binary_product(zv, xv, bv).unwrap();

            prop_assert_eq!(model.check(&[x, b, z]).is_ok(), z == x * b);
        }
    }
}
