use crate::error::ScalarResult;
use crate::graph::{Graph, ValueId};
use crate::ops::{BitwiseOp, CompareOp, ScalarOp, UnaryMathOp};
use crate::scalar::ScalarType;

/// Single-output front-end helpers over [`Graph::apply`].
impl Graph {
    pub fn add(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Add, &[a, b])
    }

    pub fn sub(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Sub, &[a, b])
    }

    pub fn mul(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Mul, &[a, b])
    }

    pub fn mul_many(&mut self, factors: &[ValueId]) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Mul, factors)
    }

    pub fn true_div(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::TrueDiv, &[a, b])
    }

    pub fn int_div(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::IntDiv, &[a, b])
    }

    pub fn modulo(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Mod, &[a, b])
    }

    pub fn pow(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Pow, &[a, b])
    }

    pub fn neg(&mut self, a: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Neg, &[a])
    }

    pub fn reciprocal(&mut self, a: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Reciprocal, &[a])
    }

    pub fn identity(&mut self, a: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Identity, &[a])
    }

    pub fn compare(&mut self, op: CompareOp, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Compare(op), &[a, b])
    }

    pub fn gt(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Gt, a, b)
    }

    pub fn lt(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Lt, a, b)
    }

    pub fn le(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Le, a, b)
    }

    pub fn ge(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Ge, a, b)
    }

    pub fn eq(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Eq, a, b)
    }

    pub fn neq(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.compare(CompareOp::Neq, a, b)
    }

    pub fn and(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Bitwise(BitwiseOp::And), &[a, b])
    }

    pub fn or(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Bitwise(BitwiseOp::Or), &[a, b])
    }

    pub fn xor(&mut self, a: ValueId, b: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Bitwise(BitwiseOp::Xor), &[a, b])
    }

    pub fn invert(&mut self, a: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Bitwise(BitwiseOp::Invert), &[a])
    }

    pub fn unary(&mut self, op: UnaryMathOp, a: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Unary(op), &[a])
    }

    pub fn arctan2(&mut self, y: ValueId, x: ValueId) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::ArcTan2, &[y, x])
    }

    pub fn cast(&mut self, a: ValueId, ty: ScalarType) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Cast(ty), &[a])
    }

    pub fn switch(
        &mut self,
        cond: ValueId,
        if_true: ValueId,
        if_false: ValueId,
    ) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Switch, &[cond, if_true, if_false])
    }

    pub fn mean(&mut self, values: &[ValueId]) -> ScalarResult<ValueId> {
        self.apply1(ScalarOp::Mean, values)
    }

    pub fn in_range(
        &mut self,
        include_lower: bool,
        include_upper: bool,
        x: ValueId,
        low: ValueId,
        high: ValueId,
    ) -> ScalarResult<ValueId> {
        self.apply1(
            ScalarOp::InRange {
                include_lower,
                include_upper,
            },
            &[x, low, high],
        )
    }
}
