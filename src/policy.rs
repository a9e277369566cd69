use super::util::{HasMax, HasMin, HasZero, Repeat};
use std::marker::PhantomData;

/// 遅延伝搬セグメントツリーに載せる演算の組
///
/// - `merge`は結合的でなければならない. 可換である必要はない.
/// - `apply_over_range(l, r, v)`は区間`[l, r]`の全ての要素を`v`にしたときの集約値を返す.
/// - `identity`は`merge`の単位元である.
///
/// `apply_over_range`は古い集約値を参照しないので, 区間更新は代入として扱われ,
/// 保留中の更新は後から来た方で置き換えられる.
pub trait CombinePolicy {
    /// 要素および集約値の型
    type Value: Clone;

    /// 隣接する2つの区間の集約値を左から順に結合する
    fn merge(&self, lhs: &Self::Value, rhs: &Self::Value) -> Self::Value;

    /// 長さ`right - left + 1`の区間に`value`を一様に適用したときの集約値を返す
    fn apply_over_range(&self, left: usize, right: usize, value: &Self::Value) -> Self::Value;

    /// 単位元を返す
    fn identity(&self) -> Self::Value;
}

/// 区間和
pub struct Sum<T>(PhantomData<fn() -> T>);

/// 区間最小値
pub struct Min<T>(PhantomData<fn() -> T>);

/// 区間最大値
pub struct Max<T>(PhantomData<fn() -> T>);

macro_rules! impl_marker {
    ($($p: ident),*) => {$(
        impl<T> Default for $p<T> {
            fn default() -> Self {
                Self(PhantomData)
            }
        }
        impl<T> Clone for $p<T> {
            fn clone(&self) -> Self {
                *self
            }
        }
        impl<T> Copy for $p<T> {}
        impl<T> std::fmt::Debug for $p<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(stringify!($p))
            }
        }
    )*};
}

impl_marker! { Sum, Min, Max }

impl<T: Clone + std::ops::Add<Output = T> + HasZero + Repeat> CombinePolicy for Sum<T> {
    type Value = T;

    fn merge(&self, lhs: &T, rhs: &T) -> T {
        lhs.clone() + rhs.clone()
    }

    fn apply_over_range(&self, left: usize, right: usize, value: &T) -> T {
        value.repeat(right - left + 1)
    }

    fn identity(&self) -> T {
        T::zero()
    }
}

impl<T: Clone + PartialOrd + HasMax> CombinePolicy for Min<T> {
    type Value = T;

    fn merge(&self, lhs: &T, rhs: &T) -> T {
        if rhs < lhs {
            rhs.clone()
        } else {
            lhs.clone()
        }
    }

    fn apply_over_range(&self, _: usize, _: usize, value: &T) -> T {
        value.clone()
    }

    fn identity(&self) -> T {
        T::max_value()
    }
}

impl<T: Clone + PartialOrd + HasMin> CombinePolicy for Max<T> {
    type Value = T;

    fn merge(&self, lhs: &T, rhs: &T) -> T {
        if rhs > lhs {
            rhs.clone()
        } else {
            lhs.clone()
        }
    }

    fn apply_over_range(&self, _: usize, _: usize, value: &T) -> T {
        value.clone()
    }

    fn identity(&self) -> T {
        T::min_value()
    }
}
