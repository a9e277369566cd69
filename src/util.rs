/// 「0」に相当する値が存在することを表すトレイト
pub trait HasZero {
    /// 0の値を返す
    fn zero() -> Self;
}
/// その型に最小値が存在することを表すトレイト
pub trait HasMin {
    /// その型が取り得る最も小さい値を返す
    fn min_value() -> Self;
}
/// その型に最大値が存在することを表すトレイト
pub trait HasMax {
    /// その型が取り得る最も大きい値を返す
    fn max_value() -> Self;
}
/// 同じ値を`n`個足し合わせた値を計算できることを表すトレイト
pub trait Repeat {
    /// `self`を`n`個足し合わせた値を返す
    fn repeat(&self, n: usize) -> Self;
}

/// 整数型にHasZero, HasMin, HasMax, Repeatを実装するマクロ
macro_rules! impl_int {
    ($($t: ty),*) => {$(
        impl HasZero for $t {
            fn zero() -> $t { 0 }
        }
        impl HasMin for $t {
            fn min_value() -> $t { Self::MIN }
        }
        impl HasMax for $t {
            fn max_value() -> $t { Self::MAX }
        }
        impl Repeat for $t {
            // nを$tに変換すると切り詰められるので, 二倍と加算で積を作る
            fn repeat(&self, mut n: usize) -> $t {
                let mut acc: $t = 0;
                let mut base = *self;
                while n > 0 {
                    if n & 1 == 1 {
                        acc = acc + base;
                    }
                    n >>= 1;
                    if n > 0 {
                        base = base + base;
                    }
                }
                acc
            }
        }
    )*};
}

/// 浮動小数点数型にHasZero, HasMin, HasMax, Repeatを実装するマクロ
macro_rules! impl_float {
    ($($t: ty),*) => {$(
        impl HasZero for $t {
            fn zero() -> $t { 0.0 }
        }
        impl HasMin for $t {
            fn min_value() -> $t { Self::NEG_INFINITY }
        }
        impl HasMax for $t {
            fn max_value() -> $t { Self::INFINITY }
        }
        impl Repeat for $t {
            fn repeat(&self, n: usize) -> $t { self * n as $t }
        }
    )*};
}

impl_int! { u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize }
impl_float! { f32, f64 }
